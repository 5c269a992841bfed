#![allow(dead_code)]

pub mod http_server;

use batchdl_core::config::RunConfig;
use std::path::Path;

/// Write a list file with a header line followed by `name,url` rows.
pub fn write_list(path: &Path, rows: &[(String, String)]) {
    let mut text = String::from("name,url\n");
    for (name, url) in rows {
        text.push_str(&format!("{}, {}\n", name, url));
    }
    std::fs::write(path, text).expect("write list");
}

pub fn run_config(input: &Path, output: &Path, concurrency: usize, max_retries: u32) -> RunConfig {
    RunConfig {
        concurrency,
        input_path: input.to_path_buf(),
        skip_lines: 1,
        output_dir: output.to_path_buf(),
        max_retries,
        delay_secs: 0.0,
        resume_offset: 0,
    }
}
