//! Input list loading: one `name, url` pair per line.
//!
//! The first `skip_lines` raw lines are ignored (header). Remaining lines are
//! split at the first comma; malformed lines are dropped. The first
//! `resume_offset` accepted entries are then skipped so a resumed run picks up
//! exactly after the entries an earlier run already resolved.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Component, Path};

use crate::downloader::DownloadEntry;

/// Parse one line into an entry. Returns `None` for lines that are not
/// `name, absolute-url`.
pub fn parse_line(line: &str) -> Option<DownloadEntry> {
    let (name, url) = line.split_once(',')?;
    let name = name.trim_matches(' ');
    let url = url.trim_end_matches(['\r', '\n']).trim_matches(' ');
    if name.is_empty() || url.is_empty() {
        return None;
    }
    // A name like "/" or ".." has no file component left inside the output dir.
    let has_file_part = Path::new(name)
        .components()
        .any(|c| matches!(c, Component::Normal(_)));
    if !has_file_part {
        tracing::warn!(line, "dropping entry without a usable file name");
        return None;
    }
    if let Err(e) = url::Url::parse(url) {
        tracing::warn!(line, "dropping entry with invalid URL: {}", e);
        return None;
    }
    Some(DownloadEntry::new(name, url))
}

/// Read entries from any buffered source.
pub fn read_entries<R: BufRead>(
    reader: R,
    skip_lines: usize,
    resume_offset: u64,
) -> Result<Vec<DownloadEntry>> {
    let mut entries = Vec::new();
    let mut accepted = 0u64;
    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("read line {}", index + 1))?;
        if index < skip_lines {
            continue;
        }
        let Some(entry) = parse_line(&line) else {
            tracing::debug!(line_no = index + 1, "skipping malformed line");
            continue;
        };
        accepted += 1;
        if accepted <= resume_offset {
            continue;
        }
        entries.push(entry);
    }
    Ok(entries)
}

/// Load the input list from `path`.
pub fn load_entries(
    path: &Path,
    skip_lines: usize,
    resume_offset: u64,
) -> Result<Vec<DownloadEntry>> {
    let file =
        File::open(path).with_context(|| format!("open input list: {}", path.display()))?;
    let entries = read_entries(BufReader::new(file), skip_lines, resume_offset)
        .with_context(|| format!("read input list: {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        skip_lines,
        resume_offset,
        count = entries.len(),
        "loaded input list"
    );
    Ok(entries)
}
