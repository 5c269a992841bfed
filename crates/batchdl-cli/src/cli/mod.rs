//! CLI for batchdl.

mod prompt;
mod run;

use anyhow::{Context, Result};
use batchdl_core::checkpoint::Checkpoint;
use batchdl_core::config::{self, BatchConfig, RunConfig};
use batchdl_core::scheduler::RunStatistics;
use clap::Parser;
use std::path::PathBuf;

use run::run_download;

/// Download every `name,url` entry of a list file in parallel.
#[derive(Debug, Parser)]
#[command(name = "batchdl", version)]
#[command(about = "batchdl: parallel list downloader with checkpoint/resume", long_about = None)]
pub struct Cli {
    /// List file with one `name,url` entry per line.
    #[arg(short, long, value_name = "FILE", required_unless_present = "load")]
    pub input: Option<PathBuf>,

    /// Number of parallel downloads.
    #[arg(short, long, value_name = "N")]
    pub parallel: Option<usize>,

    /// Header lines to skip at the top of the list.
    #[arg(short, long, value_name = "N")]
    pub skip: Option<usize>,

    /// Directory the entries are saved under.
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Retries per entry after a transport failure.
    #[arg(short, long, value_name = "N")]
    pub retries: Option<u32>,

    /// Pause after each download, per worker, in seconds (fractions allowed).
    #[arg(short, long, value_name = "SECS")]
    pub delay: Option<f64>,

    /// Continue an interrupted run from a saved checkpoint.
    #[arg(
        short,
        long,
        value_name = "CHECKPOINT",
        conflicts_with_all = ["input", "parallel", "skip", "output", "retries", "delay"]
    )]
    pub load: Option<PathBuf>,
}

impl Cli {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        let (run_cfg, stats) = cli.prepare(&cfg)?;
        run_cfg.validate()?;
        run_download(run_cfg, stats, &cfg).await
    }

    /// Run parameters and starting statistics: from the checkpoint when
    /// `--load` is given, otherwise config-file defaults overridden by flags.
    fn prepare(&self, cfg: &BatchConfig) -> Result<(RunConfig, RunStatistics)> {
        if let Some(path) = &self.load {
            let resume = Checkpoint::load(path)?.into_resume();
            if !resume.workdir_restored {
                eprintln!(
                    "warning: could not enter the saved working directory, using the current one"
                );
            }
            println!(
                "Resuming {} after {} resolved entries",
                resume.config.input_path.display(),
                resume.config.resume_offset
            );
            return Ok((resume.config, resume.stats));
        }
        let input = self
            .input
            .clone()
            .context("either --input or --load is required")?;
        Ok((self.run_config(cfg, input), RunStatistics::new()))
    }

    fn run_config(&self, cfg: &BatchConfig, input: PathBuf) -> RunConfig {
        let mut rc = RunConfig::from_defaults(cfg, input);
        if let Some(n) = self.parallel {
            rc.concurrency = n;
        }
        if let Some(n) = self.skip {
            rc.skip_lines = n;
        }
        if let Some(dir) = &self.output {
            rc.output_dir = dir.clone();
        }
        if let Some(n) = self.retries {
            rc.max_retries = n;
        }
        if let Some(d) = self.delay {
            rc.delay_secs = d;
        }
        rc
    }
}
