//! Default command: run the list to completion or until interrupted.

use anyhow::{Context, Result};
use batchdl_core::config::{BatchConfig, RunConfig};
use batchdl_core::downloader::{CurlDownloader, CurlOptions, Download};
use batchdl_core::entries::load_entries;
use batchdl_core::lifecycle::{Controller, RunState};
use batchdl_core::report;
use batchdl_core::scheduler::RunStatistics;
use std::sync::Arc;

use super::prompt::ask_yes_no;

/// Exit status after a second Ctrl-C (128 + SIGINT).
const EXIT_INTERRUPTED: i32 = 130;

pub async fn run_download(
    config: RunConfig,
    stats: RunStatistics,
    cfg: &BatchConfig,
) -> Result<()> {
    let entries = load_entries(&config.input_path, config.skip_lines, config.resume_offset)?;
    if entries.is_empty() {
        println!("Nothing to download in {}.", config.input_path.display());
    }

    let controller = Arc::new(Controller::new(config, stats));
    let downloader: Arc<dyn Download> =
        Arc::new(CurlDownloader::new(CurlOptions::from(&cfg.transfer)));

    let reporter = tokio::spawn(report::run_reporter(
        controller.stats().clone(),
        controller.stop_flag().clone(),
        cfg.progress_interval(),
        std::io::stdout(),
    ));

    let ctl = Arc::clone(&controller);
    let mut work = tokio::task::spawn_blocking(move || ctl.execute(entries, downloader));

    let joined = tokio::select! {
        res = &mut work => res,
        _ = tokio::signal::ctrl_c() => {
            controller.interrupt();
            eprintln!(
                "\nInterrupted: finishing in-flight downloads (Ctrl-C again to quit immediately)"
            );
            tokio::select! {
                res = &mut work => res,
                _ = tokio::signal::ctrl_c() => {
                    tracing::warn!("second interrupt, exiting without checkpoint");
                    std::process::exit(EXIT_INTERRUPTED);
                }
            }
        }
    };
    let summary = joined.context("download task panicked")??;
    reporter_finished(reporter.await);

    println!(
        "{}",
        report::render_summary(&summary.stats, summary.stats.elapsed())
    );

    if summary.state != RunState::Draining {
        return Ok(());
    }

    let save = tokio::task::spawn_blocking(|| {
        ask_yes_no(
            "Do you want to save progress?",
            true,
            &mut std::io::stdin().lock(),
            &mut std::io::stdout(),
        )
    })
    .await
    .context("prompt task panicked")?;

    if save {
        let path = controller.checkpoint()?.save()?;
        println!("Progress saved to {}", path.display());
        println!("Resume with: batchdl --load {}", path.display());
    }
    controller.finish();
    Ok(())
}

/// Progress output is cosmetic: a crashed reporter is logged, never fatal.
fn reporter_finished<T>(joined: Result<T, tokio::task::JoinError>) -> bool {
    match joined {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!("progress reporter task failed: {}", e);
            false
        }
    }
}
