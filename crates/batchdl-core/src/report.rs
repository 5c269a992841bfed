//! Terminal rendering of run statistics: periodic in-place rows and the final summary.

use std::io::Write;
use std::time::Duration;

use crate::control::StopFlag;
use crate::scheduler::{RunStatistics, SharedStats};

const MIB: f64 = 1_048_576.0;

/// Non-finite rates (zero elapsed time, zero-duration results) display as 0.
fn finite(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Column header printed once before the first progress row.
pub fn render_header() -> String {
    format!(
        "{:<9} | {:<10} | {:<10} | {:<11} | {:<7} | {:<10} | {:<11} |",
        "Downloads", "Failures", "Total MiB", "Files/Sec", "MiB/Sec", "Remaining", "Avg MiB/Sec"
    )
}

/// One progress row; starts with `\r` so successive rows overwrite each other.
pub fn render_row(s: &RunStatistics) -> String {
    format!(
        "\r{:<9} | {:<10} | {:<10.2} | {:<11.2} | {:<7.2} | {:<10} | {:<11.2} |",
        s.succeeded,
        s.failed,
        s.total_bytes as f64 / MIB,
        finite(s.avg_files_per_sec),
        finite(s.bytes_per_sec) / MIB,
        s.remaining,
        finite(s.avg_bytes_per_sec) / MIB,
    )
}

/// Final row followed by the elapsed time of this process's run.
pub fn render_summary(s: &RunStatistics, elapsed: Duration) -> String {
    format!(
        "{}\n\nTotal time: {:.2}s\n",
        render_row(s),
        elapsed.as_secs_f64()
    )
}

/// Print a row every `period` until `stop` is observed. The first tick fires
/// immediately. Returns the writer so callers can inspect or reuse it.
pub async fn run_reporter<W: Write + Send>(
    stats: SharedStats,
    stop: StopFlag,
    period: Duration,
    mut out: W,
) -> W {
    let mut ticker = tokio::time::interval(period.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    if writeln!(out, "{}", render_header()).is_err() {
        return out;
    }
    loop {
        ticker.tick().await;
        if stop.is_requested() {
            break;
        }
        let row = render_row(&stats.snapshot());
        if write!(out, "{}", row).and_then(|_| out.flush()).is_err() {
            tracing::debug!("progress output closed, reporter exiting");
            break;
        }
    }
    out
}
