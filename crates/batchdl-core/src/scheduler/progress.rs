//! Running statistics for a download run.
//!
//! One shared [`RunStatistics`] instance guarded by a read/write lock: workers
//! take the write side once per finished entry, the progress reporter and the
//! checkpoint writer take read snapshots.

use serde::{Deserialize, Deserializer, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, SystemTime};

use crate::downloader::DownloadResult;

/// Aggregate counters and rates. Counts and byte totals are cumulative across
/// resumed runs; rates and `start_time` only describe the current process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatistics {
    pub total_entries: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub total_bytes: u64,
    pub remaining: u64,
    /// Bytes/sec of the most recently finished download. May be non-finite.
    #[serde(default, deserialize_with = "rate_or_zero")]
    pub bytes_per_sec: f64,
    #[serde(default, deserialize_with = "rate_or_zero")]
    pub avg_files_per_sec: f64,
    #[serde(default, deserialize_with = "rate_or_zero")]
    pub avg_bytes_per_sec: f64,
    #[serde(default = "SystemTime::now")]
    pub start_time: SystemTime,
}

/// Non-finite rates are written as JSON `null`; read them back as zero.
fn rate_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(d)?.unwrap_or(0.0))
}

impl Default for RunStatistics {
    fn default() -> Self {
        Self {
            total_entries: 0,
            succeeded: 0,
            failed: 0,
            total_bytes: 0,
            remaining: 0,
            bytes_per_sec: 0.0,
            avg_files_per_sec: 0.0,
            avg_bytes_per_sec: 0.0,
            start_time: SystemTime::now(),
        }
    }
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries that reached a terminal result (success or failure).
    pub fn resolved(&self) -> u64 {
        self.succeeded + self.failed
    }

    /// Time since `start_time`; zero if the clock went backwards.
    pub fn elapsed(&self) -> Duration {
        SystemTime::now()
            .duration_since(self.start_time)
            .unwrap_or_default()
    }

    /// Register the entries dispatched by this run on top of what earlier
    /// runs already resolved.
    pub fn begin_run(&mut self, dispatched: u64) {
        self.total_entries = self.resolved() + dispatched;
        self.remaining = dispatched;
    }

    /// Fold one result into the counters, with `elapsed` since `start_time`.
    pub fn apply(&mut self, result: &DownloadResult, elapsed: Duration) {
        if result.success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.total_bytes += result.bytes_written;
        self.bytes_per_sec = result.bytes_written as f64 / result.duration.as_secs_f64();
        let secs = elapsed.as_secs_f64();
        self.avg_files_per_sec = self.succeeded as f64 / secs;
        self.avg_bytes_per_sec = self.total_bytes as f64 / secs;
        self.remaining = self.total_entries.saturating_sub(self.resolved());
    }

    /// Drop values that are meaningless in a new process: rates and start time.
    pub fn reset_for_resume(&mut self) {
        self.bytes_per_sec = 0.0;
        self.avg_files_per_sec = 0.0;
        self.avg_bytes_per_sec = 0.0;
        self.start_time = SystemTime::now();
    }
}

/// Cloneable handle to the run's single statistics instance.
#[derive(Debug, Clone, Default)]
pub struct SharedStats {
    inner: Arc<RwLock<RunStatistics>>,
}

impl SharedStats {
    pub fn new(stats: RunStatistics) -> Self {
        Self {
            inner: Arc::new(RwLock::new(stats)),
        }
    }

    /// The aggregator's update operation: one exclusive critical section per result.
    pub fn update(&self, result: &DownloadResult) {
        let mut stats = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let elapsed = stats.elapsed();
        stats.apply(result, elapsed);
    }

    pub fn begin_run(&self, dispatched: u64) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .begin_run(dispatched);
    }

    /// Copy of the current values under a shared lock.
    pub fn snapshot(&self) -> RunStatistics {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
