//! Run lifecycle: `Running → Draining → Stopped` on interrupt,
//! `Running → Completed` when every dispatched entry has a result.
//!
//! The controller owns the stop flag and the shared statistics. `execute` is
//! blocking (it runs the worker pool on OS threads); `interrupt` may be called
//! from any thread while it runs.

use anyhow::{bail, Context, Result};
use std::sync::{Arc, Mutex, PoisonError};

use crate::checkpoint::Checkpoint;
use crate::config::RunConfig;
use crate::control::StopFlag;
use crate::downloader::{Download, DownloadEntry};
use crate::scheduler::{dispatch, PoolSettings, RunStatistics, SharedStats, WorkerPool};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Draining,
    Stopped,
    Completed,
}

impl RunState {
    pub fn as_str(self) -> &'static str {
        match self {
            RunState::Running => "running",
            RunState::Draining => "draining",
            RunState::Stopped => "stopped",
            RunState::Completed => "completed",
        }
    }
}

/// What `execute` observed once the pool drained.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// `Completed`, or `Draining` if the run was interrupted before every
    /// entry resolved.
    pub state: RunState,
    pub dispatched: u64,
    /// Results received in this run.
    pub resolved: u64,
    pub stats: RunStatistics,
}

pub struct Controller {
    config: RunConfig,
    stats: SharedStats,
    stop: StopFlag,
    state: Mutex<RunState>,
}

impl Controller {
    /// Controller for a fresh run, or a resumed one when `stats` came from a checkpoint.
    pub fn new(config: RunConfig, stats: RunStatistics) -> Self {
        Self {
            config,
            stats: SharedStats::new(stats),
            stop: StopFlag::new(),
            state: Mutex::new(RunState::Running),
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn stats(&self) -> &SharedStats {
        &self.stats
    }

    /// Flag observed by workers and the progress reporter.
    pub fn stop_flag(&self) -> &StopFlag {
        &self.stop
    }

    pub fn state(&self) -> RunState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move `from → to` if currently in `from`. Returns whether it moved.
    fn transition(&self, from: RunState, to: RunState) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != from {
            return false;
        }
        tracing::debug!(from = from.as_str(), to = to.as_str(), "run state change");
        *state = to;
        true
    }

    /// External interrupt: stop handing out jobs and let in-flight downloads
    /// finish. Returns false if the run was no longer `Running`.
    pub fn interrupt(&self) -> bool {
        if !self.transition(RunState::Running, RunState::Draining) {
            return false;
        }
        self.stop.request();
        tracing::info!("interrupt received, draining in-flight downloads");
        true
    }

    /// Download every entry into the output directory (created if missing)
    /// and wait for the pool to drain. Sets the stop flag before returning so
    /// the reporter exits.
    pub fn execute(
        &self,
        entries: Vec<DownloadEntry>,
        downloader: Arc<dyn Download>,
    ) -> Result<RunSummary> {
        let out = &self.config.output_dir;
        if let Err(e) = std::fs::create_dir_all(out)
            .with_context(|| format!("create output dir: {}", out.display()))
        {
            self.stop.request();
            return Err(e);
        }
        let dispatched = entries.len();
        self.stats.begin_run(dispatched as u64);
        tracing::info!(
            entries = dispatched,
            concurrency = self.config.concurrency,
            resume_offset = self.config.resume_offset,
            "run started"
        );

        let settings = PoolSettings {
            workers: self.config.concurrency,
            output_dir: self.config.output_dir.clone(),
            max_retries: self.config.max_retries,
            delay: self.config.inter_request_delay(),
        };
        let pool = WorkerPool::spawn(
            settings,
            dispatch(entries),
            dispatched,
            downloader,
            self.stats.clone(),
            self.stop.clone(),
        );
        // Results were already folded into the stats by the workers; this
        // loop is the drain barrier.
        let resolved = pool.results().iter().count();
        let panicked = pool.join();
        if panicked > 0 {
            tracing::error!(panicked, "worker threads panicked");
        }

        let state = if resolved == dispatched {
            self.transition(RunState::Running, RunState::Completed);
            self.transition(RunState::Draining, RunState::Completed);
            RunState::Completed
        } else if self.stop.is_requested() {
            self.transition(RunState::Running, RunState::Draining);
            RunState::Draining
        } else {
            self.stop.request();
            bail!(
                "worker pool exited with {} of {} results",
                resolved,
                dispatched
            );
        };
        self.stop.request();

        let stats = self.stats.snapshot();
        tracing::info!(
            state = state.as_str(),
            succeeded = stats.succeeded,
            failed = stats.failed,
            total_bytes = stats.total_bytes,
            "run finished"
        );
        Ok(RunSummary {
            state,
            dispatched: dispatched as u64,
            resolved: resolved as u64,
            stats,
        })
    }

    /// Checkpoint of the drained run. Only meaningful after `execute` returned
    /// in `Draining`.
    pub fn checkpoint(&self) -> Result<Checkpoint> {
        Checkpoint::capture(&self.config, self.stats.snapshot())
    }

    /// `Draining → Stopped`, after the checkpoint decision.
    pub fn finish(&self) {
        self.transition(RunState::Draining, RunState::Stopped);
    }
}
