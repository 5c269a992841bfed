//! Checkpoint persistence: run parameters plus statistics, saved on interrupt
//! and loaded to continue a run from the first unresolved entry.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::RunConfig;
use crate::scheduler::RunStatistics;

const FILE_SUFFIX: &str = "_progress.save";

/// Snapshot of an interrupted run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    /// Directory the run was started from; relative paths in `config` resolve against it.
    pub working_directory: PathBuf,
    pub config: RunConfig,
    pub stats: RunStatistics,
}

/// A loaded checkpoint, ready to continue.
#[derive(Debug)]
pub struct Resume {
    pub config: RunConfig,
    pub stats: RunStatistics,
    /// False if the saved working directory could not be entered; the run
    /// continues from the current directory.
    pub workdir_restored: bool,
}

/// `~/.local/state/batchdl`, where checkpoints are written by default.
pub fn default_dir() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("batchdl")?;
    Ok(xdg_dirs.get_state_home())
}

/// `<unix-millis>_progress.save`, with an optional collision suffix.
fn file_name(at: SystemTime, attempt: u32) -> String {
    let millis = at
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    if attempt == 0 {
        format!("{}{}", millis, FILE_SUFFIX)
    } else {
        format!("{}-{}{}", millis, attempt, FILE_SUFFIX)
    }
}

impl Checkpoint {
    /// Checkpoint of the current run. The resume offset is the number of
    /// resolved entries, valid only once the worker pool has drained.
    pub fn capture(config: &RunConfig, stats: RunStatistics) -> Result<Self> {
        let working_directory =
            std::env::current_dir().context("determine current working directory")?;
        let mut config = config.clone();
        config.resume_offset = stats.resolved();
        Ok(Self {
            working_directory,
            config,
            stats,
        })
    }

    /// Write to a fresh file in `dir` (created if needed). Written to a temp
    /// file first and renamed into place, so a crash never leaves a truncated
    /// checkpoint. Returns the path of the new file.
    pub fn save_in(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create checkpoint dir: {}", dir.display()))?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("create temp file in {}", dir.display()))?;
        serde_json::to_writer_pretty(&mut tmp, self).context("serialize checkpoint")?;
        tmp.flush().context("flush checkpoint")?;
        tmp.as_file().sync_all().context("sync checkpoint")?;

        let now = SystemTime::now();
        let mut attempt = 0;
        loop {
            let path = dir.join(file_name(now, attempt));
            match tmp.persist_noclobber(&path) {
                Ok(_) => {
                    tracing::info!(
                        path = %path.display(),
                        resume_offset = self.config.resume_offset,
                        "checkpoint saved"
                    );
                    return Ok(path);
                }
                Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists && attempt < 100 => {
                    tmp = e.file;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(e.error)
                        .with_context(|| format!("write checkpoint: {}", path.display()))
                }
            }
        }
    }

    /// Save under [`default_dir`].
    pub fn save(&self) -> Result<PathBuf> {
        self.save_in(&default_dir()?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read checkpoint: {}", path.display()))?;
        let cp: Checkpoint = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse checkpoint: {}", path.display()))?;
        Ok(cp)
    }

    /// Prepare for continuing: clear per-process rates and start time, and
    /// re-enter the saved working directory (best effort).
    pub fn into_resume(self) -> Resume {
        let mut stats = self.stats;
        stats.reset_for_resume();
        let workdir_restored = match std::env::set_current_dir(&self.working_directory) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    dir = %self.working_directory.display(),
                    "could not enter saved working directory, continuing from current one: {}",
                    e
                );
                false
            }
        };
        Resume {
            config: self.config,
            stats,
            workdir_restored,
        }
    }
}
