//! Download operation: one retrying HTTP GET streamed to a file.
//!
//! [`Download`] is the seam between the worker pool and the network. The
//! production implementation is [`CurlDownloader`]; every call returns exactly
//! one [`DownloadResult`] and never panics or propagates per-entry errors.

mod single;
mod sink;

pub use single::CurlDownloader;

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use crate::config::TransferConfig;

/// One line of the input list: where to save and what to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadEntry {
    /// Path-like output name, relative to the output directory.
    pub name: String,
    pub url: String,
}

impl DownloadEntry {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Destination of this entry inside `output_dir`. Root, prefix and `..`
    /// components of the name are dropped so the result never leaves `output_dir`.
    pub fn destination(&self, output_dir: &Path) -> PathBuf {
        let mut dest = output_dir.to_path_buf();
        for comp in Path::new(&self.name).components() {
            if let Component::Normal(part) = comp {
                dest.push(part);
            }
        }
        dest
    }
}

/// Terminal outcome of one download entry.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadResult {
    pub url: String,
    /// Destination path the entry was (or would have been) written to.
    pub name: String,
    pub success: bool,
    /// Bytes of the fetched payload; 0 for failures.
    pub bytes_written: u64,
    /// Wall-clock span from first attempt to last byte; zero for failures.
    pub duration: Duration,
}

impl DownloadResult {
    pub fn succeeded(url: &str, dest: &Path, bytes_written: u64, duration: Duration) -> Self {
        Self {
            url: url.to_string(),
            name: dest.to_string_lossy().into_owned(),
            success: true,
            bytes_written,
            duration,
        }
    }

    pub fn failed(url: &str, dest: &Path) -> Self {
        Self {
            url: url.to_string(),
            name: dest.to_string_lossy().into_owned(),
            success: false,
            bytes_written: 0,
            duration: Duration::ZERO,
        }
    }
}

/// Fetches one URL to one destination file with a retry budget.
pub trait Download: Send + Sync {
    /// Must return exactly one result; failures are reported, never raised.
    fn download(&self, url: &str, dest: &Path, max_retries: u32) -> DownloadResult;
}

/// libcurl handle settings applied to every request.
#[derive(Debug, Clone, Copy)]
pub struct CurlOptions {
    pub connect_timeout: Option<Duration>,
    pub max_redirections: u32,
}

impl Default for CurlOptions {
    fn default() -> Self {
        CurlOptions::from(&TransferConfig::default())
    }
}

impl From<&TransferConfig> for CurlOptions {
    fn from(cfg: &TransferConfig) -> Self {
        Self {
            connect_timeout: cfg.connect_timeout_secs.map(Duration::from_secs),
            max_redirections: cfg.max_redirections,
        }
    }
}
