//! Single-stream HTTP GET downloader.
//!
//! Writes the response body sequentially to the destination file. Each
//! attempt uses a fresh curl Easy handle; runs on the calling thread.

use std::path::Path;
use std::time::Instant;

use crate::logging::RESULTS_TARGET;
use crate::retry::{run_with_retry, FetchError, RetryPolicy};

use super::sink::FileSink;
use super::{CurlOptions, Download, DownloadResult};

/// Production [`Download`] implementation backed by libcurl.
#[derive(Debug, Clone, Default)]
pub struct CurlDownloader {
    curl: CurlOptions,
    /// Pause between retries; zero keeps the immediate re-attempt behaviour.
    retry_delay: std::time::Duration,
}

impl CurlDownloader {
    pub fn new(curl: CurlOptions) -> Self {
        Self {
            curl,
            retry_delay: std::time::Duration::ZERO,
        }
    }

    pub fn with_retry_delay(mut self, delay: std::time::Duration) -> Self {
        self.retry_delay = delay;
        self
    }
}

impl Download for CurlDownloader {
    fn download(&self, url: &str, dest: &Path, max_retries: u32) -> DownloadResult {
        let policy = RetryPolicy {
            max_retries,
            delay: self.retry_delay,
        };
        let start = Instant::now();
        let result = match run_with_retry(&policy, |_| fetch_once(url, dest, self.curl)) {
            Ok(bytes) => DownloadResult::succeeded(url, dest, bytes, start.elapsed()),
            Err(e) => {
                tracing::warn!(url, dest = %dest.display(), error = %e, "download failed");
                DownloadResult::failed(url, dest)
            }
        };
        tracing::info!(
            target: RESULTS_TARGET,
            url = %result.url,
            name = %result.name,
            success = result.success,
            bytes = result.bytes_written,
            duration_ms = result.duration.as_millis() as u64,
            "download result"
        );
        result
    }
}

/// One GET attempt. Returns the number of body bytes written to `dest`.
pub(super) fn fetch_once(url: &str, dest: &Path, opts: CurlOptions) -> Result<u64, FetchError> {
    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(FetchError::Transport)?;
    easy.follow_location(true).map_err(FetchError::Transport)?;
    easy.max_redirections(opts.max_redirections)
        .map_err(FetchError::Transport)?;
    if let Some(timeout) = opts.connect_timeout {
        easy.connect_timeout(timeout).map_err(FetchError::Transport)?;
    }
    // Error statuses fail the transfer before any body is handed to us.
    easy.fail_on_error(true).map_err(FetchError::Transport)?;

    let mut sink = FileSink::new(dest);
    let perform_result = {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| {
                if sink.write(data) {
                    Ok(data.len())
                } else {
                    Ok(0) // abort transfer
                }
            })
            .map_err(FetchError::Transport)?;
        transfer.perform()
    };

    if let Err(e) = perform_result {
        if e.is_write_error() {
            if let Some(io_err) = sink.take_error() {
                let path = sink.path().to_path_buf();
                sink.discard();
                return Err(FetchError::filesystem(path, io_err));
            }
        }
        if e.is_http_returned_error() {
            let code = easy.response_code().unwrap_or(0);
            sink.discard();
            return Err(FetchError::Http(code));
        }
        if sink.started() {
            let path = sink.path().to_path_buf();
            let written = sink.written();
            sink.discard();
            return Err(FetchError::PartialWrite {
                path,
                written,
                source: e,
            });
        }
        return Err(FetchError::Transport(e));
    }

    let path = sink.path().to_path_buf();
    sink.finish().map_err(|e| FetchError::filesystem(path, e))
}
