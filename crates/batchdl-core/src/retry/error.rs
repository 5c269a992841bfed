//! Fetch error type for retry classification.

use std::fmt;
use std::path::PathBuf;

/// Error returned by a single fetch attempt.
/// Classified into an [`ErrorKind`](super::ErrorKind) before deciding on a retry;
/// never escapes the download operation.
#[derive(Debug)]
pub enum FetchError {
    /// Curl failed before any response body arrived (DNS, connect, reset, empty reply).
    Transport(curl::Error),
    /// Server answered with an error status (>= 400).
    Http(u32),
    /// Creating directories or the destination file, or writing to it, failed.
    Filesystem { path: PathBuf, source: std::io::Error },
    /// The body started streaming to disk and the transfer then broke off.
    PartialWrite {
        path: PathBuf,
        written: u64,
        source: curl::Error,
    },
}

impl FetchError {
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FetchError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport(e) => write!(f, "transport: {}", e),
            FetchError::Http(code) => write!(f, "HTTP {}", code),
            FetchError::Filesystem { path, source } => {
                write!(f, "filesystem error at {}: {}", path.display(), source)
            }
            FetchError::PartialWrite {
                path,
                written,
                source,
            } => write!(
                f,
                "transfer broke off after {} bytes written to {}: {}",
                written,
                path.display(),
                source
            ),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Transport(e) => Some(e),
            FetchError::Filesystem { source, .. } => Some(source),
            FetchError::PartialWrite { source, .. } => Some(source),
            FetchError::Http(_) => None,
        }
    }
}
