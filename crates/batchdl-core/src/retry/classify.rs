//! Map fetch errors onto retry policy error kinds.

use super::error::FetchError;
use super::policy::ErrorKind;

/// Classify an HTTP status code that curl reported as an error.
pub fn classify_http_status(code: u32) -> ErrorKind {
    ErrorKind::HttpStatus(u16::try_from(code).unwrap_or(u16::MAX))
}

/// Classify a fetch error into an ErrorKind.
pub fn classify(e: &FetchError) -> ErrorKind {
    match e {
        FetchError::Transport(_) => ErrorKind::Transport,
        FetchError::Http(code) => classify_http_status(*code),
        FetchError::Filesystem { .. } => ErrorKind::Filesystem,
        FetchError::PartialWrite { .. } => ErrorKind::PartialWrite,
    }
}
