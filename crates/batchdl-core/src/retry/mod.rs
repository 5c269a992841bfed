//! Retry policy for single-file fetches.
//!
//! Transport failures (no response, connection refused, reset before the
//! body starts) are retried immediately up to `max_retries` times. HTTP
//! error statuses, filesystem errors and failures after the body started
//! streaming are terminal for the entry.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_http_status};
pub use error::FetchError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
