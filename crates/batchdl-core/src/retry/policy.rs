use std::time::Duration;

/// Classification of a failed fetch attempt for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No usable response (connect/DNS/reset/empty reply). Retryable.
    Transport,
    /// Server returned an error status.
    HttpStatus(u16),
    /// Local disk problem; retrying would hit the same wall.
    Filesystem,
    /// Body was partly written; the entry is reported failed as-is.
    PartialWrite,
}

impl ErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Transport)
    }
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay (zero = immediately).
    RetryAfter(Duration),
}

/// Bounded retry budget with an optional fixed pause between attempts.
///
/// A fetch makes at most `max_retries + 1` attempts. The default pause is
/// zero: failed attempts are re-issued immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Pause before each retry.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            delay: Duration::ZERO,
        }
    }

    /// Total attempts the policy allows (first attempt included).
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Decide what to do after `attempt` (1-based) failed with `kind`.
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        if attempt >= self.max_attempts() || !kind.is_retryable() {
            return RetryDecision::NoRetry;
        }
        RetryDecision::RetryAfter(self.delay)
    }
}
