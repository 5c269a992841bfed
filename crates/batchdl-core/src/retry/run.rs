//! Retry loop: run a closure until success or policy says stop.

use super::classify;
use super::error::FetchError;
use super::policy::{RetryDecision, RetryPolicy};

/// Runs `f` until it succeeds or the retry policy says to stop.
/// `f` receives the 1-based attempt number. On a retryable failure, waits
/// for the policy delay (if any) and tries again; otherwise returns the error.
pub fn run_with_retry<T, F>(policy: &RetryPolicy, mut f: F) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Result<T, FetchError>,
{
    let mut attempt = 1u32;
    loop {
        match f(attempt) {
            Ok(v) => return Ok(v),
            Err(e) => {
                let kind = classify::classify(&e);
                match policy.decide(attempt, kind) {
                    RetryDecision::NoRetry => return Err(e),
                    RetryDecision::RetryAfter(d) => {
                        tracing::debug!(attempt, error = %e, "retrying fetch");
                        if !d.is_zero() {
                            std::thread::sleep(d);
                        }
                        attempt += 1;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_failing_transport_uses_full_budget() {
        let policy = RetryPolicy::new(3);
        let mut calls = 0;
        let res: Result<(), _> = run_with_retry(&policy, |attempt| {
            calls += 1;
            assert_eq!(attempt, calls);
            Err(FetchError::Transport(curl::Error::new(7)))
        });
        assert!(matches!(res, Err(FetchError::Transport(_))));
        assert_eq!(calls, 4);
    }

    #[test]
    fn succeeds_after_transient_failures() {
        let policy = RetryPolicy::new(3);
        let mut calls = 0;
        let res = run_with_retry(&policy, |_| {
            calls += 1;
            if calls < 3 {
                Err(FetchError::Transport(curl::Error::new(52)))
            } else {
                Ok(42u64)
            }
        });
        assert_eq!(res.unwrap(), 42);
        assert_eq!(calls, 3);
    }

    #[test]
    fn terminal_error_stops_immediately() {
        let policy = RetryPolicy::new(5);
        let mut calls = 0;
        let res: Result<(), _> = run_with_retry(&policy, |_| {
            calls += 1;
            Err(FetchError::Http(404))
        });
        assert!(matches!(res, Err(FetchError::Http(404))));
        assert_eq!(calls, 1);
    }
}
