//! Cooperative stop signal shared by the worker pool and the progress reporter.
//!
//! The stop flag is observed between work units only: setting it never aborts
//! an HTTP transfer that is already running.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Granularity of [`StopFlag::sleep`]; bounds how long a pausing worker takes to notice a stop.
const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Cloneable handle to a single shared stop flag.
#[derive(Debug, Clone, Default)]
pub struct StopFlag {
    flag: Arc<AtomicBool>,
}

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request stop. Idempotent; returns true only for the call that flipped the flag.
    pub fn request(&self) -> bool {
        !self.flag.swap(true, Ordering::SeqCst)
    }

    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Sleep for `duration`, returning early once stop is requested.
    /// Returns true if the full duration elapsed.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_requested() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep((deadline - now).min(SLEEP_SLICE));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_is_shared_between_clones() {
        let stop = StopFlag::new();
        let other = stop.clone();
        assert!(!other.is_requested());
        assert!(stop.request());
        assert!(other.is_requested());
        assert!(!other.request(), "second request does not flip again");
    }

    #[test]
    fn sleep_returns_early_when_stopped() {
        let stop = StopFlag::new();
        let setter = stop.clone();
        let start = Instant::now();
        let t = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            setter.request();
        });
        assert!(!stop.sleep(Duration::from_secs(10)));
        assert!(start.elapsed() < Duration::from_secs(5));
        t.join().unwrap();
    }

    #[test]
    fn sleep_zero_completes() {
        assert!(StopFlag::new().sleep(Duration::ZERO));
    }
}
