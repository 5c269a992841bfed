//! Job distribution across a fixed pool of download workers.
//!
//! Dataflow: entries → [`dispatch`] (bounded job queue, closed when full) →
//! [`WorkerPool`] → result queue. Every worker folds each result into the
//! [`SharedStats`] before forwarding it, so readers of the statistics never
//! lag behind the result stream.

mod dispatch;
mod pool;
mod progress;

pub use dispatch::dispatch;
pub use pool::{PoolSettings, WorkerPool};
pub use progress::{RunStatistics, SharedStats};
