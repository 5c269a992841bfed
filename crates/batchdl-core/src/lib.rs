pub mod config;
pub mod logging;

pub mod checkpoint;
pub mod control;
pub mod downloader;
pub mod entries;
pub mod lifecycle;
pub mod report;
pub mod retry;
pub mod scheduler;
