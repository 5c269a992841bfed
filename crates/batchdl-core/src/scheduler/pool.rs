//! Bounded pool of download worker threads.

use crossbeam_channel::{Receiver, Sender};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::control::StopFlag;
use crate::downloader::{Download, DownloadEntry, DownloadResult};

use super::SharedStats;

/// Per-run worker settings.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub workers: usize,
    pub output_dir: PathBuf,
    pub max_retries: u32,
    /// Pause after each finished entry, per worker.
    pub delay: Duration,
}

/// Running worker threads plus the queue they report results on.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    results: Receiver<DownloadResult>,
}

impl WorkerPool {
    /// Start `min(settings.workers, jobs_total)` workers consuming `jobs`.
    /// The result queue holds `jobs_total` results so workers never block on it.
    pub fn spawn(
        settings: PoolSettings,
        jobs: Receiver<DownloadEntry>,
        jobs_total: usize,
        downloader: Arc<dyn Download>,
        stats: SharedStats,
        stop: StopFlag,
    ) -> Self {
        let (tx, rx) = crossbeam_channel::bounded(jobs_total.max(1));
        let num_workers = settings.workers.max(1).min(jobs_total);
        let settings = Arc::new(settings);
        let mut handles = Vec::with_capacity(num_workers);
        for id in 0..num_workers {
            let jobs = jobs.clone();
            let tx = tx.clone();
            let downloader = Arc::clone(&downloader);
            let stats = stats.clone();
            let stop = stop.clone();
            let settings = Arc::clone(&settings);
            handles.push(std::thread::spawn(move || {
                worker_loop(id, &settings, &jobs, &tx, downloader.as_ref(), &stats, &stop);
            }));
        }
        drop(tx);
        tracing::debug!(workers = num_workers, jobs = jobs_total, "worker pool started");
        Self {
            handles,
            results: rx,
        }
    }

    /// Result queue; closes once every worker has exited.
    pub fn results(&self) -> &Receiver<DownloadResult> {
        &self.results
    }

    /// Wait for all workers. Returns how many of them panicked.
    pub fn join(self) -> usize {
        let mut panicked = 0;
        for h in self.handles {
            if h.join().is_err() {
                panicked += 1;
            }
        }
        panicked
    }
}

fn worker_loop(
    id: usize,
    settings: &PoolSettings,
    jobs: &Receiver<DownloadEntry>,
    results: &Sender<DownloadResult>,
    downloader: &dyn Download,
    stats: &SharedStats,
    stop: &StopFlag,
) {
    loop {
        // Checked before taking a job so a stop never abandons a pulled entry.
        if stop.is_requested() {
            tracing::debug!(worker = id, "stop requested, worker exiting");
            break;
        }
        let entry = match jobs.recv() {
            Ok(e) => e,
            Err(_) => break,
        };
        let dest = entry.destination(&settings.output_dir);
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            downloader.download(&entry.url, &dest, settings.max_retries)
        }))
        .unwrap_or_else(|_| {
            tracing::error!(worker = id, url = %entry.url, "download panicked");
            DownloadResult::failed(&entry.url, &dest)
        });
        stats.update(&result);
        if results.send(result).is_err() {
            break;
        }
        if !settings.delay.is_zero() {
            stop.sleep(settings.delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::dispatch;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records calls and fails every URL containing "bad".
    #[derive(Default)]
    struct FakeDownloader {
        calls: Mutex<Vec<(String, PathBuf, u32)>>,
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl Download for FakeDownloader {
        fn download(&self, url: &str, dest: &Path, max_retries: u32) -> DownloadResult {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(2));
            self.calls
                .lock()
                .unwrap()
                .push((url.to_string(), dest.to_path_buf(), max_retries));
            self.active.fetch_sub(1, Ordering::SeqCst);
            if url.contains("bad") {
                DownloadResult::failed(url, dest)
            } else {
                DownloadResult::succeeded(url, dest, 4, Duration::from_millis(2))
            }
        }
    }

    fn entries(n: usize) -> Vec<DownloadEntry> {
        (0..n)
            .map(|i| {
                let url = if i % 4 == 0 {
                    format!("http://h/bad/{}", i)
                } else {
                    format!("http://h/ok/{}", i)
                };
                DownloadEntry::new(format!("f{}", i), url)
            })
            .collect()
    }

    fn settings(workers: usize) -> PoolSettings {
        PoolSettings {
            workers,
            output_dir: PathBuf::from("out"),
            max_retries: 2,
            delay: Duration::ZERO,
        }
    }

    type RunOutput = (Vec<DownloadResult>, Arc<FakeDownloader>, SharedStats);

    fn run_with(settings: PoolSettings, n: usize, stop: StopFlag) -> RunOutput {
        let fake = Arc::new(FakeDownloader::default());
        let stats = SharedStats::default();
        stats.begin_run(n as u64);
        let pool = WorkerPool::spawn(
            settings,
            dispatch(entries(n)),
            n,
            fake.clone(),
            stats.clone(),
            stop,
        );
        let results: Vec<_> = pool.results().iter().collect();
        assert_eq!(pool.join(), 0);
        (results, fake, stats)
    }

    fn run(workers: usize, n: usize, stop: StopFlag) -> RunOutput {
        run_with(settings(workers), n, stop)
    }

    #[test]
    fn every_entry_yields_exactly_one_result() {
        let (results, fake, stats) = run(4, 40, StopFlag::new());
        assert_eq!(results.len(), 40);
        let mut urls: Vec<_> = results.iter().map(|r| r.url.clone()).collect();
        urls.sort();
        urls.dedup();
        assert_eq!(urls.len(), 40);
        let s = stats.snapshot();
        assert_eq!(s.failed, 10);
        assert_eq!(s.succeeded, 30);
        assert_eq!(s.total_bytes, 120);
        assert_eq!(s.remaining, 0);
        assert_eq!(fake.calls.lock().unwrap().len(), 40);
    }

    #[test]
    fn downloads_use_output_dir_and_retry_budget() {
        let (_, fake, _) = run(2, 3, StopFlag::new());
        let calls = fake.calls.lock().unwrap();
        assert!(calls.iter().all(|(_, _, r)| *r == 2));
        assert!(calls.iter().any(|(_, d, _)| d == Path::new("out/f1")));
    }

    #[test]
    fn concurrency_never_exceeds_worker_count() {
        let (_, fake, _) = run(3, 30, StopFlag::new());
        assert!(fake.peak.load(Ordering::SeqCst) <= 3);
    }

    #[test]
    fn stop_before_start_runs_nothing() {
        let stop = StopFlag::new();
        stop.request();
        let (results, fake, stats) = run(4, 20, stop);
        assert!(results.is_empty());
        assert!(fake.calls.lock().unwrap().is_empty());
        assert_eq!(stats.snapshot().remaining, 20);
    }

    #[test]
    fn delay_pauses_each_worker_between_entries() {
        let mut s = settings(1);
        s.delay = Duration::from_millis(30);
        let started = std::time::Instant::now();
        let (results, _, _) = run_with(s, 3, StopFlag::new());
        assert_eq!(results.len(), 3);
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[test]
    fn stop_cuts_delay_short_without_losing_results() {
        let mut s = settings(2);
        s.delay = Duration::from_secs(5);
        let stop = StopFlag::new();
        let stopper = {
            let stop = stop.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(100));
                stop.request();
            })
        };
        let started = std::time::Instant::now();
        let (results, fake, stats) = run_with(s, 20, stop);
        stopper.join().unwrap();

        // Without the early wake-up each worker would sleep out its 5s delay.
        assert!(started.elapsed() < Duration::from_secs(3));
        assert!(!results.is_empty() && results.len() < 20);
        assert_eq!(results.len(), fake.calls.lock().unwrap().len());
        let snap = stats.snapshot();
        assert_eq!(snap.resolved(), results.len() as u64);
        assert_eq!(snap.remaining, 20 - results.len() as u64);
    }

    #[test]
    fn zero_entries_closes_results_immediately() {
        let (results, _, _) = run(4, 0, StopFlag::new());
        assert!(results.is_empty());
    }

    struct Panicky;

    impl Download for Panicky {
        fn download(&self, _url: &str, _dest: &Path, _max_retries: u32) -> DownloadResult {
            panic!("boom");
        }
    }

    #[test]
    fn panicking_download_becomes_failure() {
        let stats = SharedStats::default();
        stats.begin_run(2);
        let pool = WorkerPool::spawn(
            settings(1),
            dispatch(entries(2)),
            2,
            Arc::new(Panicky),
            stats.clone(),
            StopFlag::new(),
        );
        let results: Vec<_> = pool.results().iter().collect();
        assert_eq!(pool.join(), 0);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| !r.success));
        assert_eq!(stats.snapshot().failed, 2);
    }
}
