//! Worker pool management and periodic progress reporting.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, select, tick, Receiver, Sender};
use tracing::{info, warn};

use crate::config::SearchConfig;
use crate::crypto::{Address, RecoveryError};
use crate::tx::DeployTx;

use super::candidate::Candidate;
use super::cpu::SearchWorker;
use super::stats::SharedStats;

/// A candidate that reached the minimum score.
#[derive(Debug, Clone)]
pub struct Finding {
    pub score: u32,
    /// Whether this score raised the search-wide highscore.
    pub new_highscore: bool,
    pub sender: Address,
    pub address: Address,
    /// The deployable transaction carrying the winning signature.
    pub tx: DeployTx,
    pub worker_id: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("invalid seed signature: {0}")]
    Signature(#[from] RecoveryError),

    #[error("failed to spawn thread: {0}")]
    Spawn(#[from] io::Error),
}

/// Runs `threads` search workers plus one progress reporter.
pub struct WorkerPool {
    /// Worker thread handles, taken on shutdown.
    handles: Option<Vec<JoinHandle<()>>>,
    /// Progress reporter thread.
    reporter: Option<JoinHandle<()>>,
    /// Findings from the workers, dropped on shutdown.
    finding_rx: Option<Receiver<Finding>>,
    /// Dropping this disconnects the reporter's shutdown channel.
    shutdown_tx: Option<Sender<()>>,
    /// Raised to make every worker leave its loop.
    stop_flag: Arc<AtomicBool>,
    /// Counters shared with the workers and the reporter.
    stats: Arc<SharedStats>,
    /// When the pool was spawned.
    start_time: Instant,
}

impl WorkerPool {
    /// Spawns the workers and the reporter.
    ///
    /// Every candidate is built before the first thread starts, so a bad seed
    /// signature fails with nothing running.
    pub fn spawn(config: SearchConfig) -> Result<Self, PoolError> {
        let candidates = (0..config.threads)
            .map(|id| Candidate::for_worker(&config, id))
            .collect::<Result<Vec<_>, _>>()?;

        let (finding_tx, finding_rx) = bounded(100);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);
        let stop_flag = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(SharedStats::new());

        let mut pool = Self {
            handles: None,
            reporter: None,
            finding_rx: Some(finding_rx),
            shutdown_tx: Some(shutdown_tx),
            stop_flag: stop_flag.clone(),
            stats: stats.clone(),
            start_time: Instant::now(),
        };

        // On a spawn error the pool drops here and joins whatever did start.
        let mut handles = Vec::with_capacity(config.threads);
        for (id, candidate) in candidates.into_iter().enumerate() {
            let worker = SearchWorker::new(
                id,
                candidate,
                config.target(),
                config.min_score,
                finding_tx.clone(),
                stop_flag.clone(),
                stats.clone(),
            );
            let spawned = thread::Builder::new()
                .name(format!("vanity-worker-{}", id))
                .spawn(move || worker.run(&mut rand::thread_rng()));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    pool.handles = Some(handles);
                    return Err(err.into());
                }
            }
        }
        pool.handles = Some(handles);
        pool.reporter = Some(spawn_reporter(
            config.report_interval,
            stats,
            shutdown_rx,
        )?);

        info!(
            workers = config.threads,
            reseed = %config.reseed,
            policy = %config.match_policy,
            "search started"
        );
        Ok(pool)
    }

    /// Waits for a finding, returning `None` on timeout.
    pub fn wait_for_finding(&self, timeout: Duration) -> Option<Finding> {
        self.finding_rx.as_ref()?.recv_timeout(timeout).ok()
    }

    /// Signals all workers to stop.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }

    /// Stops and waits for every worker and the reporter.
    pub fn join(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop();
        self.finding_rx.take();
        self.shutdown_tx.take();
        if let Some(handles) = self.handles.take() {
            for handle in handles {
                let _ = handle.join();
            }
        }
        if let Some(reporter) = self.reporter.take() {
            let _ = reporter.join();
        }
    }

    pub fn stats(&self) -> &SharedStats {
        &self.stats
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average attempts per second since the pool started.
    pub fn attempts_per_second(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.stats.total_attempts() as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Returns a clone of the stop flag for signal handlers.
    pub fn stop_flag_clone(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_flag.load(Ordering::Relaxed)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Logs attempts since the previous tick and the highscore, then restarts
/// the attempt window. Exits once `shutdown` disconnects.
fn spawn_reporter(
    interval: Duration,
    stats: Arc<SharedStats>,
    shutdown: Receiver<()>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("vanity-reporter".into())
        .spawn(move || {
            let ticker = tick(interval);
            let mut window_start = Instant::now();
            let mut failures_seen = 0;
            let mut dropped_seen = 0;
            loop {
                select! {
                    recv(ticker) -> _ => {
                        let attempts = stats.take_window_attempts();
                        let elapsed = window_start.elapsed();
                        window_start = Instant::now();
                        info!(
                            "Did {} attempts in {:.1?}, best score is {}",
                            attempts,
                            elapsed,
                            stats.highscore()
                        );

                        let failures = stats.recovery_failures();
                        if failures > failures_seen {
                            warn!(
                                failed = failures - failures_seen,
                                total = failures,
                                "signature recovery failed for some candidates"
                            );
                            failures_seen = failures;
                        }

                        let dropped = stats.dropped_findings();
                        if dropped > dropped_seen {
                            warn!(
                                dropped = dropped - dropped_seen,
                                total = dropped,
                                "findings arrived faster than they were printed, raise --score"
                            );
                            dropped_seen = dropped;
                        }
                    }
                    recv(shutdown) -> _ => break,
                }
            }
        })
}
