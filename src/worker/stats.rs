//! Lock-free counters shared by every worker and the reporter.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Search-wide statistics.
///
/// The window counter is drained by the reporter every tick; the highscore is
/// never reset and only ever grows.
#[derive(Debug, Default)]
pub struct SharedStats {
    window_attempts: AtomicU64,
    total_attempts: AtomicU64,
    highscore: AtomicU32,
    recovery_failures: AtomicU64,
    findings: AtomicU64,
    dropped_findings: AtomicU64,
}

impl SharedStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `n` attempts, failed recoveries included.
    #[inline]
    pub fn record_attempts(&self, n: u64) {
        self.window_attempts.fetch_add(n, Ordering::Relaxed);
        self.total_attempts.fetch_add(n, Ordering::Relaxed);
    }

    /// Raises the highscore to `score` if it is higher.
    /// Returns true when `score` set a new highscore.
    #[inline]
    pub fn offer_score(&self, score: u32) -> bool {
        self.highscore.fetch_max(score, Ordering::Relaxed) < score
    }

    #[inline]
    pub fn record_recovery_failure(&self) {
        self.recovery_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_finding(&self) {
        self.findings.fetch_add(1, Ordering::Relaxed);
    }

    /// A qualifying candidate was discarded because the finding channel was full.
    pub fn record_dropped_finding(&self) {
        self.dropped_findings.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the attempts since the last call and restarts the window.
    pub fn take_window_attempts(&self) -> u64 {
        self.window_attempts.swap(0, Ordering::Relaxed)
    }

    pub fn highscore(&self) -> u32 {
        self.highscore.load(Ordering::Relaxed)
    }

    pub fn total_attempts(&self) -> u64 {
        self.total_attempts.load(Ordering::Relaxed)
    }

    pub fn recovery_failures(&self) -> u64 {
        self.recovery_failures.load(Ordering::Relaxed)
    }

    pub fn findings(&self) -> u64 {
        self.findings.load(Ordering::Relaxed)
    }

    pub fn dropped_findings(&self) -> u64 {
        self.dropped_findings.load(Ordering::Relaxed)
    }
}
