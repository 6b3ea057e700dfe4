//! CPU search worker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Sender, TrySendError};
use rand::RngCore;
use secp256k1::{Secp256k1, VerifyOnly};
use tracing::{debug, trace};

use crate::crypto::{contract_address, recover_sender, Address, RecoveryError};
use crate::matcher::Target;

use super::candidate::Candidate;
use super::stats::SharedStats;
use super::Finding;

/// Attempts buffered locally before they are added to the shared counter.
const FLUSH_EVERY: u64 = 1024;

/// Outcome of deriving and scoring the current candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Derived {
    pub sender: Address,
    pub address: Address,
    /// `None` when the suffix gate rejected the address.
    pub score: Option<u32>,
}

/// A worker owning one candidate, searching until the stop flag is raised.
pub struct SearchWorker {
    id: usize,
    candidate: Candidate,
    target: Target,
    min_score: u32,
    secp: Secp256k1<VerifyOnly>,
    finding_tx: Sender<Finding>,
    stop_flag: Arc<AtomicBool>,
    stats: Arc<SharedStats>,
    /// Attempts not yet added to the shared counter.
    pending: u64,
}

impl SearchWorker {
    pub fn new(
        id: usize,
        candidate: Candidate,
        target: Target,
        min_score: u32,
        finding_tx: Sender<Finding>,
        stop_flag: Arc<AtomicBool>,
        stats: Arc<SharedStats>,
    ) -> Self {
        Self {
            id,
            candidate,
            target,
            min_score,
            secp: Secp256k1::verification_only(),
            finding_tx,
            stop_flag,
            stats,
            pending: 0,
        }
    }

    /// Recovers the sender for the current S, derives its nonce-0 contract
    /// address and scores it.
    #[inline]
    pub fn derive(&self) -> Result<Derived, RecoveryError> {
        let sender = recover_sender(
            &self.secp,
            self.candidate.signing_hash(),
            self.candidate.signature(),
        )?;
        let address = contract_address(&sender, 0);
        Ok(Derived {
            sender,
            address,
            score: self.target.score(&address),
        })
    }

    /// Tries the current candidate: scores it, updates the highscore and
    /// emits a finding when it clears the minimum score.
    ///
    /// Never blocks. Pending attempts are flushed before a finding is sent,
    /// and a finding that does not fit in the channel is counted as dropped.
    #[inline]
    pub fn attempt(&mut self) {
        self.pending += 1;
        let derived = match self.derive() {
            Ok(derived) => derived,
            Err(err) => {
                self.stats.record_recovery_failure();
                debug!(worker = self.id, %err, "signature recovery failed, skipping candidate");
                return;
            }
        };

        let Some(score) = derived.score else {
            return;
        };
        let new_highscore = self.stats.offer_score(score);
        if score < self.min_score {
            return;
        }

        self.flush();
        let finding = Finding {
            score,
            new_highscore,
            sender: derived.sender,
            address: derived.address,
            tx: self.candidate.to_tx(),
            worker_id: self.id,
        };
        match self.finding_tx.try_send(finding) {
            Ok(()) => self.stats.record_finding(),
            Err(TrySendError::Full(_)) => {
                self.stats.record_dropped_finding();
                debug!(worker = self.id, score, "finding channel full, dropping finding");
            }
            // Receiver gone means the pool is shutting down.
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    #[inline]
    fn flush(&mut self) {
        if self.pending > 0 {
            self.stats.record_attempts(self.pending);
            self.pending = 0;
        }
    }

    /// Runs the search loop on the calling thread.
    ///
    /// The stop flag is checked once per attempt. Attempts reach the shared
    /// counter in batches, before every finding and once more on exit.
    pub fn run<R: RngCore>(mut self, rng: &mut R) {
        debug!(worker = self.id, policy = %self.candidate.policy(), "worker started");

        while !self.stop_flag.load(Ordering::Relaxed) {
            self.attempt();
            self.candidate.reseed(rng);
            if self.pending >= FLUSH_EVERY {
                self.flush();
            }
        }
        self.flush();

        trace!(worker = self.id, "worker stopped");
    }
}
