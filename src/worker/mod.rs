//! Parallel search for a vanity deployment address.
//!
//! This module provides:
//! - Per-worker signature candidates with configurable reseeding
//! - CPU workers that recover, derive and score one candidate per iteration
//! - A pool coordinating workers, shared statistics and progress reports

mod candidate;
mod cpu;
mod pool;
mod stats;

pub use candidate::{Candidate, ReseedPolicy};
pub use cpu::{Derived, SearchWorker};
pub use pool::{Finding, PoolError, WorkerPool};
pub use stats::SharedStats;
