//! # nick_vanity
//!
//! Vanity address search for keyless contract deployments (Nick's method).
//!
//! ## Architecture
//!
//! - `crypto`: Keccak, sender recovery and contract address derivation
//! - `tx`: Legacy transaction encoding, hashing and JSON form
//! - `matcher`: Nibble scoring against prefix/suffix targets
//! - `worker`: Candidates, search workers and the worker pool
//! - `report`: Deployment info for built, loaded or found transactions
//! - `config`: Command line and validated search configuration

pub mod config;
pub mod crypto;
pub mod matcher;
pub mod report;
pub mod tx;
pub mod worker;

pub use config::{Cli, Command, ConfigError, SearchArgs, SearchConfig};
pub use crypto::{Address, RawSignature, RecoveryError};
pub use matcher::{MatchPolicy, Target};
pub use report::{DeploymentInfo, ReportError};
pub use tx::DeployTx;
pub use worker::{Finding, ReseedPolicy, WorkerPool};
