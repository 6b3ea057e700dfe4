//! Cryptographic primitives for keyless deployments.
//!
//! This module provides:
//! - Keccak-256 hashing
//! - Ethereum address handling and contract address derivation
//! - Sender recovery from a fixed, non-secret signature

mod address;
mod create;
mod recover;

pub use address::Address;
pub use create::contract_address;
pub use recover::{recover_plain, recover_sender, RawSignature, RecoveryError};

use tiny_keccak::{Hasher, Keccak};

/// Keccak-256 of arbitrary bytes.
#[inline]
pub fn keccak256(input: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(input);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}
