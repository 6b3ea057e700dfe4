//! Sender recovery from a fixed-shape signature.
//!
//! A keyless deployment picks R and S by hand instead of signing. Public key
//! recovery then yields a sender nobody holds a key for, but which anyone can
//! reproduce from the same transaction.

use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, Secp256k1, Verification};

use super::Address;

/// V value of a pre-EIP-155 signature with recovery id 0.
pub const LEGACY_V_BASE: u64 = 27;

/// Errors raised while recovering a sender.
#[derive(Debug, thiserror::Error)]
pub enum RecoveryError {
    #[error("signature {field} is {len} bytes, at most 32 allowed")]
    ValueTooLong { field: &'static str, len: usize },

    #[error("invalid recovery id {0}, expected 0 or 1")]
    InvalidRecoveryId(u64),

    #[error("invalid signature v {0}, expected 27, 28 or an EIP-155 value")]
    InvalidV(u64),

    #[error("public key recovery failed: {0}")]
    Recovery(#[from] secp256k1::Error),
}

/// A 65-byte signature: R in `[0, 32)`, S in `[32, 64)`, recovery id at 64.
///
/// Workers keep one of these per candidate and rewrite S in place.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawSignature([u8; 65]);

impl RawSignature {
    /// Builds a signature from big-endian R and S and a legacy V (27 or 28).
    pub fn new(r: &[u8], s: &[u8], v: u64) -> Result<Self, RecoveryError> {
        let recovery_id = v
            .checked_sub(LEGACY_V_BASE)
            .filter(|id| *id <= 1)
            .ok_or(RecoveryError::InvalidV(v))?;
        Self::with_recovery_id(r, s, recovery_id as u8)
    }

    /// Builds a signature from big-endian R and S and a raw recovery id.
    pub fn with_recovery_id(r: &[u8], s: &[u8], recovery_id: u8) -> Result<Self, RecoveryError> {
        if recovery_id > 1 {
            return Err(RecoveryError::InvalidRecoveryId(recovery_id as u64));
        }
        let mut bytes = [0u8; 65];
        right_align(&mut bytes[..32], r, "r")?;
        right_align(&mut bytes[32..64], s, "s")?;
        bytes[64] = recovery_id;
        Ok(Self(bytes))
    }

    #[inline]
    pub fn r(&self) -> &[u8] {
        &self.0[..32]
    }

    #[inline]
    pub fn s(&self) -> &[u8] {
        &self.0[32..64]
    }

    /// Mutable view of S, for in-place reseeding.
    #[inline]
    pub fn s_mut(&mut self) -> &mut [u8] {
        &mut self.0[32..64]
    }

    #[inline]
    pub fn recovery_id(&self) -> u8 {
        self.0[64]
    }

    /// The legacy V value (27 or 28).
    #[inline]
    pub fn v(&self) -> u64 {
        LEGACY_V_BASE + self.0[64] as u64
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }
}

impl std::fmt::Debug for RawSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RawSignature(0x{})", hex::encode(self.0))
    }
}

fn right_align(dst: &mut [u8], src: &[u8], field: &'static str) -> Result<(), RecoveryError> {
    if src.len() > dst.len() {
        return Err(RecoveryError::ValueTooLong {
            field,
            len: src.len(),
        });
    }
    let offset = dst.len() - src.len();
    dst[offset..].copy_from_slice(src);
    Ok(())
}

/// Recovers the address whose key would have produced `signature` over `hash`.
#[inline]
pub fn recover_sender<C: Verification>(
    secp: &Secp256k1<C>,
    hash: &[u8; 32],
    signature: &RawSignature,
) -> Result<Address, RecoveryError> {
    let id = RecoveryId::from_i32(signature.recovery_id() as i32)?;
    let sig = RecoverableSignature::from_compact(&signature.0[..64], id)?;
    let msg = Message::from_digest(*hash);
    let public_key = secp.recover_ecdsa(&msg, &sig)?;
    Ok(Address::from_public_key(&public_key))
}

/// One-shot recovery from loose R, S and legacy V values.
pub fn recover_plain(hash: &[u8; 32], r: &[u8], s: &[u8], v: u64) -> Result<Address, RecoveryError> {
    let signature = RawSignature::new(r, s, v)?;
    recover_sender(&Secp256k1::verification_only(), hash, &signature)
}
