//! Legacy contract-creation transactions.
//!
//! Covers the canonical RLP encoding, the signing hash (both the unprotected
//! six-field form and the EIP-155 nine-field form), the transaction hash and
//! sender recovery.

mod json;

pub use json::{TxJson, TxJsonError};

use std::sync::Arc;

use alloy_rlp::{BufMut, Encodable, Header, EMPTY_STRING_CODE};

use crate::crypto::{self, keccak256, Address, RawSignature, RecoveryError};

/// One Gwei in wei.
pub const GWEI: u128 = 1_000_000_000;

/// Converts a price given in Gwei to wei.
#[inline]
pub fn gwei_to_wei(gwei: u64) -> u128 {
    gwei as u128 * GWEI
}

/// Returns `bytes` without its leading zero bytes (minimal big-endian integer).
#[inline]
pub fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

/// A legacy (type 0) transaction.
///
/// For a keyless deployment `to` is `None`, `nonce` and `value` are zero and
/// the signature is chosen rather than computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployTx {
    pub nonce: u64,
    /// Gas price in wei.
    pub gas_price: u128,
    pub gas_limit: u64,
    pub to: Option<Address>,
    pub value: u128,
    /// Init code (or call data when `to` is set).
    pub input: Arc<[u8]>,
    pub v: u64,
    /// Big-endian R, right-aligned.
    pub r: [u8; 32],
    /// Big-endian S, right-aligned.
    pub s: [u8; 32],
}

impl DeployTx {
    /// Builds an unprotected contract creation with the given signature.
    pub fn creation(gas_price: u128, gas_limit: u64, input: Arc<[u8]>, signature: &RawSignature) -> Self {
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(signature.r());
        s.copy_from_slice(signature.s());

        Self {
            nonce: 0,
            gas_price,
            gas_limit,
            to: None,
            value: 0,
            input,
            v: signature.v(),
            r,
            s,
        }
    }

    /// Chain id encoded in `v`, if the signature is EIP-155 protected.
    pub fn chain_id(&self) -> Option<u64> {
        (self.v >= 35).then(|| (self.v - 35) / 2)
    }

    /// Recovery id encoded in `v`.
    pub fn recovery_id(&self) -> Result<u8, RecoveryError> {
        match self.v {
            27 | 28 => Ok((self.v - 27) as u8),
            v if v >= 35 => Ok(((v - 35) % 2) as u8),
            v => Err(RecoveryError::InvalidV(v)),
        }
    }

    /// The signature in its fixed 65-byte form.
    pub fn signature(&self) -> Result<RawSignature, RecoveryError> {
        RawSignature::with_recovery_id(&self.r, &self.s, self.recovery_id()?)
    }

    fn encode_to(&self, out: &mut dyn BufMut) {
        match &self.to {
            Some(addr) => addr.as_bytes().encode(out),
            None => out.put_u8(EMPTY_STRING_CODE),
        }
    }

    fn to_length(&self) -> usize {
        self.to.map_or(1, |addr| addr.as_bytes().length())
    }

    /// Encodes nonce, gas price, gas limit, recipient, value and input.
    fn encode_unsigned_fields(&self, out: &mut dyn BufMut) {
        self.nonce.encode(out);
        self.gas_price.encode(out);
        self.gas_limit.encode(out);
        self.encode_to(out);
        self.value.encode(out);
        self.input[..].encode(out);
    }

    fn unsigned_fields_length(&self) -> usize {
        self.nonce.length()
            + self.gas_price.length()
            + self.gas_limit.length()
            + self.to_length()
            + self.value.length()
            + self.input[..].length()
    }

    fn signing_payload(&self, chain_id: Option<u64>) -> Vec<u8> {
        let mut payload_length = self.unsigned_fields_length();
        if let Some(id) = chain_id {
            payload_length += id.length() + 0u8.length() * 2;
        }

        let header = Header {
            list: true,
            payload_length,
        };
        let mut out = Vec::with_capacity(payload_length + 9);
        header.encode(&mut out);
        self.encode_unsigned_fields(&mut out);
        if let Some(id) = chain_id {
            id.encode(&mut out);
            0u8.encode(&mut out);
            0u8.encode(&mut out);
        }
        out
    }

    /// Hash signed over by an unprotected (pre-EIP-155) signature.
    ///
    /// Only the six unsigned fields contribute, so this stays fixed while a
    /// search varies S.
    pub fn signing_hash(&self) -> [u8; 32] {
        keccak256(&self.signing_payload(None))
    }

    /// Hash signed over by an EIP-155 signature for `chain_id`.
    pub fn signing_hash_for_chain(&self, chain_id: u64) -> [u8; 32] {
        keccak256(&self.signing_payload(Some(chain_id)))
    }

    /// The signing hash matching this transaction's `v`.
    pub fn effective_signing_hash(&self) -> [u8; 32] {
        match self.chain_id() {
            Some(id) => self.signing_hash_for_chain(id),
            None => self.signing_hash(),
        }
    }

    /// Raw signed transaction bytes, as broadcast.
    pub fn encode_signed(&self) -> Vec<u8> {
        let r = trim_leading_zeros(&self.r);
        let s = trim_leading_zeros(&self.s);
        let payload_length =
            self.unsigned_fields_length() + self.v.length() + r.length() + s.length();

        let header = Header {
            list: true,
            payload_length,
        };
        let mut out = Vec::with_capacity(payload_length + 9);
        header.encode(&mut out);
        self.encode_unsigned_fields(&mut out);
        self.v.encode(&mut out);
        r.encode(&mut out);
        s.encode(&mut out);
        out
    }

    /// Transaction hash (keccak256 of the raw signed bytes).
    pub fn hash(&self) -> [u8; 32] {
        keccak256(&self.encode_signed())
    }

    /// Recovers the sender, honouring EIP-155 when `v` carries a chain id.
    pub fn recover_sender(&self) -> Result<Address, RecoveryError> {
        let signature = self.signature()?;
        let secp = secp256k1::Secp256k1::verification_only();
        crypto::recover_sender(&secp, &self.effective_signing_hash(), &signature)
    }
}
