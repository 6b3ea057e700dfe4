//! CREATE contract address computation.
//!
//!   address = keccak256(rlp([sender, nonce]))[12:32]

use alloy_rlp::{Encodable, Header};

use super::{keccak256, Address};

/// Largest encoding: list header (1) + address string (21) + u64 (9).
const MAX_PREIMAGE_LEN: usize = 31;

/// Computes the address of a contract created by `sender` at `nonce`.
///
/// The preimage is encoded into a stack buffer so the search loop stays
/// allocation-free.
#[inline]
pub fn contract_address(sender: &Address, nonce: u64) -> Address {
    let sender = sender.as_bytes();
    let header = Header {
        list: true,
        payload_length: sender.length() + nonce.length(),
    };

    let mut preimage = [0u8; MAX_PREIMAGE_LEN];
    let written = {
        let mut out: &mut [u8] = &mut preimage;
        header.encode(&mut out);
        sender.encode(&mut out);
        nonce.encode(&mut out);
        MAX_PREIMAGE_LEN - out.len()
    };

    let hash = keccak256(&preimage[..written]);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash[12..]);
    Address::from_bytes(addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    #[test]
    fn test_deterministic_deployment_proxy() {
        let sender = addr("0x3fab184622dc19b6109349b94811493bf2a45362");
        assert_eq!(
            contract_address(&sender, 0),
            addr("0x4e59b44847b379578588920ca78fbf26c0b4956c")
        );
    }

    #[test]
    fn test_nonce_changes_address() {
        let sender = addr("0x3fab184622dc19b6109349b94811493bf2a45362");
        assert_ne!(contract_address(&sender, 0), contract_address(&sender, 1));
        // widest nonce still fits the preimage buffer
        let _ = contract_address(&sender, u64::MAX);
    }
}
