//! Ethereum address representation.

use std::fmt;
use std::str::FromStr;

use secp256k1::PublicKey;

use super::keccak256;

/// An Ethereum address (20 bytes).
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    /// Length of an address in bytes.
    pub const LEN: usize = 20;

    #[inline]
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Derives the account address owning a secp256k1 public key:
    /// the last 20 bytes of keccak256 over the uncompressed point (sans 0x04 tag).
    #[inline]
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let point = public_key.serialize_uncompressed();
        let hash = keccak256(&point[1..]);

        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash[12..]);
        Self(bytes)
    }

    /// Lowercase hex without the 0x prefix.
    #[inline]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// EIP-55 mixed-case checksum encoding with 0x prefix.
    pub fn to_checksum(&self) -> String {
        let lower = self.to_hex();
        let hash = keccak256(lower.as_bytes());

        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = if i % 2 == 0 {
                hash[i / 2] >> 4
            } else {
                hash[i / 2] & 0x0f
            };
            if nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl FromStr for Address {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|e| format!("invalid address {s}: {e}"))?;
        let bytes: [u8; 20] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| format!("address must be 20 bytes, got {}", b.len()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secp256k1::{Secp256k1, SecretKey};

    #[test]
    fn test_checksum_address() {
        // EIP-55 test vector
        let addr: Address = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".parse().unwrap();
        assert_eq!(addr.to_checksum(), "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
    }

    #[test]
    fn test_from_public_key() {
        let secp = Secp256k1::new();
        let mut secret = [0u8; 32];
        secret[31] = 1;
        let key = SecretKey::from_slice(&secret).unwrap();
        let addr = Address::from_public_key(&PublicKey::from_secret_key(&secp, &key));
        assert_eq!(addr.to_hex(), "7e5f4552091a69125d5dfcb7b8c2659029395bdf");
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert!("0xdeadbeef".parse::<Address>().is_err());
        assert!("0xzz".parse::<Address>().is_err());
    }
}
