//! Per-worker signature candidate and reseed policies.

use std::str::FromStr;

use rand::RngCore;

use crate::config::SearchConfig;
use crate::crypto::{RawSignature, RecoveryError};
use crate::tx::DeployTx;

/// How a worker moves to its next S value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReseedPolicy {
    /// Worker `i` of `n` walks `S + i`, `S + i + n`, ... so workers never overlap.
    StridedIncrement,
    /// Replace S with a fresh random 64-bit value.
    #[default]
    RandomReplace,
    /// Configured S plus a fresh random 64-bit value.
    OffsetRandom,
}

impl FromStr for ReseedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strided" | "increment" => Ok(ReseedPolicy::StridedIncrement),
            "random" => Ok(ReseedPolicy::RandomReplace),
            "offset-random" | "offset" => Ok(ReseedPolicy::OffsetRandom),
            _ => Err(format!("Unknown reseed policy: {}", s)),
        }
    }
}

impl std::fmt::Display for ReseedPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReseedPolicy::StridedIncrement => write!(f, "strided"),
            ReseedPolicy::RandomReplace => write!(f, "random"),
            ReseedPolicy::OffsetRandom => write!(f, "offset-random"),
        }
    }
}

/// The candidate a single worker mutates.
///
/// The signing hash covers none of the signature fields, so it is computed
/// once here and reused for every S the worker tries.
#[derive(Debug, Clone)]
pub struct Candidate {
    template: DeployTx,
    signing_hash: [u8; 32],
    signature: RawSignature,
    base_s: [u8; 32],
    policy: ReseedPolicy,
    stride: u64,
}

impl Candidate {
    /// Builds the candidate for worker `worker_id`.
    pub fn for_worker(config: &SearchConfig, worker_id: usize) -> Result<Self, RecoveryError> {
        let template = config.deploy_tx()?;
        let signing_hash = template.signing_hash();
        let mut signature = config.seed_signature()?;
        if config.reseed == ReseedPolicy::StridedIncrement {
            add_be(signature.s_mut(), worker_id as u64);
        }

        Ok(Self {
            template,
            signing_hash,
            signature,
            base_s: config.sig_s,
            policy: config.reseed,
            stride: config.threads as u64,
        })
    }

    #[inline]
    pub fn signing_hash(&self) -> &[u8; 32] {
        &self.signing_hash
    }

    #[inline]
    pub fn signature(&self) -> &RawSignature {
        &self.signature
    }

    pub fn policy(&self) -> ReseedPolicy {
        self.policy
    }

    /// Moves S to the next value under this candidate's policy.
    #[inline]
    pub fn reseed<R: RngCore>(&mut self, rng: &mut R) {
        let s = self.signature.s_mut();
        match self.policy {
            ReseedPolicy::StridedIncrement => add_be(s, self.stride),
            ReseedPolicy::RandomReplace => {
                s.fill(0);
                s[24..].copy_from_slice(&rng.next_u64().to_be_bytes());
            }
            ReseedPolicy::OffsetRandom => {
                s.copy_from_slice(&self.base_s);
                add_be(s, rng.next_u64());
            }
        }
    }

    /// The full transaction for the current S.
    pub fn to_tx(&self) -> DeployTx {
        let mut tx = self.template.clone();
        tx.s.copy_from_slice(self.signature.s());
        tx
    }
}

/// Adds `n` to a big-endian integer in place, wrapping on overflow.
#[inline]
fn add_be(bytes: &mut [u8], n: u64) {
    let mut carry = n as u128;
    for byte in bytes.iter_mut().rev() {
        if carry == 0 {
            return;
        }
        let sum = *byte as u128 + (carry & 0xff);
        *byte = sum as u8;
        carry = (carry >> 8) + (sum >> 8);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::matcher::MatchPolicy;

    fn config(reseed: ReseedPolicy, threads: usize) -> SearchConfig {
        let mut sig_s = [0u8; 32];
        sig_s[30..].copy_from_slice(&[0x13, 0x37]);
        let mut sig_r = [0u8; 32];
        sig_r[30..].copy_from_slice(&[0x05, 0x39]);
        SearchConfig {
            prefix: vec![0, 0],
            suffix: vec![0xaa, 0xaa],
            match_policy: MatchPolicy::PrefixAndSuffix,
            initcode: vec![0x60, 0x61].into(),
            gas_limit: 250_000,
            gas_price: crate::tx::gwei_to_wei(1000),
            sig_r,
            sig_s,
            min_score: 5,
            threads,
            reseed,
            report_interval: std::time::Duration::from_secs(30),
        }
    }

    fn s_value(candidate: &Candidate) -> u128 {
        u128::from_be_bytes(candidate.signature().s()[16..].try_into().unwrap())
    }

    #[test]
    fn test_add_be_carries() {
        let mut bytes = [0x00, 0xff, 0xff];
        add_be(&mut bytes, 1);
        assert_eq!(bytes, [0x01, 0x00, 0x00]);

        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&u64::MAX.to_be_bytes());
        add_be(&mut bytes, u64::MAX);
        assert_eq!(&bytes[23..], &[1, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe]);

        let mut bytes = [0xff; 4];
        add_be(&mut bytes, 1);
        assert_eq!(bytes, [0; 4]);
    }

    #[test]
    fn test_strided_partitions_search_space() {
        let threads = 4;
        let config = config(ReseedPolicy::StridedIncrement, threads);
        let mut rng = StdRng::seed_from_u64(1);
        let mut seen = HashSet::new();

        for worker_id in 0..threads {
            let mut candidate = Candidate::for_worker(&config, worker_id).unwrap();
            assert_eq!(s_value(&candidate), 0x1337 + worker_id as u128);
            for _ in 0..500 {
                assert!(seen.insert(s_value(&candidate)), "duplicate S across workers");
                candidate.reseed(&mut rng);
            }
        }
        assert_eq!(seen.len(), threads * 500);
    }

    #[test]
    fn test_random_replace_stays_in_low_word() {
        let config = config(ReseedPolicy::RandomReplace, 2);
        let mut candidate = Candidate::for_worker(&config, 1).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..16 {
            candidate.reseed(&mut rng);
            assert!(candidate.signature().s()[..24].iter().all(|b| *b == 0));
        }
    }

    #[test]
    fn test_offset_random_starts_from_seed() {
        let config = config(ReseedPolicy::OffsetRandom, 1);
        let mut candidate = Candidate::for_worker(&config, 0).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        candidate.reseed(&mut rng);

        let mut expected = StdRng::seed_from_u64(3);
        assert_eq!(s_value(&candidate), 0x1337 + expected.next_u64() as u128);
    }

    #[test]
    fn test_reseed_keeps_signing_hash() {
        let config = config(ReseedPolicy::RandomReplace, 1);
        let mut candidate = Candidate::for_worker(&config, 0).unwrap();
        let hash = *candidate.signing_hash();
        candidate.reseed(&mut StdRng::seed_from_u64(9));

        let tx = candidate.to_tx();
        assert_eq!(tx.signing_hash(), hash);
        assert_eq!(&tx.s[..], candidate.signature().s());
        assert_eq!(tx.r, config.sig_r);
        assert_eq!(tx.v, 27);
    }

    #[test]
    fn test_parse_policy() {
        assert_eq!("strided".parse::<ReseedPolicy>().unwrap(), ReseedPolicy::StridedIncrement);
        assert_eq!("offset-random".parse::<ReseedPolicy>().unwrap(), ReseedPolicy::OffsetRandom);
        assert!("sideways".parse::<ReseedPolicy>().is_err());
    }
}
