//! Nibble match scoring.

use std::str::FromStr;

use crate::crypto::Address;

/// The end of the address a target is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Compare from the first byte forwards.
    Prefix,
    /// Compare from the last byte backwards.
    Suffix,
}

/// Counts the nibbles of `target` that match `candidate` from `anchor` inward,
/// stopping at the first mismatch.
///
/// Bytes are visited from the anchored end; within each byte the high nibble
/// is compared before the low one. The result is `2 * i` when byte `i`
/// differs in its high nibble, `2 * i + 1` when only its low nibble differs,
/// and `2 * target.len()` on a full match.
#[inline]
pub fn score(target: &[u8], candidate: &[u8], anchor: Anchor) -> u32 {
    match anchor {
        Anchor::Prefix => matching_nibbles(target.iter().zip(candidate)),
        Anchor::Suffix => matching_nibbles(target.iter().rev().zip(candidate.iter().rev())),
    }
}

#[inline]
fn matching_nibbles<'a>(pairs: impl Iterator<Item = (&'a u8, &'a u8)>) -> u32 {
    let mut matched = 0;
    for (x, y) in pairs {
        let diff = x ^ y;
        if diff & 0xf0 != 0 {
            return matched;
        }
        if diff & 0x0f != 0 {
            return matched + 1;
        }
        matched += 2;
    }
    matched
}

/// Which ends of the address are scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Score leading nibbles against the prefix.
    PrefixOnly,
    /// Require the suffix in full; score is its nibble count.
    SuffixExact,
    /// Require the suffix in full, then add partial prefix credit.
    PrefixAndSuffix,
}

impl MatchPolicy {
    /// Picks the policy implied by which targets were supplied.
    pub fn infer(has_prefix: bool, has_suffix: bool) -> Option<Self> {
        match (has_prefix, has_suffix) {
            (true, true) => Some(MatchPolicy::PrefixAndSuffix),
            (true, false) => Some(MatchPolicy::PrefixOnly),
            (false, true) => Some(MatchPolicy::SuffixExact),
            (false, false) => None,
        }
    }

    pub fn uses_prefix(self) -> bool {
        matches!(self, MatchPolicy::PrefixOnly | MatchPolicy::PrefixAndSuffix)
    }

    pub fn uses_suffix(self) -> bool {
        matches!(self, MatchPolicy::SuffixExact | MatchPolicy::PrefixAndSuffix)
    }
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "prefix" | "prefix-only" => Ok(MatchPolicy::PrefixOnly),
            "suffix" | "suffix-exact" => Ok(MatchPolicy::SuffixExact),
            "both" | "prefix-and-suffix" => Ok(MatchPolicy::PrefixAndSuffix),
            _ => Err(format!("Unknown match policy: {}", s)),
        }
    }
}

impl std::fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchPolicy::PrefixOnly => write!(f, "prefix"),
            MatchPolicy::SuffixExact => write!(f, "suffix (exact)"),
            MatchPolicy::PrefixAndSuffix => write!(f, "suffix (exact) + prefix"),
        }
    }
}

/// A compiled prefix/suffix target.
#[derive(Debug, Clone)]
pub struct Target {
    prefix: Vec<u8>,
    suffix: Vec<u8>,
    policy: MatchPolicy,
}

impl Target {
    pub fn new(prefix: Vec<u8>, suffix: Vec<u8>, policy: MatchPolicy) -> Self {
        Self {
            prefix,
            suffix,
            policy,
        }
    }

    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    pub fn suffix(&self) -> &[u8] {
        &self.suffix
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Scores an address, or `None` when the suffix gate rejects it.
    #[inline]
    pub fn score(&self, address: &Address) -> Option<u32> {
        let bytes = address.as_bytes();
        match self.policy {
            MatchPolicy::PrefixOnly => Some(score(&self.prefix, bytes, Anchor::Prefix)),
            MatchPolicy::SuffixExact => self.suffix_gate(bytes),
            MatchPolicy::PrefixAndSuffix => self
                .suffix_gate(bytes)
                .map(|gate| gate + score(&self.prefix, bytes, Anchor::Prefix)),
        }
    }

    #[inline]
    fn suffix_gate(&self, bytes: &[u8]) -> Option<u32> {
        let full = 2 * self.suffix.len() as u32;
        (score(&self.suffix, bytes, Anchor::Suffix) == full).then_some(full)
    }

    /// The score of an address matching every targeted nibble.
    pub fn max_score(&self) -> u32 {
        let prefix = if self.policy.uses_prefix() { self.prefix.len() } else { 0 };
        let suffix = if self.policy.uses_suffix() { self.suffix.len() } else { 0 };
        2 * (prefix + suffix) as u32
    }

    /// Expected attempts to reach `score`, assuming uniformly random addresses.
    pub fn estimated_attempts(&self, score: u32) -> u64 {
        16u64.saturating_pow(score.min(self.max_score()))
    }

    /// Returns a human-readable difficulty estimate for reaching `score`.
    pub fn difficulty_description(&self, score: u32) -> String {
        match self.estimated_attempts(score) {
            0..=1_000 => "Very Easy (< 1 second)".into(),
            1_001..=100_000 => "Easy (seconds)".into(),
            100_001..=10_000_000 => "Medium (minutes)".into(),
            10_000_001..=1_000_000_000 => "Hard (hours)".into(),
            _ => "Very Hard (days or more)".into(),
        }
    }
}
