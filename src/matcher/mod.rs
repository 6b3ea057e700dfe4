//! Nibble-granular scoring of derived addresses.
//!
//! Supports three match shapes:
//! - Prefix only: partial credit per leading nibble
//! - Suffix exact: the trailing bytes must match in full
//! - Prefix and suffix: suffix gates, prefix earns partial credit

mod score;

pub use score::{score, Anchor, MatchPolicy, Target};
