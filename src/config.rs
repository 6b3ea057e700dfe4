//! Command line and search configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::crypto::{Address, RawSignature, RecoveryError};
use crate::matcher::{MatchPolicy, Target};
use crate::tx::{gwei_to_wei, DeployTx};
use crate::worker::ReseedPolicy;

/// Vanity address searcher for deployments using Nick's method.
///
/// A deployment transaction carrying a hand-picked signature has a sender
/// anyone can recover but nobody holds a key for. Varying S varies that
/// sender and with it the contract address.
#[derive(Parser, Debug, Clone)]
#[command(name = "nick", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Search for a vanity address to deploy a contract using Nick's method
    Search(SearchArgs),
    /// Build a JSON tx object and print the deployment info
    Build(SearchArgs),
    /// Read a JSON tx object from a file and print the deployment info
    Print {
        /// Path to the transaction JSON
        file: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Number of threads to search on (default: number of CPU cores)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Minimum score to report
    #[arg(long, default_value = "5")]
    pub score: u32,

    /// Desired prefix in vanity address (hex)
    #[arg(long, default_value = "0x0000")]
    pub prefix: String,

    /// Desired suffix in vanity address (hex)
    #[arg(long, default_value = "0xaaaa")]
    pub suffix: String,

    /// Initcode to deploy at the vanity address (hex)
    #[arg(long)]
    pub initcode: String,

    /// Gas limit for the deployment transaction
    #[arg(long, default_value = "250000")]
    pub gaslimit: u64,

    /// Gas price (gwei) for the deployment transaction
    #[arg(long, default_value = "1000")]
    pub gasprice: u64,

    /// R value of the transaction signature (hex)
    #[arg(long = "sig-r", default_value = "0x0539")]
    pub sig_r: String,

    /// S value of the transaction signature (hex), the search start point
    #[arg(long = "sig-s", default_value = "0x1337")]
    pub sig_s: String,

    /// How S changes between attempts: strided, random or offset-random
    #[arg(long, default_value = "random")]
    pub reseed: ReseedPolicy,

    /// Which ends to match: prefix, suffix or both (default: inferred)
    #[arg(long = "match")]
    pub match_policy: Option<MatchPolicy>,

    /// Progress report interval in seconds
    #[arg(long, default_value = "30")]
    pub report_interval: u64,
}

impl SearchArgs {
    /// Returns the number of workers, defaulting to CPU count.
    pub fn worker_count(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get)
    }

    /// Validates every flag and produces the immutable search configuration.
    pub fn to_search_config(&self) -> Result<SearchConfig, ConfigError> {
        let prefix = decode_hex("prefix", &self.prefix)?;
        let suffix = decode_hex("suffix", &self.suffix)?;
        let initcode = decode_hex("initcode", &self.initcode)?;
        let sig_r = decode_word("sig-r", &self.sig_r)?;
        let sig_s = decode_word("sig-s", &self.sig_s)?;

        for (flag, bytes) in [("prefix", &prefix), ("suffix", &suffix)] {
            if bytes.len() > Address::LEN {
                return Err(ConfigError::PatternTooLong {
                    flag,
                    len: bytes.len(),
                });
            }
        }

        let match_policy = match self.match_policy {
            Some(policy) => policy,
            None => MatchPolicy::infer(!prefix.is_empty(), !suffix.is_empty())
                .ok_or(ConfigError::EmptyMatchTarget("prefix or suffix"))?,
        };
        if match_policy.uses_prefix() && prefix.is_empty() {
            return Err(ConfigError::EmptyMatchTarget("prefix"));
        }
        if match_policy.uses_suffix() && suffix.is_empty() {
            return Err(ConfigError::EmptyMatchTarget("suffix"));
        }

        let threads = self.worker_count();
        if threads == 0 {
            return Err(ConfigError::ZeroThreads);
        }
        if self.report_interval == 0 {
            return Err(ConfigError::ZeroReportInterval);
        }

        Ok(SearchConfig {
            prefix,
            suffix,
            match_policy,
            initcode: initcode.into(),
            gas_limit: self.gaslimit,
            gas_price: gwei_to_wei(self.gasprice),
            sig_r,
            sig_s,
            min_score: self.score,
            threads,
            reseed: self.reseed,
            report_interval: Duration::from_secs(self.report_interval),
        })
    }
}

/// Validated search parameters, shared read-only by every worker.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub prefix: Vec<u8>,
    pub suffix: Vec<u8>,
    pub match_policy: MatchPolicy,
    /// Exact init code to deploy.
    pub initcode: Arc<[u8]>,
    pub gas_limit: u64,
    /// Gas price in wei.
    pub gas_price: u128,
    pub sig_r: [u8; 32],
    /// Starting S value.
    pub sig_s: [u8; 32],
    pub min_score: u32,
    pub threads: usize,
    pub reseed: ReseedPolicy,
    pub report_interval: Duration,
}

impl SearchConfig {
    pub fn target(&self) -> Target {
        Target::new(self.prefix.clone(), self.suffix.clone(), self.match_policy)
    }

    /// The unmodified seed signature (V = 27).
    pub fn seed_signature(&self) -> Result<RawSignature, RecoveryError> {
        RawSignature::new(&self.sig_r, &self.sig_s, 27)
    }

    /// The deployment transaction carrying the seed signature.
    pub fn deploy_tx(&self) -> Result<DeployTx, RecoveryError> {
        Ok(DeployTx::creation(
            self.gas_price,
            self.gas_limit,
            self.initcode.clone(),
            &self.seed_signature()?,
        ))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("flag value must be hex: --{flag}={value}: {reason}")]
    InvalidHex {
        flag: &'static str,
        value: String,
        reason: String,
    },

    #[error("--{flag} is {len} bytes, longer than an address")]
    PatternTooLong { flag: &'static str, len: usize },

    #[error("--{flag} is {len} bytes, signature values are at most 32 bytes")]
    SignatureValueTooLong { flag: &'static str, len: usize },

    #[error("thread count must be at least 1")]
    ZeroThreads,

    #[error("report interval must be at least 1 second")]
    ZeroReportInterval,

    #[error("match policy needs a non-empty {0}")]
    EmptyMatchTarget(&'static str),
}

/// Decodes a byte string flag; `0x` is optional, digits must pair up.
fn decode_hex(flag: &'static str, value: &str) -> Result<Vec<u8>, ConfigError> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(digits).map_err(|e| ConfigError::InvalidHex {
        flag,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Decodes a signature quantity into a right-aligned 32-byte word.
/// Odd digit counts are allowed since these are numbers, not byte strings.
fn decode_word(flag: &'static str, value: &str) -> Result<[u8; 32], ConfigError> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    let padded = if digits.len() % 2 == 1 {
        format!("0{digits}")
    } else {
        digits.to_string()
    };
    let bytes = decode_hex(flag, &padded).map_err(|err| match err {
        ConfigError::InvalidHex { flag, reason, .. } => ConfigError::InvalidHex {
            flag,
            value: value.to_string(),
            reason,
        },
        other => other,
    })?;
    let bytes = crate::tx::trim_leading_zeros(&bytes);
    if bytes.len() > 32 {
        return Err(ConfigError::SignatureValueTooLong {
            flag,
            len: bytes.len(),
        });
    }

    let mut word = [0u8; 32];
    word[32 - bytes.len()..].copy_from_slice(bytes);
    Ok(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_args(initcode: &str) -> SearchArgs {
        SearchArgs {
            threads: Some(2),
            score: 5,
            prefix: "0x0000".into(),
            suffix: "0xaaaa".into(),
            initcode: initcode.into(),
            gaslimit: 250_000,
            gasprice: 1000,
            sig_r: "0x0539".into(),
            sig_s: "0x1337".into(),
            reseed: ReseedPolicy::RandomReplace,
            match_policy: None,
            report_interval: 30,
        }
    }

    #[test]
    fn test_defaults_validate() {
        let config = make_test_args("0x6061").to_search_config().unwrap();
        assert_eq!(config.prefix, vec![0, 0]);
        assert_eq!(config.suffix, vec![0xaa, 0xaa]);
        assert_eq!(config.match_policy, MatchPolicy::PrefixAndSuffix);
        assert_eq!(config.gas_price, 1_000_000_000_000);
        assert_eq!(&config.sig_r[30..], &[0x05, 0x39]);
        assert_eq!(&config.sig_s[30..], &[0x13, 0x37]);
        assert_eq!(&config.initcode[..], &[0x60, 0x61]);
    }

    #[test]
    fn test_invalid_prefix() {
        let mut args = make_test_args("0x");
        args.prefix = "zz".into();
        assert!(matches!(
            args.to_search_config(),
            Err(ConfigError::InvalidHex { flag: "prefix", .. })
        ));
    }

    #[test]
    fn test_odd_initcode_rejected() {
        let args = make_test_args("0x606");
        assert!(matches!(
            args.to_search_config(),
            Err(ConfigError::InvalidHex { flag: "initcode", .. })
        ));
    }

    #[test]
    fn test_odd_signature_quantity_accepted() {
        let mut args = make_test_args("0x");
        args.sig_r = "0x539".into();
        let config = args.to_search_config().unwrap();
        assert_eq!(&config.sig_r[30..], &[0x05, 0x39]);
    }

    #[test]
    fn test_oversized_values() {
        let mut args = make_test_args("0x");
        args.sig_s = format!("0x{}", "ff".repeat(33));
        assert!(matches!(
            args.to_search_config(),
            Err(ConfigError::SignatureValueTooLong { flag: "sig-s", len: 33 })
        ));

        let mut args = make_test_args("0x");
        args.suffix = format!("0x{}", "aa".repeat(21));
        assert!(matches!(
            args.to_search_config(),
            Err(ConfigError::PatternTooLong { flag: "suffix", .. })
        ));
    }

    #[test]
    fn test_zero_threads() {
        let mut args = make_test_args("0x");
        args.threads = Some(0);
        assert!(matches!(args.to_search_config(), Err(ConfigError::ZeroThreads)));
    }

    #[test]
    fn test_match_policy_needs_target() {
        let mut args = make_test_args("0x");
        args.prefix = "0x".into();
        args.suffix = "".into();
        assert!(matches!(
            args.to_search_config(),
            Err(ConfigError::EmptyMatchTarget(_))
        ));

        let mut args = make_test_args("0x");
        args.suffix = "0x".into();
        args.match_policy = Some(MatchPolicy::PrefixAndSuffix);
        assert!(matches!(
            args.to_search_config(),
            Err(ConfigError::EmptyMatchTarget("suffix"))
        ));

        args.match_policy = None;
        let config = args.to_search_config().unwrap();
        assert_eq!(config.match_policy, MatchPolicy::PrefixOnly);
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "nick", "search", "--initcode", "0x6061", "--threads", "3", "--reseed", "strided",
        ])
        .unwrap();
        match cli.command {
            Command::Search(args) => {
                assert_eq!(args.worker_count(), 3);
                assert_eq!(args.reseed, ReseedPolicy::StridedIncrement);
                assert_eq!(args.sig_r, "0x0539");
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::try_parse_from(["nick", "print", "tx.json"]).unwrap();
        assert!(matches!(cli.command, Command::Print { .. }));

        assert!(Cli::try_parse_from(["nick", "build"]).is_err());
    }
}
