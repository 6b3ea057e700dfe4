//! Deployment info for a finished transaction.
//!
//! Used by `build` for the seed transaction, by `print` for a saved JSON
//! file and by `search` for every finding.

use std::fmt;
use std::fs;
use std::path::Path;

use tracing::warn;

use crate::crypto::{contract_address, Address, RecoveryError};
use crate::tx::{DeployTx, TxJson, TxJsonError};

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("unable to read file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse tx: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unable to parse tx: {0}")]
    InvalidTx(#[from] TxJsonError),

    #[error("failed to recover tx sender: {0}")]
    Recovery(#[from] RecoveryError),
}

/// Everything needed to broadcast and verify a keyless deployment.
#[derive(Debug, Clone)]
pub struct DeploymentInfo {
    pub tx: DeployTx,
    pub signing_hash: [u8; 32],
    pub tx_hash: [u8; 32],
    pub raw: Vec<u8>,
    pub sender: Address,
    /// Contract address of the sender's first deployment (nonce 0).
    pub address: Address,
}

impl DeploymentInfo {
    pub fn from_tx(tx: DeployTx) -> Result<Self, ReportError> {
        let sender = tx.recover_sender()?;
        let raw = tx.encode_signed();
        Ok(Self {
            signing_hash: tx.effective_signing_hash(),
            tx_hash: crate::crypto::keccak256(&raw),
            raw,
            sender,
            address: contract_address(&sender, 0),
            tx,
        })
    }

    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string(&TxJson::from(&self.tx))?)
    }
}

impl fmt::Display for DeploymentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = self.to_json().map_err(|_| fmt::Error)?;
        writeln!(f, "TX: {}", json)?;
        writeln!(f, "RawTX: 0x{}", hex::encode(&self.raw))?;
        writeln!(f)?;
        writeln!(f, "Sig Hash: 0x{}", hex::encode(self.signing_hash))?;
        writeln!(f, "TX Hash: 0x{}", hex::encode(self.tx_hash))?;
        writeln!(f)?;
        writeln!(f, "Sender: {}", self.sender)?;
        write!(f, "Address: {}", self.address)
    }
}

/// Loads a transaction saved as JSON.
///
/// A `hash` field that disagrees with the recomputed hash is logged, not
/// rejected, since hand-edited files often carry a stale one.
pub fn load_tx_file(path: &Path) -> Result<DeployTx, ReportError> {
    let text = fs::read_to_string(path).map_err(|source| ReportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let json: TxJson = serde_json::from_str(&text)?;
    let tx = DeployTx::try_from(&json)?;

    if let Some(saved) = &json.hash {
        let computed = format!("0x{}", hex::encode(tx.hash()));
        if !saved.eq_ignore_ascii_case(&computed) {
            warn!(%saved, %computed, "tx hash in file does not match its contents");
        }
    }
    Ok(tx)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::crypto::RawSignature;
    use crate::tx::gwei_to_wei;

    fn sample() -> DeployTx {
        let input = hex::decode("60618060095f395ff3fe5f355f355f355f355f355f355f355f3500").unwrap();
        let sig = RawSignature::new(&[0x05, 0x39], &[0x13, 0x37], 27).unwrap();
        DeployTx::creation(gwei_to_wei(1000), 250_000, input.into(), &sig)
    }

    #[test]
    fn test_from_tx() {
        let info = DeploymentInfo::from_tx(sample()).unwrap();
        assert_eq!(
            hex::encode(info.signing_hash),
            "f6c2dd0c6e5ef71e6fa4489e35536f6a4b978efcd990494856337c3bb58426f2"
        );
        assert_eq!(
            hex::encode(info.tx_hash),
            "59fba29f5c649e0a3aeac076551daa68533f305b14bd38273be7540d68f65f51"
        );
        assert_eq!(info.sender.to_hex(), "b0dce62757f4ca80a1d6f78ffd5de7158607d9bc");
        assert_eq!(info.address.to_hex(), "3dc0b1b44f00da0fe85531e630a51d62ddbaa62f");
    }

    #[test]
    fn test_display_lines() {
        let text = DeploymentInfo::from_tx(sample()).unwrap().to_string();
        let lines: Vec<_> = text.lines().collect();
        assert!(lines[0].starts_with("TX: {\"type\":\"0x0\""));
        assert_eq!(
            lines[1],
            "RawTX: 0xf08085e8d4a510008303d09080809b60618060095f395ff3fe5f355f355f355f355f355f355f355f35001b820539821337"
        );
        assert!(lines.iter().any(|l| l.starts_with("Sender: 0x")));
        assert!(lines.last().unwrap().starts_with("Address: 0x"));
    }

    #[test]
    fn test_load_round_trip() {
        let info = DeploymentInfo::from_tx(sample()).unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(info.to_json().unwrap().as_bytes()).unwrap();

        let loaded = load_tx_file(file.path()).unwrap();
        assert_eq!(loaded, info.tx);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_tx_file(Path::new("/nonexistent/tx.json")).unwrap_err();
        assert!(matches!(err, ReportError::Io { .. }));
    }

    #[test]
    fn test_load_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{not json").unwrap();
        assert!(matches!(load_tx_file(file.path()), Err(ReportError::Json(_))));
    }
}
