//! JSON form of a legacy transaction, as produced by Ethereum node software.

use serde::{Deserialize, Serialize};

use super::{trim_leading_zeros, DeployTx};
use crate::crypto::Address;

/// Legacy transactions are type 0.
const LEGACY_TX_TYPE: &str = "0x0";

#[derive(Debug, thiserror::Error)]
pub enum TxJsonError {
    #[error("unsupported transaction type {0}, only legacy (0x0) transactions are handled")]
    UnsupportedType(String),

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Field layout and order follow the node serialization of a legacy
/// transaction; quantities are minimal `0x` hex, `to` is `null` for creations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxJson {
    #[serde(rename = "type", default)]
    pub tx_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
    pub nonce: String,
    #[serde(default)]
    pub to: Option<String>,
    pub gas: String,
    pub gas_price: String,
    pub value: String,
    #[serde(alias = "data")]
    pub input: String,
    pub v: String,
    pub r: String,
    pub s: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl From<&DeployTx> for TxJson {
    fn from(tx: &DeployTx) -> Self {
        Self {
            tx_type: Some(LEGACY_TX_TYPE.to_string()),
            chain_id: tx.chain_id().map(|id| format!("{id:#x}")),
            nonce: format!("{:#x}", tx.nonce),
            to: tx.to.map(|addr| addr.to_checksum()),
            gas: format!("{:#x}", tx.gas_limit),
            gas_price: format!("{:#x}", tx.gas_price),
            value: format!("{:#x}", tx.value),
            input: format!("0x{}", hex::encode(&tx.input)),
            v: format!("{:#x}", tx.v),
            r: word_quantity(&tx.r),
            s: word_quantity(&tx.s),
            hash: Some(format!("0x{}", hex::encode(tx.hash()))),
        }
    }
}

impl TryFrom<&TxJson> for DeployTx {
    type Error = TxJsonError;

    fn try_from(json: &TxJson) -> Result<Self, Self::Error> {
        if let Some(tx_type) = &json.tx_type {
            if parse_u64("type", tx_type)? != 0 {
                return Err(TxJsonError::UnsupportedType(tx_type.clone()));
            }
        }

        let to = match &json.to {
            Some(to) => Some(
                to.parse::<Address>()
                    .map_err(|reason| TxJsonError::InvalidField { field: "to", reason })?,
            ),
            None => None,
        };

        Ok(Self {
            nonce: parse_u64("nonce", &json.nonce)?,
            gas_price: parse_u128("gasPrice", &json.gas_price)?,
            gas_limit: parse_u64("gas", &json.gas)?,
            to,
            value: parse_u128("value", &json.value)?,
            input: parse_data("input", &json.input)?.into(),
            v: parse_u64("v", &json.v)?,
            r: parse_word("r", &json.r)?,
            s: parse_word("s", &json.s)?,
        })
    }
}

/// Minimal hex quantity for a 32-byte big-endian word.
fn word_quantity(word: &[u8; 32]) -> String {
    let digits = hex::encode(trim_leading_zeros(word));
    match digits.trim_start_matches('0') {
        "" => "0x0".to_string(),
        trimmed => format!("0x{trimmed}"),
    }
}

fn strip_0x<'a>(field: &'static str, value: &'a str) -> Result<&'a str, TxJsonError> {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .ok_or_else(|| TxJsonError::InvalidField {
            field,
            reason: format!("expected 0x-prefixed hex, got {value:?}"),
        })
}

fn parse_u64(field: &'static str, value: &str) -> Result<u64, TxJsonError> {
    let digits = strip_0x(field, value)?;
    u64::from_str_radix(digits, 16).map_err(|e| TxJsonError::InvalidField {
        field,
        reason: e.to_string(),
    })
}

fn parse_u128(field: &'static str, value: &str) -> Result<u128, TxJsonError> {
    let digits = strip_0x(field, value)?;
    u128::from_str_radix(digits, 16).map_err(|e| TxJsonError::InvalidField {
        field,
        reason: e.to_string(),
    })
}

fn parse_word(field: &'static str, value: &str) -> Result<[u8; 32], TxJsonError> {
    let digits = strip_0x(field, value)?;
    let padded = if digits.len() % 2 == 1 {
        format!("0{digits}")
    } else {
        digits.to_string()
    };
    let bytes = hex::decode(&padded).map_err(|e| TxJsonError::InvalidField {
        field,
        reason: e.to_string(),
    })?;
    let bytes = trim_leading_zeros(&bytes);
    if bytes.len() > 32 {
        return Err(TxJsonError::InvalidField {
            field,
            reason: format!("{} bytes exceeds 32", bytes.len()),
        });
    }

    let mut word = [0u8; 32];
    word[32 - bytes.len()..].copy_from_slice(bytes);
    Ok(word)
}

fn parse_data(field: &'static str, value: &str) -> Result<Vec<u8>, TxJsonError> {
    let digits = strip_0x(field, value)?;
    hex::decode(digits).map_err(|e| TxJsonError::InvalidField {
        field,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::RawSignature;
    use crate::tx::gwei_to_wei;

    fn sample() -> DeployTx {
        let sig = RawSignature::new(&[0x05, 0x39], &[0x13, 0x37], 27).unwrap();
        DeployTx::creation(gwei_to_wei(1000), 250_000, vec![0x60, 0x61].into(), &sig)
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(TxJson::from(&sample())).unwrap();
        assert_eq!(json["type"], "0x0");
        assert_eq!(json["nonce"], "0x0");
        assert!(json["to"].is_null());
        assert_eq!(json["gas"], "0x3d090");
        assert_eq!(json["gasPrice"], "0xe8d4a51000");
        assert_eq!(json["value"], "0x0");
        assert_eq!(json["input"], "0x6061");
        assert_eq!(json["v"], "0x1b");
        assert_eq!(json["r"], "0x539");
        assert_eq!(json["s"], "0x1337");
        assert!(json.get("chainId").is_none());

        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert!(keys.contains(&"hash".to_string()));
    }

    #[test]
    fn test_json_field_order() {
        let text = serde_json::to_string(&TxJson::from(&sample())).unwrap();
        let order = ["\"type\"", "\"nonce\"", "\"to\"", "\"gas\"", "\"gasPrice\"", "\"value\"", "\"input\"", "\"v\"", "\"r\"", "\"s\"", "\"hash\""];
        let positions: Vec<_> = order.iter().map(|k| text.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_parse_back() {
        let tx = sample();
        let json = TxJson::from(&tx);
        assert_eq!(DeployTx::try_from(&json).unwrap(), tx);
    }

    #[test]
    fn test_accepts_data_alias_and_missing_type() {
        let text = r#"{"nonce":"0x0","gas":"0x1","gasPrice":"0x1","value":"0x0","data":"0x00","v":"0x1b","r":"0x1","s":"0x2"}"#;
        let json: TxJson = serde_json::from_str(text).unwrap();
        let tx = DeployTx::try_from(&json).unwrap();
        assert_eq!(&tx.input[..], &[0u8]);
        assert_eq!(tx.to, None);
        assert_eq!(tx.s[31], 2);
    }

    #[test]
    fn test_rejects_typed_transactions() {
        let mut json = TxJson::from(&sample());
        json.tx_type = Some("0x2".into());
        assert!(matches!(
            DeployTx::try_from(&json),
            Err(TxJsonError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_rejects_malformed_fields() {
        let mut json = TxJson::from(&sample());
        json.gas = "12".into();
        assert!(matches!(
            DeployTx::try_from(&json),
            Err(TxJsonError::InvalidField { field: "gas", .. })
        ));

        let mut json = TxJson::from(&sample());
        json.r = format!("0x{}", "11".repeat(33));
        assert!(matches!(
            DeployTx::try_from(&json),
            Err(TxJsonError::InvalidField { field: "r", .. })
        ));
    }
}
