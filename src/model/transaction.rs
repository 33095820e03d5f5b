use chrono::DateTime;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;

use crate::error::DecodeError;
use crate::model::record::Record;
use crate::model::record::Value;
use crate::utils::chain_from_address;

/// Which kind of rows a delimited file carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FileType {
    Transactions,
    Addresses,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Transactions => "transactions",
            FileType::Addresses => "addresses",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub tx_hash: String,
    pub from_address: String,
    pub to_address: String,
    pub from_chain: String,
    pub to_chain: String,
    pub amount: f64,
    pub denom: String,
    pub timestamp_millis: i64,
}

impl Transaction {
    pub fn is_cross_chain(&self) -> bool { self.from_chain != self.to_chain }

    pub fn touches(
        &self,
        address: &str,
    ) -> bool {
        self.from_address == address || self.to_address == address
    }
}

impl TryFrom<&Record> for Transaction {
    type Error = DecodeError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        let from_address = record
            .first_text(&["fromAddress", "from_address", "from"])
            .ok_or_else(|| DecodeError::MissingField("fromAddress".to_string()))?;
        let to_address = record
            .first_text(&["toAddress", "to_address", "to"])
            .ok_or_else(|| DecodeError::MissingField("toAddress".to_string()))?;

        let amount = match record.first_number(&["amount", "value"]) {
            Some(amount) if amount < 0.0 => {
                return Err(DecodeError::InvalidField {
                    field: "amount".to_string(),
                    reason: format!("negative amount {}", amount),
                });
            },
            Some(amount) => amount,
            None => 0.0,
        };

        let timestamp_millis = match record.get("timestamp") {
            Some(value) => parse_timestamp_millis(value).ok_or_else(|| DecodeError::InvalidField {
                field: "timestamp".to_string(),
                reason: format!("unrecognized timestamp {}", value),
            })?,
            None => 0,
        };

        let from_chain = record
            .first_text(&["fromChain", "from_chain"])
            .unwrap_or_else(|| chain_from_address(&from_address));
        let to_chain = record
            .first_text(&["toChain", "to_chain"])
            .unwrap_or_else(|| chain_from_address(&to_address));

        let tx_hash = record
            .first_text(&["txhash", "txHash", "tx_hash", "hash"])
            .unwrap_or_else(|| format!("tx-{}-{}-{}", from_address, to_address, timestamp_millis));

        let denom = record.first_text(&["denom", "dpDenom"]).unwrap_or_default();

        Ok(Self {
            tx_hash,
            from_address,
            to_address,
            from_chain,
            to_chain,
            amount,
            denom,
            timestamp_millis,
        })
    }
}

/// Epoch milliseconds, RFC 3339, or `YYYY-MM-DD HH:MM:SS` (UTC).
pub fn parse_timestamp_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => Some(*n as i64),
        Value::Text(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.timestamp_millis());
            }
            ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.and_utc().timestamp_millis())
        },
        _ => None,
    }
}
