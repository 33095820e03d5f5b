use serde::Deserialize;
use serde::Serialize;

use crate::error::DecodeError;
use crate::model::record::Record;
use crate::model::tier::Tier;
use crate::utils::chain_from_address;

/// Per-address activity statistics. Later records for the same address win.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressStat {
    pub address: String,
    pub chain: String,
    pub sent_tx_count: u64,
    pub recv_tx_count: u64,
    pub sent_tx_amount: f64,
    pub recv_tx_amount: f64,
    // Shannon entropy of the hour-of-day distribution, 0..=log2(24)
    pub hour_entropy: Option<f64>,
    pub active_days_count: u64,
    pub counterparty_count_sent: u64,
    pub counterparty_count_recv: u64,
    // Score precomputed by an upstream backend, if any
    pub pagerank: Option<f64>,
    pub tier: Option<Tier>,
}

impl TryFrom<&Record> for AddressStat {
    type Error = DecodeError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        let address = record
            .first_text(&["address", "id"])
            .ok_or_else(|| DecodeError::MissingField("address".to_string()))?;

        let chain = record.text("chain").unwrap_or_else(|| chain_from_address(&address));

        let hour_entropy = match record.number("hour_entropy") {
            Some(entropy) if entropy < 0.0 => {
                return Err(DecodeError::InvalidField {
                    field: "hour_entropy".to_string(),
                    reason: format!("negative entropy {}", entropy),
                });
            },
            other => other,
        };

        let tier = match record.text("tier") {
            Some(tier) => Some(tier.parse::<Tier>().map_err(|reason| DecodeError::InvalidField {
                field: "tier".to_string(),
                reason,
            })?),
            None => None,
        };

        Ok(Self {
            chain,
            sent_tx_count: count_field(record, &["sent_tx_count"])?,
            recv_tx_count: count_field(record, &["recv_tx_count"])?,
            sent_tx_amount: amount_field(record, &["sent_tx_amount", "total_sent"])?,
            recv_tx_amount: amount_field(record, &["recv_tx_amount", "total_received"])?,
            hour_entropy,
            active_days_count: count_field(record, &["active_days_count"])?,
            counterparty_count_sent: count_field(record, &["counterparty_count_sent"])?,
            counterparty_count_recv: count_field(record, &["counterparty_count_recv"])?,
            pagerank: record.first_number(&["pagerank", "final_score"]),
            tier,
            address,
        })
    }
}

fn count_field(
    record: &Record,
    aliases: &[&str],
) -> Result<u64, DecodeError> {
    match record.first_number(aliases) {
        Some(n) if n < 0.0 => Err(DecodeError::InvalidField {
            field: aliases[0].to_string(),
            reason: format!("negative count {}", n),
        }),
        Some(n) => Ok(n.round() as u64),
        None => Ok(0),
    }
}

fn amount_field(
    record: &Record,
    aliases: &[&str],
) -> Result<f64, DecodeError> {
    match record.first_number(aliases) {
        Some(n) if n < 0.0 => Err(DecodeError::InvalidField {
            field: aliases[0].to_string(),
            reason: format!("negative amount {}", n),
        }),
        Some(n) => Ok(n),
        None => Ok(0.0),
    }
}
