use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value as JsonValue;
use tracing::debug;
use tracing::warn;

use crate::model::address::AddressStat;
use crate::model::graph::FALLBACK_PAGERANK;
use crate::model::record::Record;
use crate::model::record::Schema;
use crate::model::record::Value;
use crate::model::transaction::Transaction;

/// Filter payload accepted by the remote analytics endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsFilter {
    pub start_date: String,
    pub end_date: String,
    pub batch_quant_weight: f64,
    pub tx_count_weight: f64,
    pub tx_amount_weight: f64,
    pub top_n: usize,
}

/// Four loosely-typed record arrays returned by the remote analytics endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsResponse {
    pub top_nodes_json: Vec<Map<String, JsonValue>>,
    pub related_nodes_json: Vec<Map<String, JsonValue>>,
    pub top_nodes_derived_json: Vec<Map<String, JsonValue>>,
    pub related_nodes_derived_json: Vec<Map<String, JsonValue>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedResponse {
    pub transactions: Vec<Transaction>,
    pub address_stats: Vec<AddressStat>,
    pub skipped: usize,
}

impl AnalyticsResponse {
    /// Converts raw and derived arrays into typed records, skipping unusable objects.
    pub fn normalize(&self) -> NormalizedResponse {
        let mut normalized = NormalizedResponse::default();

        for object in self.top_nodes_json.iter().chain(self.related_nodes_json.iter()) {
            match Transaction::try_from(&record_from_object(object)) {
                Ok(tx) => normalized.transactions.push(tx),
                Err(e) => {
                    warn!("normalize::transaction_skipped::error::{}", e);
                    normalized.skipped += 1;
                },
            }
        }

        for object in self.top_nodes_derived_json.iter().chain(self.related_nodes_derived_json.iter()) {
            match AddressStat::try_from(&record_from_object(object)) {
                Ok(mut stat) => {
                    // Derived rows without a backend score get the same default the UI expects
                    stat.pagerank.get_or_insert(FALLBACK_PAGERANK);
                    normalized.address_stats.push(stat);
                },
                Err(e) => {
                    warn!("normalize::address_stat_skipped::error::{}", e);
                    normalized.skipped += 1;
                },
            }
        }

        debug!(
            "normalize::transactions::{}::address_stats::{}::skipped::{}",
            normalized.transactions.len(),
            normalized.address_stats.len(),
            normalized.skipped
        );
        normalized
    }
}

fn record_from_object(object: &Map<String, JsonValue>) -> Record {
    let schema = Arc::new(Schema::from_header(object.keys().cloned()));
    let (values, raw): (Vec<Value>, Vec<String>) = object
        .values()
        .map(|value| match value {
            JsonValue::Null => (Value::Null, String::new()),
            JsonValue::Bool(b) => (Value::Bool(*b), b.to_string()),
            JsonValue::Number(n) => (n.as_f64().map(Value::Number).unwrap_or(Value::Null), n.to_string()),
            JsonValue::String(s) if s.trim().is_empty() => (Value::Null, String::new()),
            JsonValue::String(s) => (Value::Text(s.clone()), s.clone()),
            other => (Value::Text(other.to_string()), other.to_string()),
        })
        .unzip();
    Record::with_raw(schema, values, raw)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_filter_serializes_snake_case() {
        let filter = AnalyticsFilter {
            start_date: "2024-01-01".to_string(),
            end_date: "2024-01-31".to_string(),
            batch_quant_weight: 0.5,
            tx_count_weight: 0.3,
            tx_amount_weight: 0.2,
            top_n: 10,
        };
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(json["batch_quant_weight"], 0.5);
        assert_eq!(json["top_n"], 10);
    }

    #[test]
    fn test_normalize_response() {
        let response: AnalyticsResponse = serde_json::from_value(json!({
            "top_nodes_json": [
                {"txhash": "h1", "from": "osmo1a", "to": "cosmos1b", "value": 10, "timestamp": 5}
            ],
            "related_nodes_json": [
                {"fromAddress": "osmo1a", "toAddress": ""}
            ],
            "top_nodes_derived_json": [
                {"id": "osmo1a", "sent_tx_count": 1, "total_sent": 10}
            ],
            "related_nodes_derived_json": [
                {"address": "cosmos1b", "recv_tx_count": 1, "final_score": 0.9, "hour_entropy": 2.0}
            ]
        }))
        .unwrap();

        let normalized = response.normalize();
        assert_eq!(normalized.skipped, 1);
        assert_eq!(normalized.transactions.len(), 1);
        let tx = &normalized.transactions[0];
        assert_eq!(tx.tx_hash, "h1");
        assert_eq!(tx.from_chain, "osmo");
        assert_eq!(tx.to_chain, "cosmos");
        assert_eq!(tx.amount, 10.0);

        assert_eq!(normalized.address_stats.len(), 2);
        assert_eq!(normalized.address_stats[0].pagerank, Some(FALLBACK_PAGERANK));
        assert_eq!(normalized.address_stats[0].sent_tx_amount, 10.0);
        assert_eq!(normalized.address_stats[1].pagerank, Some(0.9));
        assert_eq!(normalized.address_stats[1].hour_entropy, Some(2.0));
    }
}
