use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PageRankConfig {
    pub damping_factor: f64,
    pub iterations: usize,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping_factor: 0.85,
            iterations: 100,
        }
    }
}

impl PageRankConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.damping_factor > 0.0 && self.damping_factor < 1.0) {
            return Err(ConfigError::InvalidValue(format!(
                "pagerank.damping_factor {} must lie strictly between 0 and 1",
                self.damping_factor
            )));
        }
        if self.iterations == 0 {
            return Err(ConfigError::InvalidValue("pagerank.iterations must be positive".to_string()));
        }
        Ok(())
    }
}

/// Default weights used when the caller does not supply its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RankingConfig {
    pub regularity_weight: f64,
    pub tx_count_weight: f64,
    pub tx_amount_weight: f64,
    pub top_k: i64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            regularity_weight: 1.0,
            tx_count_weight: 1.0,
            tx_amount_weight: 1.0,
            top_k: 20,
        }
    }
}

impl RankingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, weight) in [
            ("regularity_weight", self.regularity_weight),
            ("tx_count_weight", self.tx_count_weight),
            ("tx_amount_weight", self.tx_amount_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::InvalidValue(format!("ranking.{} must be a non-negative number", name)));
            }
        }
        Ok(())
    }
}
