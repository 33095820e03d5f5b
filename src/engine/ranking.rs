use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

use crate::config::RankingConfig;
use crate::model::graph::GraphNode;
use crate::model::graph::RankedNode;

/// log2(24): entropy of a perfectly uniform hour-of-day distribution.
pub const MAX_HOUR_ENTROPY: f64 = 4.584_962_500_721_156;

/// Caller weights for the three ranking factors. Any non-negative values; they are
/// normalised before use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingWeights {
    pub regularity_weight: f64,
    pub tx_count_weight: f64,
    pub tx_amount_weight: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            regularity_weight: 1.0,
            tx_count_weight: 1.0,
            tx_amount_weight: 1.0,
        }
    }
}

impl From<&RankingConfig> for RankingWeights {
    fn from(config: &RankingConfig) -> Self {
        Self {
            regularity_weight: config.regularity_weight,
            tx_count_weight: config.tx_count_weight,
            tx_amount_weight: config.tx_amount_weight,
        }
    }
}

impl RankingWeights {
    pub fn new(
        regularity_weight: f64,
        tx_count_weight: f64,
        tx_amount_weight: f64,
    ) -> Self {
        Self { regularity_weight, tx_count_weight, tx_amount_weight }
    }

    /// Weights scaled to sum to 1. All-zero weights become 1/3 each.
    pub fn normalized(&self) -> Self {
        let regularity = sanitize("regularity_weight", self.regularity_weight);
        let tx_count = sanitize("tx_count_weight", self.tx_count_weight);
        let tx_amount = sanitize("tx_amount_weight", self.tx_amount_weight);

        let total = regularity + tx_count + tx_amount;
        if total <= 0.0 || !total.is_finite() {
            let third = 1.0 / 3.0;
            return Self::new(third, third, third);
        }
        Self::new(regularity / total, tx_count / total, tx_amount / total)
    }
}

fn sanitize(
    name: &str,
    weight: f64,
) -> f64 {
    if weight.is_finite() && weight >= 0.0 {
        weight
    } else {
        warn!("ranking::invalid_weight::{}::{}::treated_as_zero", name, weight);
        0.0
    }
}

/// `1 - entropy / log2(24)` clamped to [0, 1], or `fallback` when entropy is unknown.
pub fn regularity_score(
    hour_entropy: Option<f64>,
    fallback: f64,
) -> f64 {
    match hour_entropy {
        Some(entropy) if entropy.is_finite() => (1.0 - entropy / MAX_HOUR_ENTROPY).clamp(0.0, 1.0),
        _ => fallback,
    }
}

fn max_or_one(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.filter(|v| v.is_finite()).fold(0.0_f64, f64::max);
    if max > 0.0 { max } else { 1.0 }
}

/// Scores every node under `weights` and returns the best `k`, 1-based ranks attached.
///
/// Ties keep input order. `k <= 0` yields nothing and `k > n` yields every node.
pub fn select_top_k(
    nodes: &[GraphNode],
    weights: &RankingWeights,
    k: i64,
) -> Vec<RankedNode> {
    if k <= 0 || nodes.is_empty() {
        return Vec::new();
    }
    let weights = weights.normalized();

    let max_tx_count = max_or_one(nodes.iter().map(|n| n.tx_count() as f64));
    let max_tx_amount = max_or_one(nodes.iter().map(GraphNode::tx_amount));
    let max_pagerank = max_or_one(nodes.iter().map(|n| n.pagerank));

    let mut scored: Vec<(f64, &GraphNode)> = nodes
        .iter()
        .map(|node| {
            let regularity = regularity_score(node.hour_entropy, node.pagerank / max_pagerank);
            let tx_count_score = node.tx_count() as f64 / max_tx_count;
            let tx_amount_score = node.tx_amount() / max_tx_amount;
            let score = regularity * weights.regularity_weight
                + tx_count_score * weights.tx_count_weight
                + tx_amount_score * weights.tx_amount_weight;
            (if score.is_finite() { score } else { 0.0 }, node)
        })
        .collect();

    // sort_by is stable
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    let take = usize::try_from(k).unwrap_or(usize::MAX).min(scored.len());
    debug!("ranking::top_k::nodes::{}::k::{}::returned::{}", nodes.len(), k, take);

    scored
        .into_iter()
        .take(take)
        .enumerate()
        .map(|(index, (score, node))| RankedNode {
            node: node.clone(),
            score,
            rank: index + 1,
        })
        .collect()
}
