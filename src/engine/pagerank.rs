use tracing::debug;

use crate::config::PageRankConfig;
use crate::error::StructuralError;
use crate::model::graph::GraphEdge;
use crate::model::graph::GraphNode;
use crate::model::graph::GraphPayload;
use crate::model::graph::GraphSnapshot;

pub const DEFAULT_DAMPING_FACTOR: f64 = 0.85;
pub const DEFAULT_ITERATIONS: usize = 100;

/// Fixed-iteration weighted PageRank.
///
/// Each edge `u -> v` with weight `w` contributes `damping * rank[u] * w / out_degree(u)`,
/// where `out_degree` counts edges rather than summing their weights. Dangling nodes only
/// receive the `(1 - damping) / n` floor. Every round is renormalised to sum to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRankEngine {
    damping_factor: f64,
    iterations: usize,
}

impl Default for PageRankEngine {
    fn default() -> Self {
        Self {
            damping_factor: DEFAULT_DAMPING_FACTOR,
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl PageRankEngine {
    pub fn new(
        damping_factor: f64,
        iterations: usize,
    ) -> Result<Self, StructuralError> {
        if !(damping_factor > 0.0 && damping_factor < 1.0) {
            return Err(StructuralError::InvalidDampingFactor(damping_factor));
        }
        if iterations == 0 {
            return Err(StructuralError::InvalidIterations);
        }
        Ok(Self { damping_factor, iterations })
    }

    pub fn from_config(config: &PageRankConfig) -> Result<Self, StructuralError> {
        Self::new(config.damping_factor, config.iterations)
    }

    pub fn damping_factor(&self) -> f64 { self.damping_factor }

    pub fn iterations(&self) -> usize { self.iterations }

    /// One score per node, in node order.
    pub fn scores(
        &self,
        snapshot: &GraphSnapshot,
    ) -> Vec<f64> {
        let n = snapshot.node_count();
        if n == 0 {
            return Vec::new();
        }

        // (source, target, weight) for every edge whose endpoints are both known
        let mut out_degree = vec![0usize; n];
        let mut links: Vec<(usize, usize, f64)> = Vec::with_capacity(snapshot.edge_count());
        for edge in snapshot.edges() {
            match (snapshot.position(&edge.source), snapshot.position(&edge.target)) {
                (Some(source), Some(target)) => {
                    out_degree[source] += 1;
                    links.push((source, target, edge_weight(edge)));
                },
                _ => debug!("pagerank::edge_skipped::source::{}::target::{}", edge.source, edge.target),
            }
        }

        let base = (1.0 - self.damping_factor) / n as f64;
        let mut ranks = vec![1.0 / n as f64; n];

        for _ in 0..self.iterations {
            let mut next = vec![base; n];
            for &(source, target, weight) in &links {
                next[target] += self.damping_factor * ranks[source] * weight / out_degree[source] as f64;
            }

            let sum: f64 = next.iter().sum();
            if sum > 0.0 && sum.is_finite() {
                for rank in next.iter_mut() {
                    *rank /= sum;
                }
            }
            ranks = next;
        }

        ranks
    }

    /// Nodes of `snapshot` with `pagerank` and tier set from the computed scores.
    pub fn rank(
        &self,
        snapshot: &GraphSnapshot,
    ) -> Vec<GraphNode> {
        let scores = self.scores(snapshot);
        let ranked: Vec<GraphNode> = snapshot
            .nodes()
            .iter()
            .zip(scores)
            .map(|(node, score)| {
                let mut node = node.clone();
                node.set_pagerank(score);
                node
            })
            .collect();
        debug!(
            "pagerank::complete::nodes::{}::edges::{}::iterations::{}",
            snapshot.node_count(),
            snapshot.edge_count(),
            self.iterations
        );
        ranked
    }
}

/// Aggregated value when it is a usable positive number, otherwise 1.
fn edge_weight(edge: &GraphEdge) -> f64 {
    if edge.aggregated_value > 0.0 && edge.aggregated_value.is_finite() { edge.aggregated_value } else { 1.0 }
}

/// Entry point for the `calculatePageRank` message: validates the payload shape before
/// any computation.
pub fn calculate_pagerank(
    graph: GraphPayload,
    damping_factor: Option<f64>,
    iterations: Option<usize>,
) -> Result<Vec<GraphNode>, StructuralError> {
    let snapshot = GraphSnapshot::try_from(graph)?;
    let engine = PageRankEngine::new(
        damping_factor.unwrap_or(DEFAULT_DAMPING_FACTOR),
        iterations.unwrap_or(DEFAULT_ITERATIONS),
    )?;
    Ok(engine.rank(&snapshot))
}
