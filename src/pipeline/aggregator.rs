use std::collections::HashMap;

use petgraph::prelude::*;
use petgraph::Graph;
use tracing::debug;

use crate::model::address::AddressStat;
use crate::model::graph::GraphEdge;
use crate::model::graph::GraphNode;
use crate::model::graph::GraphSnapshot;
use crate::model::transaction::Transaction;

/// Builds the deduplicated transfer graph for one analysis cycle.
///
/// Transactions and address stats may arrive in any order and interleave. An address
/// stat always wins over the zeroed defaults a transaction-only node starts with.
#[derive(Debug, Clone, Default)]
pub struct GraphAggregator {
  graph:        Graph<GraphNode, GraphEdge>,
  node_indices: HashMap<String, NodeIndex>,
  edge_indices: HashMap<(NodeIndex, NodeIndex), EdgeIndex>,
  transactions: Vec<Transaction>,
}

impl GraphAggregator {
  pub fn new() -> Self { Self::default() }

  pub fn add_node(
    &mut self,
    address: &str,
    chain: &str,
  ) -> NodeIndex {
    if let Some(&idx) = self.node_indices.get(address) {
      return idx;
    }

    let idx = self.graph.add_node(GraphNode::new(address, chain));
    self.node_indices.insert(address.to_string(), idx);
    idx
  }

  /// Overwrite-merges a stat into its node, creating the node if needed.
  pub fn add_address_stat(
    &mut self,
    stat: &AddressStat,
  ) -> NodeIndex {
    let idx = self.add_node(&stat.address, &stat.chain);
    self.graph[idx].apply_stat(stat);
    idx
  }

  pub fn add_address_stats<'a>(
    &mut self,
    stats: impl IntoIterator<Item = &'a AddressStat>,
  ) {
    for stat in stats {
      self.add_address_stat(stat);
    }
  }

  /// Upserts the edge keyed by (from, to).
  pub fn add_transaction(
    &mut self,
    tx: Transaction,
  ) -> EdgeIndex {
    let from_idx = self.add_node(&tx.from_address, &tx.from_chain);
    let to_idx = self.add_node(&tx.to_address, &tx.to_chain);

    let edge_idx = match self.edge_indices.get(&(from_idx, to_idx)) {
      Some(&edge_idx) => {
        self.graph[edge_idx].absorb(&tx);
        edge_idx
      },
      None => {
        let edge_idx = self.graph.add_edge(from_idx, to_idx, GraphEdge::from_transaction(&tx));
        self.edge_indices.insert((from_idx, to_idx), edge_idx);
        edge_idx
      },
    };

    self.transactions.push(tx);
    edge_idx
  }

  pub fn add_transactions(
    &mut self,
    transactions: impl IntoIterator<Item = Transaction>,
  ) {
    for tx in transactions {
      self.add_transaction(tx);
    }
  }

  pub fn node_count(&self) -> usize { self.graph.node_count() }

  pub fn edge_count(&self) -> usize { self.graph.edge_count() }

  pub fn transaction_count(&self) -> usize { self.transactions.len() }

  pub fn node(
    &self,
    address: &str,
  ) -> Option<&GraphNode> {
    self.node_indices.get(address).map(|&idx| &self.graph[idx])
  }

  pub fn edge(
    &self,
    from: &str,
    to: &str,
  ) -> Option<&GraphEdge> {
    let from_idx = self.node_indices.get(from)?;
    let to_idx = self.node_indices.get(to)?;
    self.edge_indices.get(&(*from_idx, *to_idx)).map(|&idx| &self.graph[idx])
  }

  /// Materialises the current state without consuming the aggregator.
  pub fn snapshot(&self) -> GraphSnapshot {
    GraphSnapshot::new(
      self.graph.node_weights().cloned().collect(),
      self.graph.edge_weights().cloned().collect(),
      self.transactions.clone(),
    )
  }

  pub fn finish(self) -> GraphSnapshot {
    let (nodes, edges) = self.graph.into_nodes_edges();
    let nodes: Vec<GraphNode> = nodes.into_iter().map(|node| node.weight).collect();
    let edges: Vec<GraphEdge> = edges.into_iter().map(|edge| edge.weight).collect();
    debug!("aggregator::finished::nodes::{}::edges::{}", nodes.len(), edges.len());
    GraphSnapshot::new(nodes, edges, self.transactions)
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::model::tier::Tier;
  use crate::test_utils::address_stat;
  use crate::test_utils::transaction;

  #[test]
  fn test_repeated_transfers_fold_into_one_edge() {
    let mut aggregator = GraphAggregator::new();
    for amount in [10.0, 20.0, 30.0] {
      aggregator.add_transaction(transaction("osmo1a", "osmo1b", amount));
    }

    assert_eq!(aggregator.node_count(), 2);
    assert_eq!(aggregator.edge_count(), 1);
    let edge = aggregator.edge("osmo1a", "osmo1b").unwrap();
    assert_eq!(edge.aggregated_value, 60.0);
    assert_eq!(edge.tx_count, 3);
    assert!(!edge.cross_chain);

    // Reverse direction is its own edge
    aggregator.add_transaction(transaction("osmo1b", "osmo1a", 1.0));
    assert_eq!(aggregator.edge_count(), 2);
    assert_eq!(aggregator.transaction_count(), 4);
  }

  #[test]
  fn test_cross_chain_fixed_by_defining_transaction() {
    let mut aggregator = GraphAggregator::new();
    let mut first = transaction("osmo1a", "cosmos1b", 1.0);
    first.to_chain = "cosmos".to_string();
    aggregator.add_transaction(first);

    let mut second = transaction("osmo1a", "cosmos1b", 2.0);
    second.to_chain = second.from_chain.clone();
    aggregator.add_transaction(second);

    let edge = aggregator.edge("osmo1a", "cosmos1b").unwrap();
    assert!(edge.cross_chain);
    assert_eq!(edge.tx_count, 2);
  }

  #[test]
  fn test_stats_are_authoritative_in_either_order() {
    let stat = address_stat("osmo1a", 4, 1, 0.5);

    let mut tx_first = GraphAggregator::new();
    tx_first.add_transaction(transaction("osmo1a", "osmo1b", 5.0));
    tx_first.add_address_stat(&stat);

    let mut stat_first = GraphAggregator::new();
    stat_first.add_address_stat(&stat);
    stat_first.add_transaction(transaction("osmo1a", "osmo1b", 5.0));

    for aggregator in [&tx_first, &stat_first] {
      let node = aggregator.node("osmo1a").unwrap();
      assert_eq!(node.sent_tx_count, 4);
      assert_eq!(node.recv_tx_count, 1);
      assert_eq!(node.tier, Tier::Gold);
    }

    let untouched = stat_first.node("osmo1b").unwrap();
    assert_eq!(untouched.tx_count(), 0);
    assert_eq!(untouched.tier, Tier::Bronze);
  }

  #[test]
  fn test_stat_only_address_becomes_node() {
    let mut aggregator = GraphAggregator::new();
    aggregator.add_address_stats(&[address_stat("cosmos1lonely", 0, 0, 0.0)]);
    let snapshot = aggregator.finish();
    assert_eq!(snapshot.node_count(), 1);
    assert_eq!(snapshot.edge_count(), 0);
    assert_eq!(snapshot.node("cosmos1lonely").map(|n| n.chain.as_str()), Some("cosmos"));
  }

  #[test]
  fn test_snapshot_matches_finish() {
    let mut aggregator = GraphAggregator::new();
    aggregator.add_transactions(vec![
      transaction("osmo1a", "osmo1b", 1.0),
      transaction("osmo1b", "osmo1c", 2.0),
    ]);
    let snapshot = aggregator.snapshot();
    assert_eq!(snapshot, aggregator.finish());
    assert_eq!(snapshot.transactions_for("osmo1b").len(), 2);
  }
}
