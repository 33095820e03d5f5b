use crate::model::address::AddressStat;
use crate::model::graph::GraphEdge;
use crate::model::graph::GraphNode;
use crate::model::graph::GraphSnapshot;
use crate::model::transaction::Transaction;
use crate::utils::chain_from_address;

/// Transfer between two addresses; chains are derived from the address prefixes.
pub fn transaction(
    from: &str,
    to: &str,
    amount: f64,
) -> Transaction {
    Transaction {
        tx_hash: format!("tx-{}-{}-{}", from, to, amount),
        from_address: from.to_string(),
        to_address: to.to_string(),
        from_chain: chain_from_address(from),
        to_chain: chain_from_address(to),
        amount,
        denom: "uosmo".to_string(),
        timestamp_millis: 0,
    }
}

pub fn address_stat(
    address: &str,
    sent_tx_count: u64,
    recv_tx_count: u64,
    pagerank: f64,
) -> AddressStat {
    AddressStat {
        address: address.to_string(),
        chain: chain_from_address(address),
        sent_tx_count,
        recv_tx_count,
        pagerank: Some(pagerank),
        ..Default::default()
    }
}

pub fn graph_node(
    id: &str,
    sent_tx_count: u64,
    recv_tx_count: u64,
    sent_tx_amount: f64,
) -> GraphNode {
    GraphNode {
        sent_tx_count,
        recv_tx_count,
        sent_tx_amount,
        ..GraphNode::new(id, "osmosis")
    }
}

pub fn edge(
    source: &str,
    target: &str,
    aggregated_value: f64,
) -> GraphEdge {
    GraphEdge {
        source: source.to_string(),
        target: target.to_string(),
        aggregated_value,
        tx_count: 1,
        cross_chain: false,
    }
}

pub fn snapshot_from(
    ids: &[&str],
    edges: Vec<GraphEdge>,
) -> GraphSnapshot {
    let nodes = ids.iter().map(|id| GraphNode::new(id, "osmosis")).collect();
    GraphSnapshot::new(nodes, edges, Vec::new())
}
