use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

use crate::error::StructuralError;
use crate::model::address::AddressStat;
use crate::model::tier::Tier;
use crate::model::transaction::Transaction;
use crate::utils::chain_from_address;
use crate::utils::shorten_address;

/// Pagerank given to an address the snapshot knows nothing about.
pub const FALLBACK_PAGERANK: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphNode {
    #[serde(alias = "address")]
    pub id: String,
    pub name: String,
    pub chain: String,
    pub sent_tx_count: u64,
    pub recv_tx_count: u64,
    pub sent_tx_amount: f64,
    pub recv_tx_amount: f64,
    pub hour_entropy: Option<f64>,
    pub active_days_count: u64,
    pub counterparty_count_sent: u64,
    pub counterparty_count_recv: u64,
    pub pagerank: f64,
    pub tier: Tier,
}

impl Default for GraphNode {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            chain: "unknown".to_string(),
            sent_tx_count: 0,
            recv_tx_count: 0,
            sent_tx_amount: 0.0,
            recv_tx_amount: 0.0,
            hour_entropy: None,
            active_days_count: 0,
            counterparty_count_sent: 0,
            counterparty_count_recv: 0,
            pagerank: 0.0,
            tier: Tier::Bronze,
        }
    }
}

impl GraphNode {
    /// Node known only from transactions: stats default to zero.
    pub fn new(
        address: &str,
        chain: &str,
    ) -> Self {
        let chain = if chain.trim().is_empty() { "unknown" } else { chain };
        Self {
            id: address.to_string(),
            name: shorten_address(address, 6, 4),
            chain: chain.to_string(),
            ..Default::default()
        }
    }

    pub fn from_stat(stat: &AddressStat) -> Self {
        let mut node = Self::new(&stat.address, &stat.chain);
        node.apply_stat(stat);
        node
    }

    /// Record returned when a detail lookup misses.
    pub fn fallback(address: &str) -> Self {
        let mut node = Self::new(address, &chain_from_address(address));
        node.pagerank = FALLBACK_PAGERANK;
        node.tier = Tier::Bronze;
        node
    }

    /// Overwrites every stat-derived field. Address stats are authoritative.
    pub fn apply_stat(
        &mut self,
        stat: &AddressStat,
    ) {
        if !stat.chain.trim().is_empty() {
            self.chain = stat.chain.clone();
        }
        self.sent_tx_count = stat.sent_tx_count;
        self.recv_tx_count = stat.recv_tx_count;
        self.sent_tx_amount = stat.sent_tx_amount;
        self.recv_tx_amount = stat.recv_tx_amount;
        self.hour_entropy = stat.hour_entropy;
        self.active_days_count = stat.active_days_count;
        self.counterparty_count_sent = stat.counterparty_count_sent;
        self.counterparty_count_recv = stat.counterparty_count_recv;
        self.pagerank = stat.pagerank.unwrap_or(0.0);
        self.tier = stat.tier.unwrap_or_else(|| Tier::from_pagerank(self.pagerank));
    }

    pub fn set_pagerank(
        &mut self,
        pagerank: f64,
    ) {
        self.pagerank = pagerank;
        self.tier = Tier::from_pagerank(pagerank);
    }

    pub fn tx_count(&self) -> u64 { self.sent_tx_count + self.recv_tx_count }

    pub fn tx_amount(&self) -> f64 { self.sent_tx_amount + self.recv_tx_amount }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(default, alias = "value")]
    pub aggregated_value: f64,
    #[serde(default, alias = "count")]
    pub tx_count: u64,
    #[serde(default, alias = "isCrossChain")]
    pub cross_chain: bool,
}

impl GraphEdge {
    pub fn from_transaction(tx: &Transaction) -> Self {
        Self {
            source: tx.from_address.clone(),
            target: tx.to_address.clone(),
            aggregated_value: tx.amount,
            tx_count: 1,
            cross_chain: tx.is_cross_chain(),
        }
    }

    // cross_chain stays as decided by the defining transaction
    pub fn absorb(
        &mut self,
        tx: &Transaction,
    ) {
        self.aggregated_value += tx.amount;
        self.tx_count += 1;
    }
}

/// Immutable {nodes, edges} view of one aggregation cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    #[serde(skip)]
    transactions: Vec<Transaction>,
    #[serde(skip)]
    node_indices: HashMap<String, usize>,
}

impl GraphSnapshot {
    pub fn new(
        nodes: Vec<GraphNode>,
        edges: Vec<GraphEdge>,
        transactions: Vec<Transaction>,
    ) -> Self {
        let mut snapshot = Self {
            nodes,
            edges,
            transactions,
            node_indices: HashMap::new(),
        };
        snapshot.rebuild_indices();
        snapshot
    }

    // Rebuild the id lookup (needed after deserialization)
    pub fn rebuild_indices(&mut self) {
        self.node_indices.clear();
        for (index, node) in self.nodes.iter().enumerate() {
            self.node_indices.entry(node.id.clone()).or_insert(index);
        }
    }

    pub fn nodes(&self) -> &[GraphNode] { &self.nodes }

    pub fn edges(&self) -> &[GraphEdge] { &self.edges }

    pub fn node_count(&self) -> usize { self.nodes.len() }

    pub fn edge_count(&self) -> usize { self.edges.len() }

    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    pub fn position(
        &self,
        id: &str,
    ) -> Option<usize> {
        self.node_indices.get(id).copied()
    }

    pub fn node(
        &self,
        id: &str,
    ) -> Option<&GraphNode> {
        self.position(id).map(|i| &self.nodes[i])
    }

    /// Node stats for an address, or the fallback record when it is unknown.
    pub fn address_detail(
        &self,
        address: &str,
    ) -> GraphNode {
        self.node(address).cloned().unwrap_or_else(|| GraphNode::fallback(address))
    }

    /// Transactions touching an address, newest first.
    pub fn transactions_for(
        &self,
        address: &str,
    ) -> Vec<Transaction> {
        let mut related: Vec<Transaction> = self.transactions.iter().filter(|tx| tx.touches(address)).cloned().collect();
        related.sort_by(|a, b| b.timestamp_millis.cmp(&a.timestamp_millis));
        related
    }

    pub fn transaction_count(&self) -> usize { self.transactions.len() }

    /// Same graph with pageranks replaced by `nodes` (matched by id) and tiers re-derived.
    pub fn with_ranked_nodes(
        &self,
        ranked: Vec<GraphNode>,
    ) -> Self {
        let scores: HashMap<String, f64> = ranked.into_iter().map(|n| (n.id, n.pagerank)).collect();
        let nodes = self
            .nodes
            .iter()
            .cloned()
            .map(|mut node| {
                if let Some(&pagerank) = scores.get(&node.id) {
                    node.set_pagerank(pagerank);
                }
                node
            })
            .collect();
        Self::new(nodes, self.edges.clone(), self.transactions.clone())
    }

    pub fn into_parts(self) -> (Vec<GraphNode>, Vec<GraphEdge>) { (self.nodes, self.edges) }
}

/// Loosely-shaped graph as received over the worker protocol.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphPayload {
    pub nodes: Option<Vec<GraphNode>>,
    #[serde(alias = "links")]
    pub edges: Option<Vec<GraphEdge>>,
}

impl TryFrom<GraphPayload> for GraphSnapshot {
    type Error = StructuralError;

    fn try_from(payload: GraphPayload) -> Result<Self, Self::Error> {
        let nodes = payload.nodes.ok_or(StructuralError::MissingContainer("nodes"))?;
        let edges = payload.edges.ok_or(StructuralError::MissingContainer("edges"))?;
        Ok(GraphSnapshot::new(nodes, edges, Vec::new()))
    }
}

impl From<&GraphSnapshot> for GraphPayload {
    fn from(snapshot: &GraphSnapshot) -> Self {
        Self {
            nodes: Some(snapshot.nodes.clone()),
            edges: Some(snapshot.edges.clone()),
        }
    }
}

/// Node with its ranking score and 1-based position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedNode {
    #[serde(flatten)]
    pub node: GraphNode,
    pub score: f64,
    pub rank: usize,
}
