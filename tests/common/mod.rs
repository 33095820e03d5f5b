#![allow(dead_code)]

use std::io::Write;

use kashif::model::GraphEdge;
use kashif::model::GraphNode;
use kashif::model::GraphSnapshot;
use kashif::model::Transaction;
use tempfile::NamedTempFile;

pub const TRANSACTIONS_CSV: &str = "\
txhash,from,to,amount,denom,timestamp
h1,osmo1alice,osmo1bob,10,uosmo,2024-01-01T00:00:00Z
h2,osmo1alice,osmo1bob,20,uosmo,2024-01-02T00:00:00Z
h3,osmo1alice,osmo1bob,30,uosmo,2024-01-03T00:00:00Z
h4,osmo1carol,osmo1bob,5,uosmo,2024-01-04T00:00:00Z
h5,osmo1bob,cosmos1dave,7,uatom,2024-01-05T00:00:00Z
h6,osmo1carol
h7,,osmo1bob,1,uosmo,2024-01-06T00:00:00Z
";

pub const ADDRESSES_CSV: &str = "\
address,sent_tx_count,recv_tx_count,total_sent,total_received,hour_entropy,active_days_count
osmo1alice,3,0,60,0,0.0,3
osmo1bob,1,4,7,65,4.584962500721156,5
osmo1carol,1,0,5,0,2.0,1
";

pub fn csv_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}

pub fn transaction(
    from: &str,
    to: &str,
    amount: f64,
) -> Transaction {
    Transaction {
        tx_hash: format!("{}-{}-{}", from, to, amount),
        from_address: from.to_string(),
        to_address: to.to_string(),
        from_chain: "osmosis".to_string(),
        to_chain: "osmosis".to_string(),
        amount,
        denom: "uosmo".to_string(),
        timestamp_millis: 0,
    }
}

pub fn snapshot(
    node_count: usize,
    links: &[(usize, usize, f64)],
) -> GraphSnapshot {
    let nodes = (0..node_count).map(|i| GraphNode::new(&format!("n{}", i), "osmosis")).collect();
    let edges = links
        .iter()
        .map(|&(source, target, value)| GraphEdge {
            source: format!("n{}", source),
            target: format!("n{}", target),
            aggregated_value: value,
            tx_count: 1,
            cross_chain: false,
        })
        .collect();
    GraphSnapshot::new(nodes, edges, Vec::new())
}
