mod common;

use kashif::config::Config;
use kashif::engine::LoadRequest;
use kashif::engine::Orchestrator;
use kashif::engine::RankingWeights;
use kashif::error::EngineError;
use kashif::model::graph::FALLBACK_PAGERANK;
use kashif::model::AnalyticsResponse;
use kashif::model::Tier;
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_test::assert_err;
use tokio_test::assert_ok;

fn small_chunks() -> Config {
    let mut config = Config::default();
    config.ingest.chunk_threshold = 64;
    config.ingest.read_buffer_size = 32;
    config.ingest.batch_size = 2;
    config
}

#[test_log::test(tokio::test)]
async fn test_load_then_rank_from_files() {
    let transactions = common::csv_file(common::TRANSACTIONS_CSV);
    let addresses = common::csv_file(common::ADDRESSES_CSV);
    let orchestrator = Orchestrator::new(small_chunks());
    let mut progress = orchestrator.subscribe_progress();

    let report = assert_ok!(
        orchestrator
            .load(LoadRequest::new(transactions.path()).with_addresses(addresses.path()))
            .await
    );
    assert_eq!(report.transactions, 5);
    assert_eq!(report.address_stats, 3);
    // One short row plus one row without a sender
    assert_eq!(report.skipped_rows, 2);
    assert_eq!(report.nodes, 4);
    assert_eq!(report.edges, 3);

    assert!(orchestrator.is_loaded().await);
    assert_eq!(orchestrator.progress(), 100);
    assert_eq!(*progress.borrow_and_update(), 100);
    assert_eq!(orchestrator.cache().await.report, Some(report));

    let ranked = assert_ok!(orchestrator.rank(RankingWeights::new(1.0, 0.0, 0.0), 2).await);
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].node.id, "osmo1alice");
    assert_eq!(ranked[0].rank, 1);
    assert_eq!(ranked[1].rank, 2);

    let bob = orchestrator.address_detail("osmo1bob").await;
    assert_eq!(bob.sent_tx_count, 1);
    assert_eq!(bob.recv_tx_count, 4);
    assert_eq!(orchestrator.transactions_for("osmo1carol").await.len(), 1);

    let missing = orchestrator.address_detail("osmo1nobody").await;
    assert_eq!(missing.pagerank, FALLBACK_PAGERANK);
    assert_eq!(missing.tier, Tier::Bronze);
    assert_eq!(missing.tx_count(), 0);
}

#[test_log::test(tokio::test)]
async fn test_failed_load_keeps_previous_cache() {
    let transactions = common::csv_file(common::TRANSACTIONS_CSV);
    let orchestrator = Orchestrator::new(Config::default());
    assert_ok!(orchestrator.load(LoadRequest::new(transactions.path())).await);
    let before = orchestrator.snapshot().await;

    let err = assert_err!(orchestrator.load(LoadRequest::new("/no/such/transactions.csv")).await);
    assert!(matches!(err.downcast_ref::<EngineError>(), Some(EngineError::WorkerRejected(_))));

    assert!(orchestrator.is_loaded().await);
    assert_eq!(*orchestrator.snapshot().await, *before);
    assert_eq!(orchestrator.progress(), 100);

    // The replacement worker still serves ranking requests
    let ranked = assert_ok!(orchestrator.rank(RankingWeights::default(), 10).await);
    assert_eq!(ranked.len(), 4);
}

#[test_log::test(tokio::test)]
async fn test_failed_first_load_leaves_progress_at_zero() {
    let orchestrator = Orchestrator::new(Config::default());
    assert_err!(orchestrator.load(LoadRequest::new("/no/such/transactions.csv")).await);
    assert!(!orchestrator.is_loaded().await);
    assert_eq!(orchestrator.progress(), 0);
}

#[test_log::test(tokio::test)]
async fn test_newer_load_supersedes_older() {
    let first = common::csv_file(common::TRANSACTIONS_CSV);
    let second = common::csv_file("from,to,amount\nosmo1x,osmo1y,1\n");
    let orchestrator = Orchestrator::new(Config::default());

    let (older, newer) = futures::future::join(
        orchestrator.load(LoadRequest::new(first.path())),
        orchestrator.load(LoadRequest::new(second.path())),
    )
    .await;

    let err = assert_err!(older);
    assert!(matches!(err.downcast_ref::<EngineError>(), Some(EngineError::Superseded)));
    let report = assert_ok!(newer);
    assert_eq!(report.nodes, 2);

    let snapshot = orchestrator.snapshot().await;
    assert!(snapshot.node("osmo1x").is_some());
    assert!(snapshot.node("osmo1alice").is_none());
}

#[test_log::test(tokio::test)]
async fn test_reset_then_rank_is_empty() {
    let transactions = common::csv_file(common::TRANSACTIONS_CSV);
    let orchestrator = Orchestrator::new(Config::default());
    assert_ok!(orchestrator.load(LoadRequest::new(transactions.path())).await);

    orchestrator.reset().await;
    assert!(!orchestrator.is_loaded().await);
    assert_eq!(orchestrator.progress(), 0);
    let ranked = assert_ok!(orchestrator.rank(RankingWeights::default(), 5).await);
    assert!(ranked.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_load_normalized_remote_records() {
    let response: AnalyticsResponse = serde_json::from_value(json!({
        "top_nodes_json": [
            {"txhash": "r1", "from": "osmo1a", "to": "osmo1b", "value": 3, "timestamp": 1},
            {"txhash": "r2", "from": "osmo1b", "to": "osmo1c", "value": 2, "timestamp": 2}
        ],
        "top_nodes_derived_json": [
            {"id": "osmo1a", "sent_tx_count": 1, "hour_entropy": 0.5}
        ]
    }))
    .unwrap();
    let normalized = response.normalize();

    let orchestrator = Orchestrator::new(Config::default());
    let report = assert_ok!(
        orchestrator
            .load_records(normalized.transactions, normalized.address_stats)
            .await
    );
    assert_eq!(report.nodes, 3);
    assert_eq!(report.edges, 2);

    let ranked = assert_ok!(orchestrator.rank(RankingWeights::new(1.0, 0.0, 0.0), 0).await);
    assert!(ranked.is_empty());
    let ranked = assert_ok!(orchestrator.rank(RankingWeights::new(0.0, 1.0, 0.0), 1).await);
    assert_eq!(ranked[0].node.id, "osmo1a");
}
