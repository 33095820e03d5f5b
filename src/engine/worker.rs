use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::config::Config;
use crate::engine::pagerank::calculate_pagerank;
use crate::engine::ranking::select_top_k;
use crate::engine::ranking::RankingWeights;
use crate::error::EngineError;
use crate::error::StreamError;
use crate::model::graph::GraphNode;
use crate::model::graph::GraphPayload;
use crate::model::graph::RankedNode;
use crate::model::record::Record;
use crate::model::transaction::FileType;
use crate::pipeline::decoder::DecoderConfig;
use crate::pipeline::ingestor::ChunkedIngestor;
use crate::pipeline::ingestor::IngestEvent;
use crate::pipeline::ingestor::IngestSummary;

const DEFAULT_TOP_K: i64 = 10;

fn default_top_k() -> i64 { DEFAULT_TOP_K }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub file_path: PathBuf,
    pub file_type: FileType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkerRequest {
    #[serde(rename = "parseCSV", rename_all = "camelCase")]
    ParseCsv {
        file_info: FileInfo,
        // Overrides the configured chunk threshold, in bytes
        #[serde(default)]
        chunk_size: Option<usize>,
        #[serde(default)]
        config: DecoderConfig,
    },
    #[serde(rename = "calculatePageRank", rename_all = "camelCase")]
    CalculatePageRank {
        graph: GraphPayload,
        #[serde(default)]
        damping_factor: Option<f64>,
        #[serde(default)]
        iterations: Option<usize>,
    },
    #[serde(rename = "selectTopKNodes", rename_all = "camelCase")]
    SelectTopKNodes {
        nodes: Vec<GraphNode>,
        batch_weight: f64,
        tx_count_weight: f64,
        tx_amount_weight: f64,
        #[serde(default = "default_top_k")]
        k: i64,
    },
}

impl WorkerRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerRequest::ParseCsv { .. } => "parseCSV",
            WorkerRequest::CalculatePageRank { .. } => "calculatePageRank",
            WorkerRequest::SelectTopKNodes { .. } => "selectTopKNodes",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum WorkerResponse {
    #[serde(rename = "progress", rename_all = "camelCase")]
    Progress {
        processed_bytes: u64,
        total_bytes: Option<u64>,
    },
    #[serde(rename = "data", rename_all = "camelCase")]
    Data {
        data: Vec<Record>,
        file_type: FileType,
    },
    #[serde(rename = "complete", rename_all = "camelCase")]
    Complete {
        data: Vec<Record>,
        file_type: FileType,
        summary: IngestSummary,
    },
    #[serde(rename = "pageRankComplete")]
    PageRankComplete { data: Vec<GraphNode> },
    #[serde(rename = "topKNodesComplete")]
    TopKNodesComplete { data: Vec<RankedNode> },
    #[serde(rename = "error")]
    Error { error: String },
}

impl WorkerResponse {
    pub fn is_terminal(&self) -> bool { !matches!(self, WorkerResponse::Progress { .. } | WorkerResponse::Data { .. }) }
}

type Envelope = (WorkerRequest, mpsc::Sender<WorkerResponse>);

/// Handle to a worker task. Dropping the handle terminates the worker.
#[derive(Debug)]
pub struct WorkerHandle {
    requests: mpsc::Sender<Envelope>,
    cancellation_token: CancellationToken,
    reply_capacity: usize,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    pub fn spawn(config: Arc<Config>) -> Self {
        let capacity = config.ingest.channel_capacity.max(1);
        let (requests, receiver) = mpsc::channel(capacity);
        let cancellation_token = CancellationToken::new();
        let task = tokio::spawn(run_worker(config, receiver, cancellation_token.clone()));
        debug!("worker::spawned");

        Self {
            requests,
            cancellation_token,
            reply_capacity: capacity,
            task,
        }
    }

    /// Sends a request; the receiver yields zero or more non-terminal responses followed by
    /// exactly one terminal response. A closed receiver without a terminal response means
    /// the worker was terminated.
    pub async fn request(
        &self,
        request: WorkerRequest,
    ) -> Result<mpsc::Receiver<WorkerResponse>, EngineError> {
        if self.is_terminated() {
            return Err(EngineError::WorkerTerminated);
        }
        let (reply, responses) = mpsc::channel(self.reply_capacity);
        self.requests
            .send((request, reply))
            .await
            .map_err(|_| EngineError::WorkerTerminated)?;
        Ok(responses)
    }

    /// Sends a request and waits for its terminal response, discarding the rest.
    pub async fn request_terminal(
        &self,
        request: WorkerRequest,
    ) -> Result<WorkerResponse, EngineError> {
        let mut responses = self.request(request).await?;
        while let Some(response) = responses.recv().await {
            if response.is_terminal() {
                return Ok(response);
            }
        }
        Err(EngineError::WorkerTerminated)
    }

    pub fn is_terminated(&self) -> bool { self.cancellation_token.is_cancelled() }

    /// Stops the worker. In-flight results are discarded.
    pub fn terminate(&self) {
        if !self.cancellation_token.is_cancelled() {
            debug!("worker::terminated");
        }
        self.cancellation_token.cancel();
        self.task.abort();
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) { self.terminate(); }
}

async fn run_worker(
    config: Arc<Config>,
    mut requests: mpsc::Receiver<Envelope>,
    cancellation_token: CancellationToken,
) {
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => break,
            envelope = requests.recv() => match envelope {
                Some((request, reply)) => {
                    debug!("worker::request_received::type::{}", request.kind());
                    in_flight.spawn(handle_request(config.clone(), request, reply, cancellation_token.child_token()));
                },
                None => {
                    while in_flight.join_next().await.is_some() {}
                    break;
                },
            },
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    if e.is_panic() {
                        error!("worker::handler_panicked::error::{}", e);
                    }
                }
            },
        }
    }

    in_flight.abort_all();
    debug!("worker::stopped");
}

async fn handle_request(
    config: Arc<Config>,
    request: WorkerRequest,
    reply: mpsc::Sender<WorkerResponse>,
    cancellation_token: CancellationToken,
) {
    let kind = request.kind();
    let response = match request {
        WorkerRequest::ParseCsv { file_info, chunk_size, config: decoder_config } => {
            parse_file(&config, file_info, chunk_size, decoder_config, &reply, cancellation_token).await;
            return;
        },
        WorkerRequest::CalculatePageRank { graph, damping_factor, iterations } => {
            let damping_factor = damping_factor.or(Some(config.pagerank.damping_factor));
            let iterations = iterations.or(Some(config.pagerank.iterations));
            match tokio::task::spawn_blocking(move || calculate_pagerank(graph, damping_factor, iterations)).await {
                Ok(Ok(data)) => WorkerResponse::PageRankComplete { data },
                Ok(Err(e)) => WorkerResponse::Error { error: e.to_string() },
                Err(e) => WorkerResponse::Error { error: e.to_string() },
            }
        },
        WorkerRequest::SelectTopKNodes { nodes, batch_weight, tx_count_weight, tx_amount_weight, k } => {
            let weights = RankingWeights::new(batch_weight, tx_count_weight, tx_amount_weight);
            match tokio::task::spawn_blocking(move || select_top_k(&nodes, &weights, k)).await {
                Ok(data) => WorkerResponse::TopKNodesComplete { data },
                Err(e) => WorkerResponse::Error { error: e.to_string() },
            }
        },
    };

    if let WorkerResponse::Error { error } = &response {
        warn!("worker::request_failed::type::{}::error::{}", kind, error);
    }
    if reply.send(response).await.is_err() {
        debug!("worker::reply_dropped::type::{}", kind);
    }
}

async fn parse_file(
    config: &Config,
    file_info: FileInfo,
    chunk_size: Option<usize>,
    decoder_config: DecoderConfig,
    reply: &mpsc::Sender<WorkerResponse>,
    cancellation_token: CancellationToken,
) {
    let FileInfo { file_path, file_type } = file_info;

    let file = match tokio::fs::File::open(&file_path).await {
        Ok(file) => file,
        Err(source) => {
            let err = StreamError::OpenError {
                path: file_path.display().to_string(),
                source,
            };
            error!("worker::open_failed::error::{}", err);
            let _ = reply.send(WorkerResponse::Error { error: err.to_string() }).await;
            return;
        },
    };
    let total_bytes = file.metadata().await.ok().map(|metadata| metadata.len());
    info!(
        "worker::parse_started::file::{}::type::{}::bytes::{:?}",
        file_path.display(),
        file_type.as_str(),
        total_bytes
    );

    let mut ingestor = ChunkedIngestor::new(config.ingest.clone(), decoder_config);
    if let Some(chunk_size) = chunk_size {
        ingestor = ingestor.with_chunk_threshold(chunk_size);
    }
    let (mut events, handle) = ingestor.spawn(file, total_bytes, cancellation_token.clone());

    while let Some(event) = events.recv().await {
        let response = match event {
            IngestEvent::Progress { processed_bytes, total_bytes } => WorkerResponse::Progress {
                processed_bytes,
                total_bytes,
            },
            IngestEvent::Data { records } => WorkerResponse::Data { data: records, file_type },
            IngestEvent::Complete { records, summary } => WorkerResponse::Complete {
                data: records,
                file_type,
                summary,
            },
            IngestEvent::Error { error } => WorkerResponse::Error { error },
        };
        if reply.send(response).await.is_err() {
            // Nobody is listening; stop reading the file
            cancellation_token.cancel();
            break;
        }
    }

    match handle.await {
        Ok(Ok(summary)) => debug!(
            "worker::parse_finished::file::{}::decoded::{}::skipped::{}",
            file_path.display(),
            summary.decoded,
            summary.skipped
        ),
        Ok(Err(e)) => debug!("worker::parse_stopped::file::{}::error::{}", file_path.display(), e),
        Err(e) => error!("worker::ingestor_join_failed::error::{}", e),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::error::StructuralError;

    #[test]
    fn test_request_wire_format() {
        let request: WorkerRequest = serde_json::from_value(json!({
            "type": "parseCSV",
            "fileInfo": {"filePath": "/tmp/tx.csv", "fileType": "transactions"},
            "chunkSize": 2048,
            "config": {"delimiter": ";", "requiredFields": ["txhash"]}
        }))
        .unwrap();
        match request {
            WorkerRequest::ParseCsv { file_info, chunk_size, config } => {
                assert_eq!(file_info.file_type, FileType::Transactions);
                assert_eq!(chunk_size, Some(2048));
                assert_eq!(config.delimiter, ';');
                assert_eq!(config.required_fields, vec!["txhash".to_string()]);
            },
            other => panic!("unexpected request {:?}", other),
        }

        let request: WorkerRequest = serde_json::from_value(json!({
            "type": "selectTopKNodes",
            "nodes": [],
            "batchWeight": 1.0,
            "txCountWeight": 0.0,
            "txAmountWeight": 0.0
        }))
        .unwrap();
        assert!(matches!(request, WorkerRequest::SelectTopKNodes { k: DEFAULT_TOP_K, .. }));
    }

    #[test]
    fn test_response_wire_format() {
        let progress = serde_json::to_value(WorkerResponse::Progress {
            processed_bytes: 10,
            total_bytes: Some(20),
        })
        .unwrap();
        assert_eq!(progress, json!({"type": "progress", "processedBytes": 10, "totalBytes": 20}));

        let error = serde_json::to_value(WorkerResponse::Error { error: "boom".to_string() }).unwrap();
        assert_eq!(error, json!({"type": "error", "error": "boom"}));

        assert!(!WorkerResponse::Progress { processed_bytes: 0, total_bytes: None }.is_terminal());
        assert!(WorkerResponse::TopKNodesComplete { data: Vec::new() }.is_terminal());
    }

    #[tokio::test]
    async fn test_parse_csv_streams_then_completes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "txhash,from,to,amount").unwrap();
        for i in 0..5 {
            writeln!(file, "h{},osmo1a,osmo1b,{}", i, i).unwrap();
        }

        let mut config = Config::default();
        config.ingest.batch_size = 2;
        config.ingest.chunk_threshold = 8;
        let worker = WorkerHandle::spawn(Arc::new(config));

        let mut responses = worker
            .request(WorkerRequest::ParseCsv {
                file_info: FileInfo {
                    file_path: file.path().to_path_buf(),
                    file_type: FileType::Transactions,
                },
                chunk_size: None,
                config: DecoderConfig::default(),
            })
            .await
            .unwrap();

        let mut records = 0;
        let mut terminal = 0;
        let mut saw_progress = false;
        while let Some(response) = responses.recv().await {
            match response {
                WorkerResponse::Progress { .. } => saw_progress = true,
                WorkerResponse::Data { data, file_type } => {
                    assert_eq!(file_type, FileType::Transactions);
                    records += data.len();
                },
                WorkerResponse::Complete { data, summary, .. } => {
                    records += data.len();
                    terminal += 1;
                    assert_eq!(summary.decoded, 5);
                },
                other => panic!("unexpected response {:?}", other),
            }
        }
        assert!(saw_progress);
        assert_eq!(records, 5);
        assert_eq!(terminal, 1);
    }

    #[tokio::test]
    async fn test_missing_file_reports_error() {
        let worker = WorkerHandle::spawn(Arc::new(Config::default()));
        let response = worker
            .request_terminal(WorkerRequest::ParseCsv {
                file_info: FileInfo {
                    file_path: PathBuf::from("/definitely/not/here.csv"),
                    file_type: FileType::Addresses,
                },
                chunk_size: None,
                config: DecoderConfig::default(),
            })
            .await
            .unwrap();
        match response {
            WorkerResponse::Error { error } => assert!(error.contains("/definitely/not/here.csv")),
            other => panic!("unexpected response {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_pagerank_request_rejects_bad_graph() {
        let worker = WorkerHandle::spawn(Arc::new(Config::default()));
        let response = worker
            .request_terminal(WorkerRequest::CalculatePageRank {
                graph: GraphPayload {
                    nodes: Some(Vec::new()),
                    edges: None,
                },
                damping_factor: None,
                iterations: None,
            })
            .await
            .unwrap();
        match response {
            WorkerResponse::Error { error } => {
                assert_eq!(error, StructuralError::MissingContainer("edges").to_string())
            },
            other => panic!("unexpected response {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_terminated_worker_refuses_requests() {
        let worker = WorkerHandle::spawn(Arc::new(Config::default()));
        worker.terminate();
        let result = worker
            .request(WorkerRequest::SelectTopKNodes {
                nodes: Vec::new(),
                batch_weight: 1.0,
                tx_count_weight: 1.0,
                tx_amount_weight: 1.0,
                k: 3,
            })
            .await;
        assert!(matches!(result, Err(EngineError::WorkerTerminated)));
    }
}
