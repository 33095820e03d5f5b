use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tokio::sync::Mutex;
use tokio::sync::RwLock;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::Config;
use crate::engine::ranking::RankingWeights;
use crate::engine::worker::FileInfo;
use crate::engine::worker::WorkerHandle;
use crate::engine::worker::WorkerRequest;
use crate::engine::worker::WorkerResponse;
use crate::err_with_loc;
use crate::error::EngineError;
use crate::model::address::AddressStat;
use crate::model::graph::GraphNode;
use crate::model::graph::GraphPayload;
use crate::model::graph::GraphSnapshot;
use crate::model::graph::RankedNode;
use crate::model::record::Record;
use crate::model::transaction::FileType;
use crate::model::transaction::Transaction;
use crate::pipeline::aggregator::GraphAggregator;
use crate::pipeline::decoder::DecoderConfig;
use crate::Result;

/// Files making up one analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub transactions: PathBuf,
    pub addresses: Option<PathBuf>,
    pub decoder: DecoderConfig,
    pub chunk_size: Option<usize>,
}

impl LoadRequest {
    pub fn new(transactions: impl Into<PathBuf>) -> Self {
        Self {
            transactions: transactions.into(),
            addresses: None,
            decoder: DecoderConfig::default(),
            chunk_size: None,
        }
    }

    pub fn with_addresses(
        mut self,
        addresses: impl Into<PathBuf>,
    ) -> Self {
        self.addresses = Some(addresses.into());
        self
    }

    pub fn with_decoder(
        mut self,
        decoder: DecoderConfig,
    ) -> Self {
        self.decoder = decoder;
        self
    }

    fn files(&self) -> Vec<FileInfo> {
        let mut files = vec![FileInfo {
            file_path: self.transactions.clone(),
            file_type: FileType::Transactions,
        }];
        if let Some(addresses) = &self.addresses {
            files.push(FileInfo {
                file_path: addresses.clone(),
                file_type: FileType::Addresses,
            });
        }
        files
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub transactions: usize,
    pub address_stats: usize,
    // Rows dropped by the decoder plus records that could not be typed
    pub skipped_rows: usize,
    pub nodes: usize,
    pub edges: usize,
}

/// The one piece of shared state: replaced as a whole, never patched.
#[derive(Debug, Clone, Default)]
pub struct AnalysisCache {
    pub snapshot: Arc<GraphSnapshot>,
    pub loaded: bool,
    pub report: Option<LoadReport>,
}

/// Sequences ingest, aggregate, PageRank and ranking, and owns the analysis cache.
///
/// Each `load` bumps a generation counter and replaces the worker. A load only commits
/// when its generation is still current, so a superseded load can never overwrite the
/// cache of a newer one. A failed load puts progress back to what the committed cache
/// implies. The worker is spawned on first use, so construction needs no runtime.
#[derive(Debug)]
pub struct Orchestrator {
    config: Arc<Config>,
    cache: RwLock<Arc<AnalysisCache>>,
    worker: Mutex<Option<Arc<WorkerHandle>>>,
    generation: AtomicU64,
    progress: watch::Sender<u8>,
}

impl Orchestrator {
    pub fn new(config: Config) -> Self {
        let (progress, _) = watch::channel(0);
        Self {
            config: Arc::new(config),
            cache: RwLock::new(Arc::new(AnalysisCache::default())),
            worker: Mutex::new(None),
            generation: AtomicU64::new(0),
            progress,
        }
    }

    pub fn config(&self) -> &Config { &self.config }

    /// Ingests the request's files and swaps in a freshly ranked snapshot.
    /// On failure the previous cache stays in place.
    pub async fn load(
        &self,
        request: LoadRequest,
    ) -> Result<LoadReport> {
        let generation = self.begin_generation();
        let worker = self.replace_worker().await;
        self.progress.send_replace(0);
        let result = self.load_files(generation, &worker, request).await;
        self.settle(generation, result).await
    }

    async fn load_files(
        &self,
        generation: u64,
        worker: &WorkerHandle,
        request: LoadRequest,
    ) -> Result<LoadReport> {
        info!("orchestrator::load_started::generation::{}::file::{}", generation, request.transactions.display());

        let files = request.files();
        let file_count = files.len();
        let mut transactions = Vec::new();
        let mut address_stats = Vec::new();
        let mut skipped_rows = 0;

        for (file_index, file_info) in files.into_iter().enumerate() {
            let file_type = file_info.file_type;
            let (records, skipped) = self
                .parse_file(worker, generation, file_info, &request, file_index, file_count)
                .await?;
            skipped_rows += skipped;

            match file_type {
                FileType::Transactions => skipped_rows += type_records(&records, &mut transactions),
                FileType::Addresses => skipped_rows += type_records(&records, &mut address_stats),
            }
        }

        self.build_and_commit(generation, worker, transactions, address_stats, skipped_rows)
            .await
    }

    /// Same aggregate, PageRank and swap path for records that are already typed.
    pub async fn load_records(
        &self,
        transactions: Vec<Transaction>,
        address_stats: Vec<AddressStat>,
    ) -> Result<LoadReport> {
        let generation = self.begin_generation();
        let worker = self.replace_worker().await;
        self.progress.send_replace(0);
        let result = self
            .build_and_commit(generation, &worker, transactions, address_stats, 0)
            .await;
        self.settle(generation, result).await
    }

    /// Top-K over the current snapshot. Yields once before doing any work.
    pub async fn rank(
        &self,
        weights: RankingWeights,
        k: i64,
    ) -> Result<Vec<RankedNode>> {
        tokio::task::yield_now().await;

        let snapshot = self.snapshot().await;
        if snapshot.is_empty() || k <= 0 {
            return Ok(Vec::new());
        }

        let worker = self.current_worker().await;
        let response = worker
            .request_terminal(WorkerRequest::SelectTopKNodes {
                nodes: snapshot.nodes().to_vec(),
                batch_weight: weights.regularity_weight,
                tx_count_weight: weights.tx_count_weight,
                tx_amount_weight: weights.tx_amount_weight,
                k,
            })
            .await?;

        match response {
            WorkerResponse::TopKNodesComplete { data } => Ok(data),
            WorkerResponse::Error { error } => Err(EngineError::WorkerRejected(error).into()),
            other => Err(err_with_loc!(EngineError::UnexpectedResponse(format!("{:?}", other)))),
        }
    }

    pub async fn cache(&self) -> Arc<AnalysisCache> { self.cache.read().await.clone() }

    pub async fn snapshot(&self) -> Arc<GraphSnapshot> { self.cache.read().await.snapshot.clone() }

    pub async fn is_loaded(&self) -> bool { self.cache.read().await.loaded }

    pub async fn address_detail(
        &self,
        address: &str,
    ) -> GraphNode {
        self.snapshot().await.address_detail(address)
    }

    pub async fn transactions_for(
        &self,
        address: &str,
    ) -> Vec<Transaction> {
        self.snapshot().await.transactions_for(address)
    }

    /// Ingestion progress in percent.
    pub fn progress(&self) -> u8 { *self.progress.borrow() }

    pub fn subscribe_progress(&self) -> watch::Receiver<u8> { self.progress.subscribe() }

    /// Drops the cache and any in-flight load.
    pub async fn reset(&self) {
        let generation = self.begin_generation();
        self.replace_worker().await;
        *self.cache.write().await = Arc::new(AnalysisCache::default());
        self.progress.send_replace(0);
        info!("orchestrator::reset::generation::{}", generation);
    }

    pub async fn shutdown(&self) {
        self.begin_generation();
        if let Some(worker) = self.worker.lock().await.take() {
            worker.terminate();
        }
        debug!("orchestrator::shutdown");
    }

    /// Restores progress from the committed cache when the current load fails.
    /// A superseded load leaves progress to the load that replaced it.
    async fn settle(
        &self,
        generation: u64,
        result: Result<LoadReport>,
    ) -> Result<LoadReport> {
        if result.is_err() {
            let cache = self.cache.read().await;
            if self.is_current(generation) {
                self.progress.send_replace(if cache.loaded { 100 } else { 0 });
            }
        }
        result
    }

    fn begin_generation(&self) -> u64 { self.generation.fetch_add(1, Ordering::SeqCst) + 1 }

    fn is_current(
        &self,
        generation: u64,
    ) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Error for a response stream that ended without a terminal message.
    fn closed_error(
        &self,
        generation: u64,
    ) -> EngineError {
        if self.is_current(generation) { EngineError::WorkerTerminated } else { EngineError::Superseded }
    }

    async fn current_worker(&self) -> Arc<WorkerHandle> {
        self.worker
            .lock()
            .await
            .get_or_insert_with(|| Arc::new(WorkerHandle::spawn(self.config.clone())))
            .clone()
    }

    async fn replace_worker(&self) -> Arc<WorkerHandle> {
        let mut worker = self.worker.lock().await;
        if let Some(previous) = worker.take() {
            previous.terminate();
        }
        worker.insert(Arc::new(WorkerHandle::spawn(self.config.clone()))).clone()
    }

    async fn parse_file(
        &self,
        worker: &WorkerHandle,
        generation: u64,
        file_info: FileInfo,
        request: &LoadRequest,
        file_index: usize,
        file_count: usize,
    ) -> Result<(Vec<Record>, usize)> {
        let path = file_info.file_path.display().to_string();
        let mut responses = worker
            .request(WorkerRequest::ParseCsv {
                file_info,
                chunk_size: request.chunk_size,
                config: request.decoder.clone(),
            })
            .await
            .map_err(|_| self.closed_error(generation))?;

        let mut records = Vec::new();
        while let Some(response) = responses.recv().await {
            match response {
                WorkerResponse::Progress { processed_bytes, total_bytes } => {
                    if let Some(total) = total_bytes.filter(|total| *total > 0) {
                        let fraction = (processed_bytes as f64 / total as f64).min(1.0);
                        let percent = ((file_index as f64 + fraction) / file_count as f64 * 100.0).floor() as u8;
                        if self.is_current(generation) {
                            self.progress.send_replace(percent.min(100));
                        }
                    }
                },
                WorkerResponse::Data { data, .. } => records.extend(data),
                WorkerResponse::Complete { data, summary, .. } => {
                    records.extend(data);
                    debug!(
                        "orchestrator::file_parsed::file::{}::decoded::{}::skipped::{}",
                        path, summary.decoded, summary.skipped
                    );
                    return Ok((records, summary.skipped));
                },
                WorkerResponse::Error { error } => {
                    warn!("orchestrator::load_failed::file::{}::error::{}", path, error);
                    return Err(EngineError::WorkerRejected(error).into());
                },
                other => return Err(err_with_loc!(EngineError::UnexpectedResponse(format!("{:?}", other)))),
            }
        }

        Err(self.closed_error(generation).into())
    }

    async fn build_and_commit(
        &self,
        generation: u64,
        worker: &WorkerHandle,
        transactions: Vec<Transaction>,
        address_stats: Vec<AddressStat>,
        skipped_rows: usize,
    ) -> Result<LoadReport> {
        let transaction_count = transactions.len();
        let address_stat_count = address_stats.len();

        let snapshot = tokio::task::spawn_blocking(move || {
            let mut aggregator = GraphAggregator::new();
            aggregator.add_transactions(transactions);
            aggregator.add_address_stats(&address_stats);
            aggregator.finish()
        })
        .await
        .map_err(|e| err_with_loc!(format!("aggregation task failed: {}", e)))?;

        let response = worker
            .request_terminal(WorkerRequest::CalculatePageRank {
                graph: GraphPayload::from(&snapshot),
                damping_factor: Some(self.config.pagerank.damping_factor),
                iterations: Some(self.config.pagerank.iterations),
            })
            .await
            .map_err(|_| self.closed_error(generation))?;

        let ranked = match response {
            WorkerResponse::PageRankComplete { data } => data,
            WorkerResponse::Error { error } => return Err(EngineError::WorkerRejected(error).into()),
            other => return Err(err_with_loc!(EngineError::UnexpectedResponse(format!("{:?}", other)))),
        };
        let snapshot = snapshot.with_ranked_nodes(ranked);

        let report = LoadReport {
            transactions: transaction_count,
            address_stats: address_stat_count,
            skipped_rows,
            nodes: snapshot.node_count(),
            edges: snapshot.edge_count(),
        };

        let mut cache = self.cache.write().await;
        if !self.is_current(generation) {
            debug!("orchestrator::load_superseded::generation::{}", generation);
            return Err(EngineError::Superseded.into());
        }
        *cache = Arc::new(AnalysisCache {
            snapshot: Arc::new(snapshot),
            loaded: true,
            report: Some(report.clone()),
        });
        drop(cache);
        self.progress.send_replace(100);

        info!(
            "orchestrator::load_committed::generation::{}::nodes::{}::edges::{}::skipped::{}",
            generation, report.nodes, report.edges, report.skipped_rows
        );
        Ok(report)
    }
}

/// Appends every record that types cleanly; returns how many did not.
fn type_records<T>(
    records: &[Record],
    out: &mut Vec<T>,
) -> usize
where
    T: for<'a> TryFrom<&'a Record, Error = crate::error::DecodeError>,
{
    let mut skipped = 0;
    for record in records {
        match T::try_from(record) {
            Ok(typed) => out.push(typed),
            Err(e) => {
                debug!("orchestrator::record_skipped::error::{}", e);
                skipped += 1;
            },
        }
    }
    skipped
}
