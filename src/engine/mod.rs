pub mod orchestrator;
pub mod pagerank;
pub mod ranking;
pub mod worker;

pub use orchestrator::AnalysisCache;
pub use orchestrator::LoadReport;
pub use orchestrator::LoadRequest;
pub use orchestrator::Orchestrator;
pub use pagerank::PageRankEngine;
pub use ranking::select_top_k;
pub use ranking::RankingWeights;
pub use worker::FileInfo;
pub use worker::WorkerHandle;
pub use worker::WorkerRequest;
pub use worker::WorkerResponse;
