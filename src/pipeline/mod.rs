pub mod aggregator;
pub mod decoder;
pub mod ingestor;

pub use aggregator::GraphAggregator;
pub use decoder::DecodeReport;
pub use decoder::DecoderConfig;
pub use decoder::RecordDecoder;
pub use ingestor::ChunkedIngestor;
pub use ingestor::IngestEvent;
pub use ingestor::IngestSummary;
