pub mod address;
pub mod graph;
pub mod record;
pub mod remote;
pub mod tier;
pub mod transaction;

pub use address::AddressStat;
pub use graph::GraphEdge;
pub use graph::GraphNode;
pub use graph::GraphPayload;
pub use graph::GraphSnapshot;
pub use graph::RankedNode;
pub use record::Record;
pub use record::Schema;
pub use record::Value;
pub use remote::AnalyticsFilter;
pub use remote::AnalyticsResponse;
pub use remote::NormalizedResponse;
pub use tier::Tier;
pub use transaction::FileType;
pub use transaction::Transaction;
