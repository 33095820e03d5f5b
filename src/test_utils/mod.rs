pub mod assertions;
pub mod fixtures;

pub use assertions::assert_sums_to_one;
pub use fixtures::address_stat;
pub use fixtures::edge;
pub use fixtures::graph_node;
pub use fixtures::snapshot_from;
pub use fixtures::transaction;
