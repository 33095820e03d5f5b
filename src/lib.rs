pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod handler;
pub mod model;
pub mod pipeline;
pub mod tracing;
pub mod utils;

pub use engine::*;
pub use error::Context;
pub use error::Result;
pub use tracing::setup_tracing;

// Test utilities - only compiled during testing
#[cfg(test)]
pub mod test_utils;
