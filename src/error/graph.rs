use thiserror::Error;

/// Raised before any PageRank or ranking work starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructuralError {
    #[error("Invalid graph structure: missing {0} container")]
    MissingContainer(&'static str),
    #[error("Invalid damping factor {0}: must lie strictly between 0 and 1")]
    InvalidDampingFactor(f64),
    #[error("Invalid iteration count: must be positive")]
    InvalidIterations,
}
