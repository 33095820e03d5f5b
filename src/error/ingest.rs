use thiserror::Error;

/// Row-level failure. Never aborts a stream; the row is skipped and counted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Column count mismatch: expected {expected}, found {found}")]
    ColumnCountMismatch { expected: usize, found: usize },
    #[error("Required field missing: {0}")]
    MissingField(String),
    #[error("Invalid value for field {field}: {reason}")]
    InvalidField { field: String, reason: String },
}

/// Source-level failure. Fatal to the current ingestion only.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Failed to open source {path}: {source}")]
    OpenError {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read source after {processed_bytes} bytes: {source}")]
    ReadError {
        processed_bytes: u64,
        #[source]
        source: std::io::Error,
    },
    #[error("Ingestion cancelled")]
    Cancelled,
}
