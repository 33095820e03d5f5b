use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to setup tracing: {0}")]
    SetupTracingError(String),
    #[error("Worker terminated before sending a terminal response")]
    WorkerTerminated,
    #[error("Worker rejected request: {0}")]
    WorkerRejected(String),
    #[error("Ingestion superseded by a newer load")]
    Superseded,
    #[error("Unexpected worker response: {0}")]
    UnexpectedResponse(String),
}
