use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("worker pool failed: {0}")]
    Worker(String),
    #[error("commit failed: {0}")]
    Commit(String),
    #[error("{0} channel disconnected")]
    Disconnected(&'static str),
}
