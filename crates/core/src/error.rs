use jdvault_ingest::IngestError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Index store error: {0}")]
    Store(#[from] rusqlite::Error),
    #[error("Parse stage error: {0}")]
    Ingest(#[from] IngestError),
    #[error("Full rebuild required: {0}")]
    RebuildRequired(String),
    #[error("Invalid vault path: {0}")]
    InvalidPath(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl VaultError {
    /// Errors after which SQLite may already have rolled the open
    /// transaction back. A pass must stop on these rather than skip an entry.
    pub fn is_fatal(&self) -> bool {
        use rusqlite::ErrorCode;

        match self {
            VaultError::Store(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                ErrorCode::DiskFull
                    | ErrorCode::SystemIoFailure
                    | ErrorCode::DatabaseBusy
                    | ErrorCode::DatabaseLocked
                    | ErrorCode::OutOfMemory
                    | ErrorCode::ReadOnly
                    | ErrorCode::DatabaseCorrupt
                    | ErrorCode::NotADatabase
                    | ErrorCode::OperationInterrupted
            ),
            VaultError::Io(_) | VaultError::Ingest(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, VaultError>;
