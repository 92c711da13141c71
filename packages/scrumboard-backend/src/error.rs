use scrumboard_core::storage::StorageError;
use thiserror::Error;

/// Failures that stop the backend from starting or keep it from running.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to open data store: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
