use crate::service::ServiceError;
use crate::storage::StorageError;
use crate::types::StoryId;

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Column {0} is a standard column and cannot be changed")]
    StandardColumnReadOnly(String),

    #[error("Column name must not be empty")]
    EmptyColumnName,

    #[error("Story not found: {0}")]
    StoryNotFound(StoryId),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Story service error: {0}")]
    Service(#[from] ServiceError),
}
