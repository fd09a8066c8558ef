use stowage_storage::{DeleteFailure, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum FileManagerError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(
        "failed to delete {count} object(s) under '{prefix}': {first}",
        count = failures.len(),
        first = failures.first().map(ToString::to_string).unwrap_or_default()
    )]
    BulkDelete {
        prefix: String,
        failures: Vec<DeleteFailure>,
    },
}

impl FileManagerError {
    /// Whether the caller is at fault (bad input, missing object, conflicting name or
    /// oversized upload) rather than the store.
    pub fn is_client_error(&self) -> bool {
        match self {
            FileManagerError::InvalidInput(_) | FileManagerError::AlreadyExists(_) => true,
            FileManagerError::Storage(
                StorageError::NotFound { .. } | StorageError::SizeLimitExceeded { .. },
            ) => true,
            _ => false,
        }
    }
}

impl From<stowage_types::TextError> for FileManagerError {
    fn from(err: stowage_types::TextError) -> Self {
        FileManagerError::InvalidInput(err.to_string())
    }
}

pub type FileManagerResult<T> = std::result::Result<T, FileManagerError>;
