//! Stowage Object Storage
//!
//! This crate is the gateway between Stowage and the object store that holds every tenant's
//! files. It exposes a small contract ([`ObjectStore`]) over the primitives a flat key-value
//! store offers: prefix listing, get, put, delete (single and batched) and server-side copy.
//!
//! ## Key Layout
//!
//! Keys are opaque strings. Directories do not exist in the store; they are simulated by
//! prefix conventions:
//!
//! ```text
//! user-42-files/                 # zero-byte placeholder (empty directory marker)
//! user-42-files/notes/           # zero-byte placeholder for an empty sub-directory
//! user-42-files/report.pdf       # ordinary object
//! ```
//!
//! ## Backends
//!
//! - [`S3ObjectStore`]: any S3-compatible service (AWS S3, MinIO, ...) via `aws-sdk-s3`
//! - [`MemoryObjectStore`]: in-process store with the same listing semantics, used by tests
//!   and the development server
//!
//! ## Example Usage
//!
//! ```no_run
//! use stowage_storage::{body, MemoryObjectStore, ObjectStore};
//!
//! # async fn demo() -> Result<(), stowage_storage::StorageError> {
//! let store = MemoryObjectStore::new("user-files");
//! store.ensure_bucket().await?;
//! store
//!     .put("user-1-files/hello.txt", body::from_bytes("hello"), Some(5))
//!     .await?;
//! let items = store.list_all("user-1-files/", false).await?;
//! assert_eq!(items.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod body;
mod constants;
mod memory;
mod object;
mod s3;

pub use constants::{DEFAULT_PART_SIZE, DELETE_BATCH_SIZE, MIN_PART_SIZE};
pub use memory::MemoryObjectStore;
pub use object::{DeleteFailure, ListStream, ListedItem, ObjectBody, ObjectStore};
pub use s3::{S3Config, S3ObjectStore};

/// Boxed error carried as the cause of a failed store call.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The store primitive that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    List,
    Get,
    Put,
    Delete,
    Copy,
}

impl std::fmt::Display for StoreOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StoreOp::List => "list",
            StoreOp::Get => "get",
            StoreOp::Put => "put",
            StoreOp::Delete => "delete",
            StoreOp::Copy => "copy",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during object store operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A store call failed; `key` is the object key or listing prefix involved
    #[error("{op} failed for '{key}': {source}")]
    Operation {
        op: StoreOp,
        key: String,
        #[source]
        source: BoxError,
    },

    /// The requested object does not exist
    #[error("object not found: '{key}'")]
    NotFound { key: String },

    /// An upload body grew past the configured maximum
    #[error("upload to '{key}' exceeds the maximum size of {limit} bytes")]
    SizeLimitExceeded { key: String, limit: u64 },

    /// The backing bucket could not be verified or created
    #[error("bucket '{bucket}' could not be provisioned: {source}")]
    BucketProvisioning {
        bucket: String,
        #[source]
        source: BoxError,
    },

    /// An upload body stream failed before the store saw all of it
    #[error("failed to read body from '{origin}': {source}")]
    InvalidBody {
        origin: String,
        #[source]
        source: BoxError,
    },

    /// The store was configured with unusable settings
    #[error("invalid store configuration: {0}")]
    InvalidConfig(String),
}

impl StorageError {
    /// Wraps an underlying fault raised by `op` on `key`.
    pub fn operation(op: StoreOp, key: impl Into<String>, source: impl Into<BoxError>) -> Self {
        StorageError::Operation {
            op,
            key: key.into(),
            source: source.into(),
        }
    }

    /// Returns the failed primitive, if this error came from a store call.
    pub fn op(&self) -> Option<StoreOp> {
        match self {
            StorageError::Operation { op, .. } => Some(*op),
            _ => None,
        }
    }
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_error_mentions_op_and_key() {
        let err = StorageError::operation(StoreOp::Copy, "user-1-files/a.txt", "boom");
        assert_eq!(err.op(), Some(StoreOp::Copy));
        assert_eq!(
            err.to_string(),
            "copy failed for 'user-1-files/a.txt': boom"
        );
    }

    #[test]
    fn non_operation_errors_have_no_op() {
        let err = StorageError::NotFound {
            key: "user-1-files/missing".into(),
        };
        assert_eq!(err.op(), None);
    }
}
