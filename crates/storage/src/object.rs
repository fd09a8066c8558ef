//! The object store contract.
//!
//! Every backend implements [`ObjectStore`]. The contract is intentionally narrow: it is what
//! a flat key-value store can actually guarantee. Nothing here spans more than one key
//! atomically; callers composing several calls must treat intermediate states as observable.

use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::TryStreamExt;

/// Streamed object content. Used both for downloads and for upload bodies.
pub type ObjectBody = BoxStream<'static, StorageResult<Bytes>>;

/// Lazily paginated listing.
pub type ListStream<'a> = BoxStream<'a, StorageResult<ListedItem>>;

/// A raw entry returned by a prefix listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedItem {
    /// Full storage key (tenant root included)
    pub object_key: String,

    /// True for common prefixes reported by a non-recursive listing
    pub is_dir_marker: bool,

    /// Object size in bytes (0 for common prefixes)
    pub size_bytes: u64,
}

impl ListedItem {
    /// An actual stored object.
    pub fn object(key: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            object_key: key.into(),
            is_dir_marker: false,
            size_bytes,
        }
    }

    /// A common prefix rolled up by a non-recursive listing.
    pub fn common_prefix(key: impl Into<String>) -> Self {
        Self {
            object_key: key.into(),
            is_dir_marker: true,
            size_bytes: 0,
        }
    }
}

/// A key that a batched delete could not remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteFailure {
    pub key: String,
    pub message: String,
}

impl std::fmt::Display for DeleteFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.key, self.message)
    }
}

/// Object store bound to a single bucket.
///
/// All keys are absolute (already tenant-rooted). Implementations must be safe to share across
/// tasks; no call retries on its own.
#[async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug {
    /// Name of the bucket this store is bound to.
    fn bucket(&self) -> &str;

    /// Verifies the bucket exists, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::BucketProvisioning`] if the bucket can neither be found nor
    /// created. Callers should treat this as fatal.
    async fn ensure_bucket(&self) -> StorageResult<()>;

    /// Lists objects whose key starts with `prefix`.
    ///
    /// With `recursive == false` only immediate children are returned: objects directly under
    /// `prefix` (including a placeholder whose key equals `prefix`) and one
    /// [`ListedItem::common_prefix`] per deeper sub-prefix. With `recursive == true` every
    /// object under `prefix` is returned, at any depth, and no common prefixes.
    fn list<'a>(&'a self, prefix: &'a str, recursive: bool) -> ListStream<'a>;

    /// Opens an object for streaming.
    ///
    /// # Errors
    ///
    /// [`StorageError::NotFound`] if the key is absent, a `Get` operation error otherwise.
    async fn get(&self, key: &str) -> StorageResult<ObjectBody>;

    /// Creates or overwrites `key` with the streamed `body`.
    ///
    /// `size_hint` is the announced length, `None` when unknown. Errors yielded by `body`
    /// itself are returned unchanged. Returns the number of bytes stored.
    async fn put(&self, key: &str, body: ObjectBody, size_hint: Option<u64>) -> StorageResult<u64>;

    /// Deletes a single key. Deleting an absent key is not an error.
    async fn delete_one(&self, key: &str) -> StorageResult<()>;

    /// Deletes many keys, best effort.
    ///
    /// Keys the store refused to delete are reported individually in the returned list; the
    /// call itself only fails on transport or authorisation faults.
    async fn delete_many(&self, keys: &[String]) -> StorageResult<Vec<DeleteFailure>>;

    /// Server-side copy of `src` to `dst`.
    async fn copy(&self, src: &str, dst: &str) -> StorageResult<()>;

    /// Collects a whole listing.
    async fn list_all(&self, prefix: &str, recursive: bool) -> StorageResult<Vec<ListedItem>> {
        self.list(prefix, recursive).try_collect().await
    }
}

/// Maps a failure to `NotFound` when `missing` says the service reported an absent key.
pub(crate) fn not_found_or(
    missing: bool,
    key: &str,
    otherwise: impl FnOnce() -> StorageError,
) -> StorageError {
    if missing {
        StorageError::NotFound {
            key: key.to_owned(),
        }
    } else {
        otherwise()
    }
}
