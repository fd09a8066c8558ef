//! In-process object store.
//!
//! Mirrors the listing behaviour of an S3-compatible service closely enough that the core
//! services can be exercised without a network: non-recursive listings roll deeper keys up
//! into common prefixes, a placeholder whose key equals the listed prefix is reported as an
//! ordinary zero-byte object, and a prefix vanishes as soon as its last key is deleted.

use crate::{
    body, DeleteFailure, ListStream, ListedItem, ObjectBody, ObjectStore, StorageError,
    StorageResult, StoreOp,
};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::{StreamExt, TryStreamExt};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

/// Error raised by faults injected with [`MemoryObjectStore::fail_on`].
#[derive(Debug, thiserror::Error)]
#[error("injected {op} fault")]
pub struct InjectedFault {
    op: StoreOp,
}

/// Object store kept entirely in memory.
#[derive(Debug)]
pub struct MemoryObjectStore {
    bucket: String,
    provisioned: AtomicBool,
    objects: RwLock<BTreeMap<String, Bytes>>,
    faults: RwLock<HashSet<(StoreOp, String)>>,
}

impl MemoryObjectStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            provisioned: AtomicBool::new(false),
            objects: RwLock::new(BTreeMap::new()),
            faults: RwLock::new(HashSet::new()),
        }
    }

    /// Makes every `op` call touching `key` fail.
    ///
    /// For listings `key` is matched against the listed prefix; for batched deletes the key is
    /// reported as a per-key failure rather than failing the whole call.
    pub fn fail_on(&self, op: StoreOp, key: impl Into<String>) {
        self.faults.write().insert((op, key.into()));
    }

    /// Removes all injected faults.
    pub fn clear_faults(&self) {
        self.faults.write().clear();
    }

    /// Whether [`ObjectStore::ensure_bucket`] has run.
    pub fn is_provisioned(&self) -> bool {
        self.provisioned.load(Ordering::SeqCst)
    }

    /// Snapshot of every stored key, in key order.
    pub fn keys(&self) -> Vec<String> {
        self.objects.read().keys().cloned().collect()
    }

    /// Whether `key` is currently stored.
    pub fn contains(&self, key: &str) -> bool {
        self.objects.read().contains_key(key)
    }

    fn check(&self, op: StoreOp, key: &str) -> StorageResult<()> {
        if self.faults.read().contains(&(op, key.to_owned())) {
            return Err(StorageError::operation(op, key, InjectedFault { op }));
        }
        Ok(())
    }

    fn snapshot(&self, prefix: &str, recursive: bool) -> Vec<ListedItem> {
        let objects = self.objects.read();
        let mut items = Vec::new();
        let mut rolled_up = BTreeSet::new();

        for (key, data) in objects.range(prefix.to_owned()..) {
            let Some(rest) = key.strip_prefix(prefix) else {
                break;
            };

            if !recursive {
                if let Some(separator) = rest.find('/') {
                    let common = format!("{}{}", prefix, &rest[..=separator]);
                    if rolled_up.insert(common.clone()) {
                        items.push(ListedItem::common_prefix(common));
                    }
                    continue;
                }
            }

            items.push(ListedItem::object(key.clone(), data.len() as u64));
        }

        items
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn ensure_bucket(&self) -> StorageResult<()> {
        if self.bucket.trim().is_empty() {
            return Err(StorageError::BucketProvisioning {
                bucket: self.bucket.clone(),
                source: "bucket name cannot be empty".into(),
            });
        }
        self.provisioned.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn list<'a>(&'a self, prefix: &'a str, recursive: bool) -> ListStream<'a> {
        if let Err(e) = self.check(StoreOp::List, prefix) {
            return futures::stream::once(async move { Err(e) }).boxed();
        }
        futures::stream::iter(self.snapshot(prefix, recursive).into_iter().map(Ok)).boxed()
    }

    async fn get(&self, key: &str) -> StorageResult<ObjectBody> {
        self.check(StoreOp::Get, key)?;
        let data = self
            .objects
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                key: key.to_owned(),
            })?;
        Ok(body::from_bytes(data))
    }

    async fn put(
        &self,
        key: &str,
        mut body: ObjectBody,
        _size_hint: Option<u64>,
    ) -> StorageResult<u64> {
        self.check(StoreOp::Put, key)?;
        let mut buf = BytesMut::new();
        while let Some(chunk) = body.try_next().await? {
            buf.extend_from_slice(&chunk);
        }
        let written = buf.len() as u64;
        self.objects.write().insert(key.to_owned(), buf.freeze());
        Ok(written)
    }

    async fn delete_one(&self, key: &str) -> StorageResult<()> {
        self.check(StoreOp::Delete, key)?;
        self.objects.write().remove(key);
        Ok(())
    }

    async fn delete_many(&self, keys: &[String]) -> StorageResult<Vec<DeleteFailure>> {
        let mut failures = Vec::new();
        for key in keys {
            match self.check(StoreOp::Delete, key) {
                Ok(()) => {
                    self.objects.write().remove(key);
                }
                Err(e) => failures.push(DeleteFailure {
                    key: key.clone(),
                    message: e.to_string(),
                }),
            }
        }
        Ok(failures)
    }

    async fn copy(&self, src: &str, dst: &str) -> StorageResult<()> {
        self.check(StoreOp::Copy, src)?;
        let mut objects = self.objects.write();
        let data = objects
            .get(src)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                key: src.to_owned(),
            })?;
        objects.insert(dst.to_owned(), data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded(keys: &[&str]) -> MemoryObjectStore {
        let store = MemoryObjectStore::new("test-bucket");
        for key in keys {
            store
                .put(key, body::from_bytes(key.to_string()), None)
                .await
                .unwrap();
        }
        store
    }

    fn object_keys(items: &[ListedItem]) -> Vec<(&str, bool)> {
        items
            .iter()
            .map(|i| (i.object_key.as_str(), i.is_dir_marker))
            .collect()
    }

    #[tokio::test]
    async fn non_recursive_listing_rolls_up_common_prefixes() {
        let store = seeded(&[
            "root/a.txt",
            "root/docs/b.txt",
            "root/docs/deep/c.txt",
            "root/pics/",
            "rootless.txt",
        ])
        .await;

        let items = store.list_all("root/", false).await.unwrap();

        assert_eq!(
            object_keys(&items),
            vec![
                ("root/a.txt", false),
                ("root/docs/", true),
                ("root/pics/", true),
            ]
        );
    }

    #[tokio::test]
    async fn non_recursive_listing_reports_placeholder_as_object() {
        let store = seeded(&["root/empty/"]).await;

        let items = store.list_all("root/empty/", false).await.unwrap();

        assert_eq!(items, vec![ListedItem::object("root/empty/", 11)]);
    }

    #[tokio::test]
    async fn recursive_listing_returns_every_object() {
        let store = seeded(&["root/a.txt", "root/docs/b.txt", "root/docs/deep/"]).await;

        let items = store.list_all("root/", true).await.unwrap();

        assert_eq!(
            object_keys(&items),
            vec![
                ("root/a.txt", false),
                ("root/docs/b.txt", false),
                ("root/docs/deep/", false),
            ]
        );
    }

    #[tokio::test]
    async fn prefix_disappears_with_last_key() {
        let store = seeded(&["root/docs/b.txt"]).await;
        store.delete_one("root/docs/b.txt").await.unwrap();

        assert!(store.list_all("root/docs/", false).await.unwrap().is_empty());
        assert!(store.list_all("root/", false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_missing_key_is_not_found() {
        let store = MemoryObjectStore::new("test-bucket");
        let result = store.get("root/missing").await;
        assert!(matches!(result, Err(StorageError::NotFound { .. })));
    }

    #[tokio::test]
    async fn delete_one_is_idempotent() {
        let store = MemoryObjectStore::new("test-bucket");
        store.delete_one("root/never-existed").await.unwrap();
    }

    #[tokio::test]
    async fn copy_duplicates_content() {
        let store = seeded(&["root/a.txt"]).await;
        store.copy("root/a.txt", "root/b.txt").await.unwrap();

        let data = body::read_to_bytes(store.get("root/b.txt").await.unwrap())
            .await
            .unwrap();
        assert_eq!(&data[..], b"root/a.txt");
        assert!(store.contains("root/a.txt"));
    }

    #[tokio::test]
    async fn delete_many_reports_injected_failures_per_key() {
        let store = seeded(&["root/a", "root/b", "root/c"]).await;
        store.fail_on(StoreOp::Delete, "root/b");

        let failures = store
            .delete_many(&["root/a".into(), "root/b".into(), "root/c".into()])
            .await
            .unwrap();

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].key, "root/b");
        assert_eq!(store.keys(), vec!["root/b".to_string()]);
    }

    #[tokio::test]
    async fn injected_list_fault_surfaces_as_list_error() {
        let store = seeded(&["root/a"]).await;
        store.fail_on(StoreOp::List, "root/");

        let err = store.list_all("root/", true).await.unwrap_err();
        assert_eq!(err.op(), Some(StoreOp::List));

        store.clear_faults();
        assert_eq!(store.list_all("root/", true).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_body_stores_nothing() {
        let store = MemoryObjectStore::new("test-bucket");
        let body = body::limited(body::from_bytes(vec![0u8; 16]), "root/big", 8);

        let result = store.put("root/big", body, None).await;

        assert!(matches!(result, Err(StorageError::SizeLimitExceeded { .. })));
        assert!(!store.contains("root/big"));
    }

    #[tokio::test]
    async fn ensure_bucket_marks_store_provisioned() {
        let store = MemoryObjectStore::new("test-bucket");
        assert!(!store.is_provisioned());
        store.ensure_bucket().await.unwrap();
        assert!(store.is_provisioned());

        let unnamed = MemoryObjectStore::new("  ");
        assert!(matches!(
            unnamed.ensure_bucket().await,
            Err(StorageError::BucketProvisioning { .. })
        ));
    }
}
