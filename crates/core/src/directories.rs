//! Directory operations.
//!
//! Directories are key prefixes, so anything that touches a whole directory is emulated one
//! object at a time. These operations are not atomic: when one fails part-way, the objects
//! already handled stay where they were moved (or stay deleted) and the error is returned.
//! Callers should re-list before acting on the directory again.

use crate::config::CoreConfig;
use crate::constants::SEPARATOR;
use crate::paths;
use crate::placeholder;
use crate::tenant::TenantRoot;
use crate::validation::{validate_entry_name, validate_relative_path};
use crate::{FileManagerError, FileManagerResult};
use futures::{StreamExt, TryStreamExt};
use std::sync::Arc;
use stowage_storage::{body, ObjectStore};

/// Creates, renames and deletes directories.
#[derive(Clone, Debug)]
pub struct DirectoryService {
    store: Arc<dyn ObjectStore>,
    config: Arc<CoreConfig>,
}

/// Accepts `docs` as well as `docs/` (the form listings report directory names in).
fn directory_name(name: &str) -> FileManagerResult<String> {
    let bare = name.strip_suffix(SEPARATOR).unwrap_or(name);
    validate_entry_name(bare)?;
    Ok(format!("{}{}", bare, SEPARATOR))
}

impl DirectoryService {
    pub fn new(store: Arc<dyn ObjectStore>, config: Arc<CoreConfig>) -> Self {
        Self { store, config }
    }

    /// Creates the directory `name` inside `path` by writing its placeholder.
    ///
    /// Creating a directory that already exists is harmless. Returns the new directory's
    /// tenant-relative path.
    ///
    /// # Errors
    ///
    /// Returns `FileManagerError::InvalidInput` if `name` is blank, `.`, `..` or contains `/`.
    pub async fn create(
        &self,
        root: &TenantRoot,
        path: &str,
        name: &str,
    ) -> FileManagerResult<String> {
        validate_relative_path(path)?;
        let relative = format!("{}{}", path, directory_name(name)?);
        let key = paths::add_tenant_root(root, &relative);

        self.store.put(&key, body::empty(), Some(0)).await?;
        tracing::debug!("created directory {}", key);
        Ok(relative)
    }

    /// Moves every object under `path/old_name/` to `path/new_name/`.
    ///
    /// Objects are copied then deleted individually, up to `fanout_concurrency` at a time.
    /// The first failure stops the remaining work and is returned. Returns the number of
    /// objects moved.
    ///
    /// # Errors
    ///
    /// Returns `FileManagerError::AlreadyExists` if the target directory already holds
    /// objects; subtrees are never merged.
    pub async fn rename(
        &self,
        root: &TenantRoot,
        path: &str,
        old_name: &str,
        new_name: &str,
    ) -> FileManagerResult<usize> {
        validate_relative_path(path)?;
        let old_prefix =
            paths::add_tenant_root(root, &format!("{}{}", path, directory_name(old_name)?));
        let new_prefix =
            paths::add_tenant_root(root, &format!("{}{}", path, directory_name(new_name)?));

        if old_prefix == new_prefix {
            return Ok(0);
        }

        if self.store.list(&new_prefix, true).try_next().await?.is_some() {
            return Err(FileManagerError::AlreadyExists(
                paths::strip_tenant_root(root, &new_prefix).to_owned(),
            ));
        }

        let items = self.store.list_all(&old_prefix, true).await?;
        if items.is_empty() {
            tracing::warn!("rename of {} found no objects", old_prefix);
            return Ok(0);
        }

        let store = self.store.as_ref();
        let (old_prefix, new_prefix) = (old_prefix.as_str(), new_prefix.as_str());
        futures::stream::iter(items.iter())
            .map(move |item| async move {
                let suffix = item
                    .object_key
                    .strip_prefix(old_prefix)
                    .unwrap_or(&item.object_key);
                let target = format!("{}{}", new_prefix, suffix);
                store.copy(&item.object_key, &target).await?;
                store.delete_one(&item.object_key).await?;
                Ok::<_, FileManagerError>(())
            })
            .boxed()
            .buffer_unordered(self.config.fanout_concurrency())
            .try_collect::<()>()
            .await?;

        tracing::debug!(
            "renamed directory {} to {} ({} objects)",
            old_prefix,
            new_prefix,
            items.len()
        );
        Ok(items.len())
    }

    /// Deletes `path/name/` and everything under it.
    ///
    /// If that leaves `path` empty (and `path` is not the tenant root) its placeholder is
    /// recreated. Returns the number of objects deleted.
    ///
    /// # Errors
    ///
    /// Returns `FileManagerError::BulkDelete` listing every key the store refused to delete.
    pub async fn delete(
        &self,
        root: &TenantRoot,
        path: &str,
        name: &str,
    ) -> FileManagerResult<usize> {
        validate_relative_path(path)?;
        let prefix =
            paths::add_tenant_root(root, &format!("{}{}", path, directory_name(name)?));

        let keys: Vec<String> = self
            .store
            .list(&prefix, true)
            .map_ok(|item| item.object_key)
            .try_collect()
            .await?;

        if !keys.is_empty() {
            let failures = self.store.delete_many(&keys).await?;
            if !failures.is_empty() {
                return Err(FileManagerError::BulkDelete { prefix, failures });
            }
        }
        tracing::debug!("deleted directory {} ({} objects)", prefix, keys.len());

        placeholder::restore_if_empty(self.store.as_ref(), root, path).await?;
        Ok(keys.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowage_storage::{MemoryObjectStore, StorageError, StoreOp};

    fn setup_with(fanout: usize) -> (Arc<MemoryObjectStore>, DirectoryService, TenantRoot) {
        let store = Arc::new(MemoryObjectStore::new("test-bucket"));
        let config = CoreConfig::new(Default::default(), 1024, fanout).unwrap();
        let service = DirectoryService::new(store.clone(), Arc::new(config));
        (store, service, TenantRoot::new("user-1-files").unwrap())
    }

    fn setup() -> (Arc<MemoryObjectStore>, DirectoryService, TenantRoot) {
        setup_with(8)
    }

    async fn seed(store: &MemoryObjectStore, keys: &[&str]) {
        for key in keys {
            store
                .put(key, body::from_bytes(key.to_string()), None)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_create_writes_placeholder() {
        let (store, service, root) = setup();

        let created = service.create(&root, "", "docs").await.unwrap();
        assert_eq!(created, "docs/");
        service.create(&root, "docs/", "2024/").await.unwrap();

        assert_eq!(
            store.keys(),
            vec!["user-1-files/docs/".to_string(), "user-1-files/docs/2024/".to_string()]
        );
    }

    #[tokio::test]
    async fn test_create_rejects_bad_names() {
        let (store, service, root) = setup();
        for bad in ["", " ", ".", "..", "a/b", "/"] {
            let result = service.create(&root, "", bad).await;
            assert!(
                matches!(result, Err(FileManagerError::InvalidInput(_))),
                "{bad:?} should be rejected"
            );
        }
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_rename_moves_subtree() {
        let (store, service, root) = setup();
        seed(
            &store,
            &[
                "user-1-files/dir1/",
                "user-1-files/dir1/a.txt",
                "user-1-files/dir1/sub/b.txt",
                "user-1-files/dir10/keep.txt",
            ],
        )
        .await;

        let moved = service.rename(&root, "", "dir1/", "dir2").await.unwrap();

        assert_eq!(moved, 3);
        assert_eq!(
            store.keys(),
            vec![
                "user-1-files/dir10/keep.txt".to_string(),
                "user-1-files/dir2/".to_string(),
                "user-1-files/dir2/a.txt".to_string(),
                "user-1-files/dir2/sub/b.txt".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_rename_slices_prefix_not_interior_matches() {
        let (store, service, root) = setup();
        seed(&store, &["user-1-files/a/x/a/x/file.txt"]).await;

        service.rename(&root, "a/", "x", "y").await.unwrap();

        assert_eq!(store.keys(), vec!["user-1-files/a/y/a/x/file.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_rename_onto_itself_is_noop() {
        let (store, service, root) = setup();
        seed(&store, &["user-1-files/docs/a.txt"]).await;

        assert_eq!(service.rename(&root, "", "docs", "docs/").await.unwrap(), 0);
        assert!(store.contains("user-1-files/docs/a.txt"));
    }

    #[tokio::test]
    async fn test_rename_refuses_to_merge() {
        let (store, service, root) = setup();
        seed(&store, &["user-1-files/a/1.txt", "user-1-files/b/2.txt"]).await;

        let result = service.rename(&root, "", "a", "b").await;

        assert!(matches!(result, Err(FileManagerError::AlreadyExists(ref p)) if p == "b/"));
        assert!(store.contains("user-1-files/a/1.txt"));
    }

    #[tokio::test]
    async fn test_rename_of_missing_directory_moves_nothing() {
        let (_, service, root) = setup();
        assert_eq!(service.rename(&root, "", "ghost", "other").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rename_copy_failure_leaves_subtree_split() {
        let (store, service, root) = setup_with(1);
        seed(
            &store,
            &[
                "user-1-files/src/a.txt",
                "user-1-files/src/b.txt",
                "user-1-files/src/c.txt",
            ],
        )
        .await;
        store.fail_on(StoreOp::Copy, "user-1-files/src/b.txt");

        let err = service.rename(&root, "", "src", "dst").await.unwrap_err();

        assert!(matches!(err, FileManagerError::Storage(ref e) if e.op() == Some(StoreOp::Copy)));
        assert_eq!(
            store.keys(),
            vec![
                "user-1-files/dst/a.txt".to_string(),
                "user-1-files/src/b.txt".to_string(),
                "user-1-files/src/c.txt".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_delete_removes_subtree_and_restores_parent() {
        let (store, service, root) = setup();
        seed(
            &store,
            &[
                "user-1-files/p/",
                "user-1-files/p/child/",
                "user-1-files/p/child/a.txt",
                "user-1-files/p/child/deep/b.txt",
            ],
        )
        .await;

        let deleted = service.delete(&root, "p/", "child").await.unwrap();

        assert_eq!(deleted, 3);
        assert_eq!(store.keys(), vec!["user-1-files/p/".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_in_root_does_not_create_root_placeholder() {
        let (store, service, root) = setup();
        seed(&store, &["user-1-files/docs/a.txt"]).await;

        service.delete(&root, "", "docs").await.unwrap();

        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_delete_reports_every_failed_key() {
        let (store, service, root) = setup();
        seed(
            &store,
            &[
                "user-1-files/d/a",
                "user-1-files/d/b",
                "user-1-files/d/c",
            ],
        )
        .await;
        store.fail_on(StoreOp::Delete, "user-1-files/d/a");
        store.fail_on(StoreOp::Delete, "user-1-files/d/c");

        let err = service.delete(&root, "", "d").await.unwrap_err();

        match err {
            FileManagerError::BulkDelete { prefix, failures } => {
                assert_eq!(prefix, "user-1-files/d/");
                let keys: Vec<_> = failures.iter().map(|f| f.key.as_str()).collect();
                assert_eq!(keys, vec!["user-1-files/d/a", "user-1-files/d/c"]);
            }
            other => panic!("expected BulkDelete, got {other:?}"),
        }
        assert!(!store.contains("user-1-files/d/b"));
    }

    #[tokio::test]
    async fn test_delete_propagates_listing_failure() {
        let (store, service, root) = setup();
        store.fail_on(StoreOp::List, "user-1-files/d/");

        let err = service.delete(&root, "", "d").await.unwrap_err();

        assert!(matches!(err, FileManagerError::Storage(StorageError::Operation { .. })));
    }
}
