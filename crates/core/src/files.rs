//! File operations inside a tenant's namespace.

use crate::config::CoreConfig;
use crate::paths;
use crate::placeholder;
use crate::tenant::TenantRoot;
use crate::validation::{validate_entry_name, validate_relative_path, validate_upload_name};
use crate::view::ViewEntry;
use crate::FileManagerResult;
use futures::TryStreamExt;
use std::sync::Arc;
use stowage_storage::{body, ObjectBody, ObjectStore, StorageError};

/// Lists, uploads, downloads, renames and deletes files.
#[derive(Clone, Debug)]
pub struct FileService {
    store: Arc<dyn ObjectStore>,
    config: Arc<CoreConfig>,
}

impl FileService {
    pub fn new(store: Arc<dyn ObjectStore>, config: Arc<CoreConfig>) -> Self {
        Self { store, config }
    }

    /// Lists the immediate children of the directory at `path`.
    ///
    /// Directories come first, then files, each group ordered by name. The placeholder that
    /// keeps an empty directory alive is not reported.
    ///
    /// # Errors
    ///
    /// Returns `FileManagerError::InvalidInput` for a malformed path, or a storage error if
    /// the listing fails.
    pub async fn list(&self, root: &TenantRoot, path: &str) -> FileManagerResult<Vec<ViewEntry>> {
        validate_relative_path(path)?;
        let prefix = paths::add_tenant_root(root, path);

        let mut entries: Vec<ViewEntry> = self
            .store
            .list(&prefix, false)
            .map_ok(|item| ViewEntry::from_listed(root, &item))
            .try_filter(|entry| futures::future::ready(!entry.name.trim().is_empty()))
            .try_collect()
            .await?;

        entries.sort_by(|a, b| {
            b.is_directory
                .cmp(&a.is_directory)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(entries)
    }

    /// Opens `file` in the directory at `path` for streaming.
    pub async fn download(
        &self,
        root: &TenantRoot,
        path: &str,
        file: &str,
    ) -> FileManagerResult<ObjectBody> {
        validate_relative_path(path)?;
        validate_entry_name(file)?;

        let key = paths::add_tenant_root(root, &format!("{}{}", path, file));
        Ok(self.store.get(&key).await?)
    }

    /// Stores `body` as `name` in the directory at `path`, replacing any existing file.
    ///
    /// `size_hint` is the announced body length. Bodies larger than the configured limit are
    /// rejected up front when the length is known, and cut off once the limit is passed when
    /// it is not; nothing is stored in either case. Returns the number of bytes stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::SizeLimitExceeded` (wrapped) for oversized bodies and
    /// `FileManagerError::InvalidInput` for malformed names.
    pub async fn upload(
        &self,
        root: &TenantRoot,
        path: &str,
        name: &str,
        body: ObjectBody,
        size_hint: Option<u64>,
    ) -> FileManagerResult<u64> {
        validate_relative_path(path)?;
        validate_upload_name(name)?;

        let key = paths::add_tenant_root(root, &format!("{}{}", path, name));
        let limit = self.config.max_upload_bytes();

        if size_hint.is_some_and(|size| size > limit) {
            return Err(StorageError::SizeLimitExceeded { key, limit }.into());
        }

        let written = self
            .store
            .put(&key, body::limited(body, key.as_str(), limit), size_hint)
            .await?;
        tracing::debug!("uploaded {} ({} bytes)", key, written);
        Ok(written)
    }

    /// Renames `old_name` to `new_name` within the directory at `path`.
    ///
    /// The original extension is kept: renaming `report.pdf` to `final` yields `final.pdf`.
    /// Implemented as copy then delete; if the delete fails both names exist afterwards.
    /// Returns the new tenant-relative path.
    pub async fn rename(
        &self,
        root: &TenantRoot,
        path: &str,
        old_name: &str,
        new_name: &str,
    ) -> FileManagerResult<String> {
        validate_relative_path(path)?;
        validate_entry_name(old_name)?;
        validate_entry_name(new_name)?;

        let extension = paths::extension(old_name);
        let target_name = if extension.is_empty() {
            new_name.to_owned()
        } else {
            format!("{}.{}", new_name, extension)
        };

        let new_relative = format!("{}{}", path, target_name);
        let old_key = paths::add_tenant_root(root, &format!("{}{}", path, old_name));
        let new_key = paths::add_tenant_root(root, &new_relative);

        if old_key == new_key {
            return Ok(new_relative);
        }

        self.store.copy(&old_key, &new_key).await?;
        self.store.delete_one(&old_key).await?;
        tracing::debug!("renamed {} to {}", old_key, new_key);
        Ok(new_relative)
    }

    /// Deletes `name` from the directory at `path`.
    ///
    /// If that leaves a non-root directory empty its placeholder is recreated so the
    /// directory stays visible.
    pub async fn delete(&self, root: &TenantRoot, path: &str, name: &str) -> FileManagerResult<()> {
        validate_relative_path(path)?;
        validate_entry_name(name)?;

        let key = paths::add_tenant_root(root, &format!("{}{}", path, name));
        self.store.delete_one(&key).await?;
        tracing::debug!("deleted {}", key);

        placeholder::restore_if_empty(self.store.as_ref(), root, path).await?;
        Ok(())
    }
}
