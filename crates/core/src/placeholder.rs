//! Empty-directory placeholders.
//!
//! A directory exists only while some key starts with its prefix. When the last entry of a
//! directory is removed, a zero-byte object whose key is the prefix itself keeps it visible.

use crate::paths;
use crate::tenant::TenantRoot;
use crate::FileManagerResult;
use futures::TryStreamExt;
use stowage_storage::{body, ObjectStore};

/// Recreates the placeholder for `relative_dir` if nothing is left under it.
///
/// The tenant root itself never gets a placeholder. Returns whether one was written.
pub(crate) async fn restore_if_empty(
    store: &dyn ObjectStore,
    root: &TenantRoot,
    relative_dir: &str,
) -> FileManagerResult<bool> {
    if relative_dir.is_empty() {
        return Ok(false);
    }

    let prefix = paths::add_tenant_root(root, relative_dir);
    let first = store.list(&prefix, false).try_next().await?;
    if first.is_some() {
        return Ok(false);
    }

    store.put(&prefix, body::empty(), Some(0)).await?;
    tracing::debug!("recreated placeholder {}", prefix);
    Ok(true)
}
