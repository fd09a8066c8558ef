//! Tenant-facing views of store contents.

use crate::constants::SEPARATOR;
use crate::paths;
use crate::size::human_size;
use crate::tenant::TenantRoot;
use serde::Serialize;
use stowage_storage::ListedItem;

/// One row of a directory listing or search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewEntry {
    /// Basename; directories end in `/`
    pub name: String,
    /// Path relative to the tenant root; directories end in `/`
    pub relative_path: String,
    pub is_directory: bool,
    /// Object size (0 for directories)
    pub size_bytes: u64,
    /// Formatted size (empty for directories)
    pub human_size: String,
}

impl ViewEntry {
    pub fn directory(relative_path: impl Into<String>) -> Self {
        let relative_path = relative_path.into();
        Self {
            name: paths::name(&relative_path).to_owned(),
            relative_path,
            is_directory: true,
            size_bytes: 0,
            human_size: String::new(),
        }
    }

    pub fn file(relative_path: impl Into<String>, size_bytes: u64) -> Self {
        let relative_path = relative_path.into();
        let name = relative_path
            .rsplit(SEPARATOR)
            .next()
            .unwrap_or_default()
            .to_owned();
        Self {
            name,
            relative_path,
            is_directory: false,
            size_bytes,
            human_size: human_size(size_bytes),
        }
    }

    /// Maps a raw listing item into the tenant's view.
    ///
    /// A placeholder object whose key equals the listed prefix maps to a file entry with an
    /// empty name; listings drop those.
    pub fn from_listed(root: &TenantRoot, item: &ListedItem) -> Self {
        let relative = paths::strip_tenant_root(root, &item.object_key);
        if item.is_dir_marker {
            Self::directory(relative)
        } else {
            Self::file(relative, item.size_bytes)
        }
    }
}

/// Navigation trail for a directory path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Breadcrumbs {
    pub path: String,
    pub names: Vec<String>,
    pub links: Vec<String>,
}
