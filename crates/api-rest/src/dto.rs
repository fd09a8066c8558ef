//! Request and response bodies.

use serde::{Deserialize, Serialize};
use stowage_core::{Breadcrumbs, ViewEntry};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// A file or directory as shown to the tenant.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EntryRes {
    /// Basename; directories end in `/`
    pub name: String,
    /// Path relative to the tenant root
    pub relative_path: String,
    pub is_directory: bool,
    pub size_bytes: u64,
    pub human_size: String,
}

impl From<ViewEntry> for EntryRes {
    fn from(entry: ViewEntry) -> Self {
        Self {
            name: entry.name,
            relative_path: entry.relative_path,
            is_directory: entry.is_directory,
            size_bytes: entry.size_bytes,
            human_size: entry.human_size,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BreadcrumbsRes {
    pub path: String,
    pub names: Vec<String>,
    pub links: Vec<String>,
}

impl From<Breadcrumbs> for BreadcrumbsRes {
    fn from(crumbs: Breadcrumbs) -> Self {
        Self {
            path: crumbs.path,
            names: crumbs.names,
            links: crumbs.links,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListFilesRes {
    pub path: String,
    pub breadcrumbs: BreadcrumbsRes,
    pub entries: Vec<EntryRes>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadRes {
    pub path: String,
    pub bytes_written: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RenameReq {
    /// Directory holding the entry; empty for the tenant root
    #[serde(default)]
    pub path: String,
    pub old_name: String,
    pub new_name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NameReq {
    /// Directory holding the entry; empty for the tenant root
    #[serde(default)]
    pub path: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PathRes {
    pub path: String,
}

/// Number of objects a directory operation touched.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ObjectCountRes {
    pub objects: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SearchRes {
    pub query: String,
    pub results: Vec<EntryRes>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PathQuery {
    /// Directory to list; empty for the tenant root
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FileQuery {
    /// Directory holding the file; empty for the tenant root
    #[serde(default)]
    pub path: String,
    pub file: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadQuery {
    /// Target directory; empty for the tenant root
    #[serde(default)]
    pub path: String,
    /// File name, may contain `/` to create nested directories
    pub name: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}
