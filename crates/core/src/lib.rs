//! # Stowage Core
//!
//! A hierarchical, per-tenant file namespace layered over a flat object store.
//!
//! Object stores have no directories, no rename and no subtree operations. This crate
//! emulates them with prefix conventions:
//!
//! - a directory is any key prefix ending in `/`; an empty directory is kept alive by a
//!   zero-byte placeholder object whose key is the prefix itself
//! - renaming or deleting a directory enumerates its subtree and handles each object
//! - every key belongs to exactly one tenant root (`user-<id>-files/` by default) and callers
//!   only ever see paths relative to it
//!
//! Services:
//!
//! - [`FileService`]: list, upload, download, rename, delete files
//! - [`DirectoryService`]: create, rename, delete directories
//! - [`SearchService`]: substring search over names
//!
//! **No API concerns**: HTTP handlers, authentication and CLI parsing belong in `api-rest` and
//! `stowage-cli`. Configuration is resolved by the binaries and passed in as [`CoreConfig`].

pub mod config;
pub mod constants;
pub mod directories;
mod error;
pub mod files;
pub mod paths;
mod placeholder;
pub mod search;
pub mod size;
pub mod tenant;
pub mod validation;
pub mod view;

pub use config::CoreConfig;
pub use directories::DirectoryService;
pub use error::{FileManagerError, FileManagerResult};
pub use files::FileService;
pub use search::SearchService;
pub use size::human_size;
pub use tenant::{TenantLayout, TenantRoot};
pub use view::{Breadcrumbs, ViewEntry};
