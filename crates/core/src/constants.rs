//! Constants used throughout the Stowage core crate.

/// Default text placed before the user id in a tenant root.
pub const DEFAULT_TENANT_PREFIX: &str = "user-";

/// Default text placed after the user id in a tenant root.
pub const DEFAULT_TENANT_SUFFIX: &str = "-files";

/// Default upload size limit (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Default number of per-object copy/delete calls kept in flight by directory operations.
pub const DEFAULT_FANOUT_CONCURRENCY: usize = 8;

/// Separator between path segments in storage keys.
pub const SEPARATOR: char = '/';
