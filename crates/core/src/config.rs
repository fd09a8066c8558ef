//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into the services. Nothing in
//! this crate reads environment variables; binaries read them and hand the raw values to the
//! `*_from_env_value` helpers below.

use crate::constants::{
    DEFAULT_FANOUT_CONCURRENCY, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_TENANT_PREFIX,
    DEFAULT_TENANT_SUFFIX,
};
use crate::tenant::TenantLayout;
use crate::{FileManagerError, FileManagerResult};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    tenant_layout: TenantLayout,
    max_upload_bytes: u64,
    fanout_concurrency: usize,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `FileManagerError::InvalidInput` if the upload limit or the fan-out
    /// concurrency is zero.
    pub fn new(
        tenant_layout: TenantLayout,
        max_upload_bytes: u64,
        fanout_concurrency: usize,
    ) -> FileManagerResult<Self> {
        if max_upload_bytes == 0 {
            return Err(FileManagerError::InvalidInput(
                "max_upload_bytes must be greater than zero".into(),
            ));
        }
        if fanout_concurrency == 0 {
            return Err(FileManagerError::InvalidInput(
                "fanout_concurrency must be at least 1".into(),
            ));
        }

        Ok(Self {
            tenant_layout,
            max_upload_bytes,
            fanout_concurrency,
        })
    }

    pub fn tenant_layout(&self) -> &TenantLayout {
        &self.tenant_layout
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    pub fn fanout_concurrency(&self) -> usize {
        self.fanout_concurrency
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            tenant_layout: TenantLayout::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            fanout_concurrency: DEFAULT_FANOUT_CONCURRENCY,
        }
    }
}

/// Resolve a `CoreConfig` from `STOWAGE_*` variables.
///
/// `lookup` returns the raw value of a variable; binaries pass `std::env::var(..).ok()`.
pub fn core_config_from_env(lookup: impl Fn(&str) -> Option<String>) -> FileManagerResult<CoreConfig> {
    CoreConfig::new(
        tenant_layout_from_env_values(
            lookup("STOWAGE_TENANT_PREFIX"),
            lookup("STOWAGE_TENANT_SUFFIX"),
        )?,
        max_upload_bytes_from_env_value(lookup("STOWAGE_MAX_UPLOAD_BYTES"))?,
        fanout_concurrency_from_env_value(lookup("STOWAGE_FANOUT_CONCURRENCY"))?,
    )
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Build the tenant layout from optional prefix and suffix values.
///
/// Unset values fall back to the defaults. A value that is present but blank means "no
/// prefix" (or suffix), so layouts such as `<user_id>-files` stay expressible.
pub fn tenant_layout_from_env_values(
    prefix: Option<String>,
    suffix: Option<String>,
) -> FileManagerResult<TenantLayout> {
    TenantLayout::new(
        prefix
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|| DEFAULT_TENANT_PREFIX.into()),
        suffix
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|| DEFAULT_TENANT_SUFFIX.into()),
    )
}

/// Parse the upload size limit in bytes.
///
/// If `value` is `None` or empty/whitespace, returns the default of 10 MiB.
pub fn max_upload_bytes_from_env_value(value: Option<String>) -> FileManagerResult<u64> {
    match non_blank(value) {
        None => Ok(DEFAULT_MAX_UPLOAD_BYTES),
        Some(v) => v.parse::<u64>().map_err(|e| {
            FileManagerError::InvalidInput(format!("invalid max upload size '{}': {}", v, e))
        }),
    }
}

/// Parse the directory fan-out concurrency.
///
/// If `value` is `None` or empty/whitespace, returns the default.
pub fn fanout_concurrency_from_env_value(value: Option<String>) -> FileManagerResult<usize> {
    match non_blank(value) {
        None => Ok(DEFAULT_FANOUT_CONCURRENCY),
        Some(v) => v.parse::<usize>().map_err(|e| {
            FileManagerError::InvalidInput(format!("invalid fan-out concurrency '{}': {}", v, e))
        }),
    }
}
