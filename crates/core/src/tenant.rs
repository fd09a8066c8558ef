//! Tenant namespaces.
//!
//! Every user owns one root prefix inside the shared bucket. Services never build keys from a
//! raw user id; they receive a [`TenantRoot`] derived once per request from a
//! [`TenantLayout`].

use crate::constants::{DEFAULT_TENANT_PREFIX, DEFAULT_TENANT_SUFFIX, SEPARATOR};
use crate::{FileManagerError, FileManagerResult};
use stowage_types::NonEmptyText;

/// A tenant's root prefix, without the trailing separator (e.g. `user-42-files`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TenantRoot(String);

impl TenantRoot {
    /// Wraps an already-derived root.
    ///
    /// # Errors
    ///
    /// Returns `FileManagerError::InvalidInput` if `root` is blank or contains `/`.
    pub fn new(root: impl Into<String>) -> FileManagerResult<Self> {
        let root = root.into();
        if root.trim().is_empty() {
            return Err(FileManagerError::InvalidInput(
                "tenant root cannot be empty".into(),
            ));
        }
        if root.contains(SEPARATOR) {
            return Err(FileManagerError::InvalidInput(format!(
                "tenant root '{}' must not contain '/'",
                root
            )));
        }
        Ok(Self(root))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The root followed by `/`: the prefix every key of this tenant starts with.
    pub fn key_prefix(&self) -> String {
        format!("{}{}", self.0, SEPARATOR)
    }
}

impl std::fmt::Display for TenantRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TenantRoot {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// How tenant roots are derived from user ids: `prefix + user_id + suffix`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantLayout {
    prefix: String,
    suffix: String,
}

impl TenantLayout {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> FileManagerResult<Self> {
        let prefix = prefix.into();
        let suffix = suffix.into();
        if prefix.contains(SEPARATOR) || suffix.contains(SEPARATOR) {
            return Err(FileManagerError::InvalidInput(
                "tenant prefix and suffix must not contain '/'".into(),
            ));
        }
        Ok(Self { prefix, suffix })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Derives the root for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `FileManagerError::InvalidInput` if the user id is blank or contains `/`.
    pub fn root_for(&self, user_id: &str) -> FileManagerResult<TenantRoot> {
        let user_id = NonEmptyText::new(user_id)?;
        TenantRoot::new(format!("{}{}{}", self.prefix, user_id, self.suffix))
    }
}

impl Default for TenantLayout {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_TENANT_PREFIX.into(),
            suffix: DEFAULT_TENANT_SUFFIX.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let root = TenantLayout::default().root_for("42").unwrap();
        assert_eq!(root.as_str(), "user-42-files");
        assert_eq!(root.key_prefix(), "user-42-files/");
    }

    #[test]
    fn test_custom_layout() {
        let layout = TenantLayout::new("tenant_", "").unwrap();
        assert_eq!(layout.root_for("alice").unwrap().as_str(), "tenant_alice");
    }

    #[test]
    fn test_rejects_escaping_user_ids() {
        let layout = TenantLayout::default();
        assert!(layout.root_for("").is_err());
        assert!(layout.root_for("   ").is_err());
        assert!(layout.root_for("1/../2").is_err());
    }

    #[test]
    fn test_rejects_separator_in_layout() {
        assert!(TenantLayout::new("a/", "").is_err());
        assert!(TenantLayout::new("", "/b").is_err());
    }

    #[test]
    fn test_tenant_root_validation() {
        assert!(TenantRoot::new("").is_err());
        assert!(TenantRoot::new("a/b").is_err());
        assert!(TenantRoot::new("user-1-files").is_ok());
    }
}
