//! Input validation utilities.
//!
//! Every name or path coming from a caller is checked here before it is turned into a storage
//! key, so a tenant can never address a key outside its own root.

use crate::constants::SEPARATOR;
use crate::{FileManagerError, FileManagerResult};
use stowage_types::EntryName;

/// Validates a single file or directory name.
///
/// # Errors
///
/// Returns a `FileManagerError::InvalidInput` if the name is blank, is `.` or `..`, or contains
/// `/`.
pub fn validate_entry_name(name: &str) -> FileManagerResult<EntryName> {
    Ok(EntryName::new(name)?)
}

/// Validates the name of an uploaded file.
///
/// Folder uploads send names such as `photos/2024/a.jpg`, so `/` is allowed between
/// segments, but every segment must itself be a valid entry name.
pub fn validate_upload_name(name: &str) -> FileManagerResult<()> {
    if name.trim().is_empty() {
        return Err(FileManagerError::InvalidInput(
            "file name cannot be empty".into(),
        ));
    }
    for segment in name.split(SEPARATOR) {
        EntryName::new(segment).map_err(|e| {
            FileManagerError::InvalidInput(format!("invalid file name '{}': {}", name, e))
        })?;
    }
    Ok(())
}

/// Validates a tenant-relative directory path.
///
/// The path must be empty (the tenant root) or a sequence of valid names each followed by `/`.
pub fn validate_relative_path(path: &str) -> FileManagerResult<()> {
    if path.is_empty() {
        return Ok(());
    }
    let Some(body) = path.strip_suffix(SEPARATOR) else {
        return Err(FileManagerError::InvalidInput(format!(
            "directory path '{}' must end with '/'",
            path
        )));
    };
    for segment in body.split(SEPARATOR) {
        EntryName::new(segment).map_err(|e| {
            FileManagerError::InvalidInput(format!("invalid directory path '{}': {}", path, e))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_names() {
        assert!(validate_entry_name("docs").is_ok());
        assert!(validate_entry_name("my file.txt").is_ok());
        for bad in ["", "  ", ".", "..", "a/b"] {
            assert!(
                matches!(validate_entry_name(bad), Err(FileManagerError::InvalidInput(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_upload_names() {
        assert!(validate_upload_name("a.txt").is_ok());
        assert!(validate_upload_name("photos/2024/a.jpg").is_ok());
        for bad in ["", "/a.txt", "a//b", "a/", "../a", "a/./b"] {
            assert!(validate_upload_name(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_relative_paths() {
        assert!(validate_relative_path("").is_ok());
        assert!(validate_relative_path("docs/").is_ok());
        assert!(validate_relative_path("docs/2024/").is_ok());
        for bad in ["docs", "/", "/docs/", "docs//", "../", "docs/../"] {
            assert!(validate_relative_path(bad).is_err(), "{bad:?} should be rejected");
        }
    }
}
