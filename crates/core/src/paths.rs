//! Path algebra for tenant-relative paths and storage keys.
//!
//! All functions here are pure and total: an empty string stands in for "no path" and every
//! input produces an answer. Directory paths end in `/`; anything else is a file path.

use crate::constants::SEPARATOR;
use crate::tenant::TenantRoot;
use crate::view::Breadcrumbs;

/// Prepends the tenant root to a tenant-relative path.
///
/// # Examples
///
/// ```
/// use stowage_core::{paths, TenantRoot};
///
/// let root = TenantRoot::new("user-1-files").unwrap();
/// assert_eq!(paths::add_tenant_root(&root, "docs/a.txt"), "user-1-files/docs/a.txt");
/// assert_eq!(paths::add_tenant_root(&root, ""), "user-1-files/");
/// ```
pub fn add_tenant_root(root: &TenantRoot, relative: &str) -> String {
    format!("{}{}{}", root.as_str(), SEPARATOR, relative)
}

/// Removes the leading `root/` from a storage key.
///
/// Only a match at the very start of the key is removed; keys outside the root come back
/// unchanged.
pub fn strip_tenant_root<'a>(root: &TenantRoot, key: &'a str) -> &'a str {
    key.strip_prefix(root.as_str())
        .and_then(|rest| rest.strip_prefix(SEPARATOR))
        .unwrap_or(key)
}

/// Returns the extension of the last path segment, without the dot.
///
/// Empty when the segment has no `.` or ends with one.
pub fn extension(name: &str) -> &str {
    let segment_start = name.rfind(SEPARATOR).map_or(0, |i| i + 1);
    match name[segment_start..].rfind('.') {
        Some(dot) => &name[segment_start + dot + 1..],
        None => "",
    }
}

/// Returns everything up to and including the separator before the last segment.
///
/// For a directory path (`a/b/`) the last segment is `b/`, so the parent is `a/`.
pub fn parent(path: &str) -> &str {
    let split = name_start(path);
    &path[..split]
}

/// Returns the last segment; directory paths keep their trailing `/`.
pub fn name(path: &str) -> &str {
    let split = name_start(path);
    &path[split..]
}

fn name_start(path: &str) -> usize {
    let body = path.strip_suffix(SEPARATOR).unwrap_or(path);
    body.rfind(SEPARATOR).map_or(0, |i| i + 1)
}

/// Splits a directory path into navigation links.
///
/// `names[i]` is the i-th segment and `links[i]` the cumulative path up to it, ending in `/`.
/// Trailing empty segments are ignored.
pub fn breadcrumbs(path: &str) -> Breadcrumbs {
    let mut segments: Vec<&str> = path.split(SEPARATOR).collect();
    while segments.last().is_some_and(|s| s.is_empty()) {
        segments.pop();
    }

    let mut names = Vec::with_capacity(segments.len());
    let mut links = Vec::with_capacity(segments.len());
    let mut cumulative = String::new();
    for segment in segments {
        cumulative.push_str(segment);
        cumulative.push(SEPARATOR);
        names.push(segment.to_owned());
        links.push(cumulative.clone());
    }

    Breadcrumbs {
        path: path.to_owned(),
        names,
        links,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn root() -> TenantRoot {
        TenantRoot::new("user-1-files").unwrap()
    }

    #[test]
    fn test_add_and_strip_tenant_root() {
        let key = add_tenant_root(&root(), "docs/a.txt");
        assert_eq!(key, "user-1-files/docs/a.txt");
        assert_eq!(strip_tenant_root(&root(), &key), "docs/a.txt");
    }

    #[test]
    fn test_strip_only_removes_leading_root() {
        let key = "other/user-1-files/a.txt";
        assert_eq!(strip_tenant_root(&root(), key), key);
        assert_eq!(
            strip_tenant_root(&root(), "user-1-files/user-1-files/a.txt"),
            "user-1-files/a.txt"
        );
        assert_eq!(strip_tenant_root(&root(), "user-1-filesX/a"), "user-1-filesX/a");
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension(""), "");
        assert_eq!(extension("file"), "");
        assert_eq!(extension("file."), "");
        assert_eq!(extension("dir./file"), "");
        assert_eq!(extension("file.txt"), "txt");
        assert_eq!(extension("dir./file.txt"), "txt");
        assert_eq!(extension("archive.tar.gz"), "gz");
    }

    #[test]
    fn test_parent_and_name() {
        assert_eq!(parent("a/b/c.txt"), "a/b/");
        assert_eq!(name("a/b/c.txt"), "c.txt");
        assert_eq!(parent("a/b/"), "a/");
        assert_eq!(name("a/b/"), "b/");
        assert_eq!(parent("a/"), "");
        assert_eq!(name("a/"), "a/");
        assert_eq!(parent("file"), "");
        assert_eq!(name("file"), "file");
        assert_eq!(parent(""), "");
        assert_eq!(name(""), "");
    }

    #[test]
    fn test_breadcrumbs() {
        let crumbs = breadcrumbs("a/b/c/");
        assert_eq!(crumbs.path, "a/b/c/");
        assert_eq!(crumbs.names, vec!["a", "b", "c"]);
        assert_eq!(crumbs.links, vec!["a/", "a/b/", "a/b/c/"]);
    }

    #[test]
    fn test_breadcrumbs_of_empty_path() {
        let crumbs = breadcrumbs("");
        assert!(crumbs.names.is_empty());
        assert!(crumbs.links.is_empty());
    }

    proptest! {
        #[test]
        fn prop_directory_paths_split_cleanly(p in "[a-z.]{0,4}(/[a-z.]{0,4}){0,4}/") {
            prop_assert!(name(&p).ends_with('/'));
            prop_assert_eq!(format!("{}{}", parent(&p), name(&p)), p);
        }

        #[test]
        fn prop_file_paths_split_cleanly(p in "[a-z.]{0,4}(/[a-z.]{0,4}){0,4}") {
            prop_assert_eq!(format!("{}{}", parent(&p), name(&p)), p);
        }

        #[test]
        fn prop_single_segment_has_no_parent(p in "[a-z.]{1,8}") {
            prop_assert_eq!(parent(&p), "");
            prop_assert_eq!(name(&p), p.as_str());
        }

        #[test]
        fn prop_strip_undoes_add(p in "[a-z./]{0,24}") {
            let key = add_tenant_root(&root(), &p);
            prop_assert_eq!(strip_tenant_root(&root(), &key), p.as_str());
        }

        #[test]
        fn prop_extension_has_no_separator_or_dot(p in "[a-z./]{0,24}") {
            let ext = extension(&p);
            prop_assert!(!ext.contains('/'));
            prop_assert!(!ext.contains('.'));
        }
    }
}
