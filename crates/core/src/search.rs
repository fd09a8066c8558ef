//! Substring search over a tenant's keys.
//!
//! Only names are matched, never object content. One recursive listing of the tenant root is
//! taken and both result sets are computed from that snapshot.

use crate::constants::SEPARATOR;
use crate::paths;
use crate::tenant::TenantRoot;
use crate::view::ViewEntry;
use crate::FileManagerResult;
use std::collections::HashSet;
use std::sync::Arc;
use stowage_storage::ObjectStore;

#[derive(Clone, Debug)]
pub struct SearchService {
    store: Arc<dyn ObjectStore>,
}

impl SearchService {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Finds directories and files whose name contains `query` (case-sensitive).
    ///
    /// Directories come first, each reported once in the order first seen; files follow in
    /// listing order. A directory is found whether it has a placeholder or only holds files.
    /// A blank query matches nothing.
    pub async fn search(&self, root: &TenantRoot, query: &str) -> FileManagerResult<Vec<ViewEntry>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let items = self.store.list_all(&root.key_prefix(), true).await?;

        let mut directories = DirectoryMatches::new(query);
        let mut files = Vec::new();

        for item in &items {
            let relative = paths::strip_tenant_root(root, &item.object_key);
            if relative.is_empty() {
                continue;
            }

            if relative.ends_with(SEPARATOR) {
                directories.scan(relative);
            } else {
                if paths::name(relative).contains(query) {
                    files.push(ViewEntry::file(relative, item.size_bytes));
                }
                directories.scan(paths::parent(relative));
            }
        }

        tracing::debug!(
            "search in {} matched {} directories and {} files",
            root,
            directories.found.len(),
            files.len()
        );

        Ok(directories
            .found
            .into_iter()
            .map(ViewEntry::directory)
            .chain(files)
            .collect())
    }
}

/// Collects every directory along scanned paths whose own segment matches the query.
struct DirectoryMatches<'q> {
    query: &'q str,
    seen: HashSet<String>,
    found: Vec<String>,
}

impl<'q> DirectoryMatches<'q> {
    fn new(query: &'q str) -> Self {
        Self {
            query,
            seen: HashSet::new(),
            found: Vec::new(),
        }
    }

    fn scan(&mut self, directory: &str) {
        let mut cumulative = String::new();
        for segment in directory.split(SEPARATOR).filter(|s| !s.is_empty()) {
            cumulative.push_str(segment);
            cumulative.push(SEPARATOR);
            if segment.contains(self.query) && self.seen.insert(cumulative.clone()) {
                self.found.push(cumulative.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FileManagerError;
    use stowage_storage::{body, MemoryObjectStore, StoreOp};

    async fn setup(keys: &[&str]) -> (Arc<MemoryObjectStore>, SearchService, TenantRoot) {
        let store = Arc::new(MemoryObjectStore::new("test-bucket"));
        for key in keys {
            store.put(key, body::empty(), Some(0)).await.unwrap();
        }
        let service = SearchService::new(store.clone());
        (store, service, TenantRoot::new("user-1-files").unwrap())
    }

    fn paths_of(entries: &[ViewEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.relative_path.as_str()).collect()
    }

    #[tokio::test]
    async fn test_nested_directory_matches() {
        let (_, service, root) = setup(&["user-1-files/dir1/dir/dir1/"]).await;

        let results = service.search(&root, "1").await.unwrap();

        assert_eq!(paths_of(&results), vec!["dir1/", "dir1/dir/dir1/"]);
        assert!(results.iter().all(|e| e.is_directory && e.human_size.is_empty()));
        assert_eq!(results[0].name, "dir1/");
    }

    #[tokio::test]
    async fn test_directories_first_then_files() {
        let (_, service, root) = setup(&[
            "user-1-files/report.txt",
            "user-1-files/reports/",
            "user-1-files/reports/q1.pdf",
            "user-1-files/misc/old-report.doc",
        ])
        .await;

        let results = service.search(&root, "report").await.unwrap();

        assert_eq!(
            paths_of(&results),
            vec!["reports/", "misc/old-report.doc", "report.txt"]
        );
        assert_eq!(results[1].name, "old-report.doc");
    }

    #[tokio::test]
    async fn test_finds_directories_without_placeholder() {
        let (_, service, root) = setup(&["user-1-files/photos/2024/a.jpg"]).await;

        let results = service.search(&root, "2024").await.unwrap();

        assert_eq!(paths_of(&results), vec!["photos/2024/"]);
    }

    #[tokio::test]
    async fn test_directory_reported_once() {
        let (_, service, root) = setup(&[
            "user-1-files/music/",
            "user-1-files/music/a.mp3",
            "user-1-files/music/b.mp3",
        ])
        .await;

        let results = service.search(&root, "music").await.unwrap();

        assert_eq!(paths_of(&results), vec!["music/"]);
    }

    #[tokio::test]
    async fn test_case_sensitive_and_scoped_to_tenant() {
        let (_, service, root) = setup(&[
            "user-1-files/Notes.txt",
            "user-2-files/notes.txt",
        ])
        .await;

        assert!(service.search(&root, "notes").await.unwrap().is_empty());
        assert_eq!(
            paths_of(&service.search(&root, "Notes").await.unwrap()),
            vec!["Notes.txt"]
        );
    }

    #[tokio::test]
    async fn test_file_match_uses_basename_only() {
        let (_, service, root) = setup(&["user-1-files/alpha/beta.txt"]).await;

        let results = service.search(&root, "alpha").await.unwrap();

        assert_eq!(paths_of(&results), vec!["alpha/"]);
    }

    #[tokio::test]
    async fn test_blank_query_skips_store() {
        let (store, service, root) = setup(&["user-1-files/a.txt"]).await;
        store.fail_on(StoreOp::List, "user-1-files/");

        assert!(service.search(&root, "").await.unwrap().is_empty());
        assert!(service.search(&root, "  ").await.unwrap().is_empty());
        assert!(matches!(
            service.search(&root, "a").await,
            Err(FileManagerError::Storage(_))
        ));
    }
}
