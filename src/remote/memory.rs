// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triton-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triton and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! In-memory content host used by tests and the CLI demo mode.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{ContentHost, RemoteError, RemoteFile, RepoInfo};
use crate::model::{ContentHash, EntryKind, ListingEntry};

#[derive(Debug, Default)]
struct MemoryState {
    files: BTreeMap<String, (String, u64)>,
    next_version: u64,
}

impl MemoryState {
    fn store(&mut self, path: &str, content: &str) -> ContentHash {
        self.next_version += 1;
        let version = self.next_version;
        self.files.insert(path.to_owned(), (content.to_owned(), version));
        hash_of(version)
    }
}

fn hash_of(version: u64) -> ContentHash {
    ContentHash::new(format!("v{version:08}"))
}

/// A content host over an in-process map, with version-counter hashes.
///
/// `insert_raw` mutates files out-of-band, which is how tests simulate a
/// concurrent editor moving a file's hash under the protocol.
#[derive(Debug, Default)]
pub struct MemoryHost {
    state: Mutex<MemoryState>,
    calls: AtomicUsize,
    read_only: bool,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Self::default()
        }
    }

    /// A host pre-populated with a couple of posts, for the CLI demo mode.
    pub fn seeded() -> Self {
        let host = Self::new();
        host.insert_raw(
            "_posts/2024-01-05-merhaba-dunya.md",
            "---\nlayout: post\ntitle: \"Merhaba Dünya\"\ndate: 2024-01-05\nslug: merhaba-dunya\npermalink: /blog/merhaba-dunya/\ntr: |\n  Merhaba!\nen: |\n  Hello!\n---\n",
        );
        host.insert_raw(
            "_posts/2024-02-11-zweiter-beitrag.md",
            "---\nlayout: post\ntitle: \"Zweiter Beitrag\"\ndate: 2024-02-11\nslug: zweiter-beitrag\npermalink: /blog/zweiter-beitrag/\nde: |\n  Hallo nochmal.\n---\n",
        );
        host
    }

    /// Write a file directly, bypassing the host protocol. Returns the new
    /// hash.
    pub fn insert_raw(&self, path: &str, content: &str) -> ContentHash {
        let mut state = self.state.lock().expect("memory host lock poisoned");
        state.store(path, content)
    }

    /// Current content and hash of a file, if present.
    pub fn raw(&self, path: &str) -> Option<(String, ContentHash)> {
        let state = self.state.lock().expect("memory host lock poisoned");
        state
            .files
            .get(path)
            .map(|(content, version)| (content.clone(), hash_of(*version)))
    }

    /// How many host operations have run; lets tests assert an operation was
    /// rejected before reaching the host at all.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl ContentHost for MemoryHost {
    async fn repo_info(&self) -> Result<RepoInfo, RemoteError> {
        self.record_call();
        Ok(RepoInfo {
            full_name: "demo/demo".to_owned(),
        })
    }

    async fn get_file(&self, path: &str) -> Result<Option<RemoteFile>, RemoteError> {
        self.record_call();
        let state = self.state.lock().expect("memory host lock poisoned");
        Ok(state.files.get(path).map(|(content, version)| RemoteFile {
            content: content.clone(),
            hash: hash_of(*version),
        }))
    }

    async fn list_dir(&self, path: &str) -> Result<Option<Vec<ListingEntry>>, RemoteError> {
        self.record_call();
        let state = self.state.lock().expect("memory host lock poisoned");
        let prefix = format!("{path}/");
        let entries: Vec<ListingEntry> = state
            .files
            .iter()
            .filter_map(|(file_path, (_, version))| {
                let rest = file_path.strip_prefix(&prefix)?;
                if rest.is_empty() || rest.contains('/') {
                    return None;
                }
                Some(ListingEntry {
                    name: rest.to_owned(),
                    path: file_path.clone(),
                    content_hash: hash_of(*version),
                    kind: EntryKind::File,
                })
            })
            .collect();
        if entries.is_empty() {
            return Ok(None);
        }
        Ok(Some(entries))
    }

    async fn put_file(
        &self,
        path: &str,
        content: &str,
        _message: &str,
        expected_hash: Option<&ContentHash>,
    ) -> Result<ContentHash, RemoteError> {
        self.record_call();
        if self.read_only {
            return Err(RemoteError::Credential);
        }

        let mut state = self.state.lock().expect("memory host lock poisoned");
        let current = state.files.get(path).map(|(_, version)| hash_of(*version));
        match (current, expected_hash) {
            (Some(current), Some(expected)) if current != *expected => {
                return Err(RemoteError::Conflict {
                    path: path.to_owned(),
                })
            }
            // Blind writes over existing content and guarded writes against a
            // vanished file are both version mismatches.
            (Some(_), None) | (None, Some(_)) => {
                return Err(RemoteError::Conflict {
                    path: path.to_owned(),
                })
            }
            _ => {}
        }
        Ok(state.store(path, content))
    }

    async fn delete_file(
        &self,
        path: &str,
        hash: &ContentHash,
        _message: &str,
    ) -> Result<(), RemoteError> {
        self.record_call();
        if self.read_only {
            return Err(RemoteError::Credential);
        }

        let mut state = self.state.lock().expect("memory host lock poisoned");
        let Some((_, version)) = state.files.get(path) else {
            return Err(RemoteError::Api {
                status: 404,
                message: format!("{path} not found"),
            });
        };
        if hash_of(*version) != *hash {
            return Err(RemoteError::Conflict {
                path: path.to_owned(),
            });
        }
        state.files.remove(path);
        Ok(())
    }

    fn can_write(&self) -> bool {
        !self.read_only
    }
}

#[cfg(test)]
mod tests {
    use super::{ContentHost, MemoryHost, RemoteError};
    use crate::model::ContentHash;

    #[tokio::test]
    async fn get_and_put_round_trip() {
        let host = MemoryHost::new();
        assert_eq!(host.get_file("_posts/a.md").await.unwrap(), None);

        let hash = host
            .put_file("_posts/a.md", "body", "Create post: _posts/a.md", None)
            .await
            .unwrap();
        let file = host.get_file("_posts/a.md").await.unwrap().unwrap();
        assert_eq!(file.content, "body");
        assert_eq!(file.hash, hash);
    }

    #[tokio::test]
    async fn guarded_put_rejects_stale_hash() {
        let host = MemoryHost::new();
        let stale = host.insert_raw("_posts/a.md", "one");
        host.insert_raw("_posts/a.md", "two");

        let err = host
            .put_file("_posts/a.md", "three", "Update post: _posts/a.md", Some(&stale))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Conflict { .. }));
        assert_eq!(host.raw("_posts/a.md").unwrap().0, "two");
    }

    #[tokio::test]
    async fn blind_put_over_existing_file_is_a_conflict() {
        let host = MemoryHost::new();
        host.insert_raw("_posts/a.md", "one");
        let err = host
            .put_file("_posts/a.md", "two", "Create post: _posts/a.md", None)
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Conflict { .. }));
    }

    #[tokio::test]
    async fn delete_requires_the_current_hash() {
        let host = MemoryHost::new();
        let hash = host.insert_raw("_posts/a.md", "one");
        host.delete_file("_posts/a.md", &hash, "Delete post: _posts/a.md")
            .await
            .unwrap();
        assert_eq!(host.raw("_posts/a.md"), None);

        let err = host
            .delete_file("_posts/a.md", &ContentHash::new("v0"), "Delete post")
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Api { status: 404, .. }));
    }

    #[tokio::test]
    async fn list_dir_returns_direct_children_only() {
        let host = MemoryHost::new();
        host.insert_raw("_posts/2024-01-01-a.md", "a");
        host.insert_raw("_posts/drafts/2024-01-02-b.md", "b");
        host.insert_raw("about.md", "c");

        let entries = host.list_dir("_posts").await.unwrap().unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["2024-01-01-a.md"]);

        assert_eq!(host.list_dir("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn read_only_host_rejects_writes() {
        let host = MemoryHost::read_only();
        assert!(!host.can_write());
        let err = host
            .put_file("_posts/a.md", "x", "Create post: _posts/a.md", None)
            .await
            .unwrap_err();
        assert_eq!(err, RemoteError::Credential);
    }
}
