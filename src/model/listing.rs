// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triton-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triton and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::hash::ContentHash;

/// What a remote directory entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Other,
}

/// One row of the remote documents directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub path: String,
    pub content_hash: ContentHash,
    pub kind: EntryKind,
}

impl ListingEntry {
    pub fn is_post_file(&self) -> bool {
        self.kind == EntryKind::File && self.name.ends_with(".md")
    }
}

/// Keep only post files, ordered newest-first.
///
/// File names embed an ISO date prefix, so descending lexicographic order
/// equals reverse chronological order for same-length names.
pub fn newest_first_posts(entries: Vec<ListingEntry>) -> Vec<ListingEntry> {
    let mut posts: Vec<ListingEntry> = entries
        .into_iter()
        .filter(ListingEntry::is_post_file)
        .collect();
    posts.sort_by(|a, b| b.name.cmp(&a.name));
    posts
}

#[cfg(test)]
mod tests {
    use super::{newest_first_posts, ContentHash, EntryKind, ListingEntry};

    fn entry(name: &str, kind: EntryKind) -> ListingEntry {
        ListingEntry {
            name: name.to_owned(),
            path: format!("_posts/{name}"),
            content_hash: ContentHash::new("h"),
            kind,
        }
    }

    #[test]
    fn filters_non_posts_and_sorts_newest_first() {
        let entries = vec![
            entry("2024-01-01-old.md", EntryKind::File),
            entry("drafts", EntryKind::Dir),
            entry("notes.txt", EntryKind::File),
            entry("2024-03-10-new.md", EntryKind::File),
        ];

        let posts = newest_first_posts(entries);
        let names: Vec<&str> = posts.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["2024-03-10-new.md", "2024-01-01-old.md"]);
    }
}
