// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triton-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triton and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use smol_str::SmolStr;

use super::hash::ContentHash;
use super::language::Language;

/// The identity of the remote file a post corresponds to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBinding {
    path: String,
    content_hash: Option<ContentHash>,
}

impl RemoteBinding {
    pub fn new(path: impl Into<String>, content_hash: Option<ContentHash>) -> Self {
        Self {
            path: path.into(),
            content_hash,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn content_hash(&self) -> Option<&ContentHash> {
        self.content_hash.as_ref()
    }
}

/// The single in-memory working document.
///
/// A post with no binding is new and unpublished; a bound post carries the
/// path and hash of the remote file it was last read from or written to.
/// Only the main interaction flow mutates a `Post`; the draft store and the
/// publish protocol read it, and the protocol rebinds it on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    title: String,
    date: String,
    slug: String,
    manual_slug: bool,
    active_language: Language,
    content_by_language: BTreeMap<Language, String>,
    extra_fields: Vec<(SmolStr, String)>,
    remote: Option<RemoteBinding>,
}

impl Post {
    pub fn new() -> Self {
        let mut content_by_language = BTreeMap::new();
        for language in Language::ALL {
            content_by_language.insert(language, String::new());
        }
        Self {
            title: String::new(),
            date: String::new(),
            slug: String::new(),
            manual_slug: false,
            active_language: Language::Tr,
            content_by_language,
            extra_fields: Vec::new(),
            remote: None,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// ISO `YYYY-MM-DD`, or empty when never set. Kept as text on purpose:
    /// a stored calendar value must never be shifted across time zones.
    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn set_date(&mut self, date: impl Into<String>) {
        self.date = date.into();
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn set_slug(&mut self, slug: impl Into<String>) {
        self.slug = slug.into();
    }

    /// Whether the slug was edited by hand. While false, the slug follows
    /// the title.
    pub fn manual_slug(&self) -> bool {
        self.manual_slug
    }

    pub fn set_manual_slug(&mut self, manual: bool) {
        self.manual_slug = manual;
    }

    pub fn active_language(&self) -> Language {
        self.active_language
    }

    pub fn set_active_language(&mut self, language: Language) {
        self.active_language = language;
    }

    pub fn content(&self, language: Language) -> &str {
        self.content_by_language
            .get(&language)
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn set_content(&mut self, language: Language, content: impl Into<String>) {
        self.content_by_language.insert(language, content.into());
    }

    pub fn content_by_language(&self) -> &BTreeMap<Language, String> {
        &self.content_by_language
    }

    pub fn has_any_content(&self) -> bool {
        Language::ALL
            .iter()
            .any(|language| !self.content(*language).trim().is_empty())
    }

    pub fn first_language_with_content(&self) -> Language {
        Language::ALL
            .into_iter()
            .find(|language| !self.content(*language).is_empty())
            .unwrap_or(Language::Tr)
    }

    /// Front-matter keys outside the reserved set, in their original order.
    pub fn extra_fields(&self) -> &[(SmolStr, String)] {
        &self.extra_fields
    }

    pub fn push_extra_field(&mut self, key: impl Into<SmolStr>, value: impl Into<String>) {
        self.extra_fields.push((key.into(), value.into()));
    }

    pub fn set_extra_fields(&mut self, extra_fields: Vec<(SmolStr, String)>) {
        self.extra_fields = extra_fields;
    }

    pub fn remote(&self) -> Option<&RemoteBinding> {
        self.remote.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.remote.is_some()
    }

    pub fn bind(&mut self, path: impl Into<String>, content_hash: Option<ContentHash>) {
        self.remote = Some(RemoteBinding::new(path, content_hash));
    }

    pub fn clear_remote(&mut self) {
        self.remote = None;
    }
}

impl Default for Post {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{Language, Post};

    #[test]
    fn new_post_is_blank_and_unbound() {
        let post = Post::new();
        assert!(post.title().is_empty());
        assert!(post.date().is_empty());
        assert!(!post.is_bound());
        assert!(!post.has_any_content());
        assert_eq!(post.active_language(), Language::Tr);
        for language in Language::ALL {
            assert_eq!(post.content(language), "");
        }
    }

    #[test]
    fn first_language_with_content_follows_priority_order() {
        let mut post = Post::new();
        assert_eq!(post.first_language_with_content(), Language::Tr);

        post.set_content(Language::Nl, "hallo");
        assert_eq!(post.first_language_with_content(), Language::Nl);

        post.set_content(Language::De, "hallo");
        assert_eq!(post.first_language_with_content(), Language::De);

        post.set_content(Language::Tr, "merhaba");
        assert_eq!(post.first_language_with_content(), Language::Tr);
    }

    #[test]
    fn bind_and_clear_remote() {
        let mut post = Post::new();
        post.bind("_posts/2024-01-05-x.md", None);
        assert!(post.is_bound());
        assert_eq!(post.remote().unwrap().path(), "_posts/2024-01-05-x.md");
        assert!(post.remote().unwrap().content_hash().is_none());

        post.clear_remote();
        assert!(!post.is_bound());
    }
}
