// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triton-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triton and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Slug normalization and post path derivation.
//!
//! The path pattern `_posts/{date}-{slug}.md` is a contract shared with the
//! static-site tooling that consumes the repository and must be preserved
//! exactly.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::Post;

pub const POSTS_DIR: &str = "_posts";
pub const POST_EXTENSION: &str = "md";
pub const PERMALINK_PREFIX: &str = "/blog/";
pub const FALLBACK_SLUG: &str = "post";

/// Fold one lowercase character of the supported alphabets down to ASCII.
///
/// This is a fixed table covering the Turkish, German, Dutch and French
/// characters that occur in the supported content languages; combining marks
/// from pre-decomposed input are dropped.
fn fold_char(c: char, out: &mut String) {
    match c {
        'ı' => out.push('i'),
        'ğ' => out.push('g'),
        'ş' => out.push('s'),
        'ç' => out.push('c'),
        'ß' => out.push_str("ss"),
        'ä' | 'â' | 'à' | 'á' | 'å' => out.push('a'),
        'é' | 'è' | 'ê' | 'ë' => out.push('e'),
        'í' | 'ì' | 'î' | 'ï' => out.push('i'),
        'ö' | 'ô' | 'ò' | 'ó' => out.push('o'),
        'ü' | 'û' | 'ù' | 'ú' => out.push('u'),
        'ñ' => out.push('n'),
        '\u{0300}'..='\u{036f}' => {}
        _ => out.push(c),
    }
}

/// Normalize arbitrary text into a URL-safe slug.
///
/// Lowercases, folds the supported alphabets to ASCII, drops everything else,
/// and collapses runs of whitespace and hyphens into single hyphens with no
/// leading or trailing separator. Idempotent: the output only contains
/// `[a-z0-9-]`, which the function maps to itself.
pub fn slugify(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());
    for c in text.chars() {
        for lower in c.to_lowercase() {
            fold_char(lower, &mut folded);
        }
    }

    let mut slug = String::with_capacity(folded.len());
    let mut separator_pending = false;
    for c in folded.chars() {
        match c {
            'a'..='z' | '0'..='9' => {
                if separator_pending && !slug.is_empty() {
                    slug.push('-');
                }
                separator_pending = false;
                slug.push(c);
            }
            '-' => separator_pending = true,
            c if c.is_whitespace() => separator_pending = true,
            _ => {}
        }
    }
    slug
}

/// The slug a post serializes under: the manual slug when it normalizes to
/// something non-empty, else the title, else a fixed fallback.
pub fn normalized_slug(slug: &str, title: &str) -> String {
    let primary = slugify(slug);
    if !primary.is_empty() {
        return primary;
    }
    let from_title = slugify(title);
    if from_title.is_empty() {
        FALLBACK_SLUG.to_owned()
    } else {
        from_title
    }
}

pub fn post_path(date: &str, slug: &str) -> String {
    format!("{POSTS_DIR}/{date}-{slug}.{POST_EXTENSION}")
}

pub fn permalink(slug: &str) -> String {
    format!("{PERMALINK_PREFIX}{slug}/")
}

/// The remote path a post currently maps to. Recomputed whenever title, date
/// or slug changes; this is the join key between the editor state and the
/// remote file.
pub fn derived_path(post: &Post) -> String {
    let title = post.title().trim();
    let title = if title.is_empty() { "untitled" } else { title };
    let date = if post.date().is_empty() {
        super::today()
    } else {
        post.date().to_owned()
    };
    let slug = normalized_slug(post.slug(), title);
    post_path(&date, &slug)
}

/// Metadata recovered from a post's file name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMeta {
    pub name: String,
    pub date: String,
    pub slug: String,
}

fn file_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{4}-\d{2}-\d{2})-(.+)\.md$").expect("file name regex")
    })
}

/// Best-effort date and slug from a `{date}-{slug}.md` file name, used as
/// fallback metadata when a document's front matter is incomplete.
pub fn file_meta(path: &str) -> FileMeta {
    let name = path.rsplit('/').next().unwrap_or("").to_owned();
    match file_name_re().captures(&name) {
        Some(caps) => FileMeta {
            date: caps[1].to_owned(),
            slug: caps[2].to_owned(),
            name,
        },
        None => FileMeta {
            date: String::new(),
            slug: name.strip_suffix(".md").unwrap_or(&name).to_owned(),
            name,
        },
    }
}

/// The last non-empty segment of a permalink, or empty.
pub fn slug_from_permalink(permalink: &str) -> String {
    permalink
        .trim()
        .split('/')
        .rev()
        .find(|segment| !segment.is_empty())
        .unwrap_or("")
        .to_owned()
}
