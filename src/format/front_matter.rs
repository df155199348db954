// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triton-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triton and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Front-matter codec for the on-disk post document format.
//!
//! A document is a front-matter block delimited by `---` marker lines: the
//! reserved keys in fixed order, any preserved extra keys in their original
//! order, then one indented block per language with content, then the closing
//! marker and an empty body.

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use smol_str::SmolStr;

use super::slug::{normalized_slug, permalink};
use crate::model::{Language, Post};

pub const MARKER: &str = "---";
const BLOCK_SENTINEL: &str = "|";
const LAYOUT: &str = "post";

const RESERVED_KEYS: [&str; 5] = ["layout", "title", "date", "slug", "permalink"];

fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

fn is_language_key(key: &str) -> bool {
    Language::from_str(key).is_ok()
}

/// Ordered key/value pairs recovered from a front-matter block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFields {
    fields: Vec<(SmolStr, String)>,
}

impl ParsedFields {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The first value recorded for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn fields(&self) -> &[(SmolStr, String)] {
        &self.fields
    }

    /// Keys outside the reserved and language sets, in original order.
    pub fn extras(&self) -> impl Iterator<Item = (&SmolStr, &str)> {
        self.fields
            .iter()
            .filter(|(key, _)| !is_reserved_key(key) && !is_language_key(key))
            .map(|(key, value)| (key, value.as_str()))
    }

    pub fn language_content(&self, language: Language) -> Option<&str> {
        self.get(language.as_str())
    }
}

fn key_value_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Za-z0-9_-]+):\s*(.*)$").expect("key/value regex"))
}

/// Parse the front-matter block at the start of `text`.
///
/// Deliberately forgiving: input without the opening marker yields the empty
/// result ("no front matter", not an error), and lines that don't match the
/// `key: value` shape are skipped. A block scalar body ends at the first line
/// that is neither blank nor indented by two spaces, so body content whose
/// own indentation steps below two spaces is truncated there; trailing blank
/// lines are trimmed from the block.
pub fn parse_front_matter(text: &str) -> ParsedFields {
    let normalized = text.replace("\r\n", "\n");
    let lines: Vec<&str> = normalized.split('\n').collect();
    if lines.first().copied() != Some(MARKER) {
        return ParsedFields::default();
    }

    let mut fields: Vec<(SmolStr, String)> = Vec::new();
    let mut i = 1;
    while i < lines.len() {
        let line = lines[i];
        if line == MARKER {
            break;
        }

        let Some(caps) = key_value_re().captures(line) else {
            i += 1;
            continue;
        };
        let key = SmolStr::new(&caps[1]);
        let value = caps.get(2).map(|m| m.as_str()).unwrap_or("");

        if value == BLOCK_SENTINEL {
            let mut block: Vec<&str> = Vec::new();
            i += 1;
            while i < lines.len() && lines[i] != MARKER {
                if let Some(rest) = lines[i].strip_prefix("  ") {
                    block.push(rest);
                    i += 1;
                    continue;
                }
                if lines[i].is_empty() {
                    block.push("");
                    i += 1;
                    continue;
                }
                break;
            }
            while block.last() == Some(&"") {
                block.pop();
            }
            fields.push((key, block.join("\n")));
            continue;
        }

        fields.push((key, unquote_scalar(value)));
        i += 1;
    }

    ParsedFields { fields }
}

fn unquote_scalar(value: &str) -> String {
    if value.len() < 2 || !value.starts_with('"') || !value.ends_with('"') {
        return value.to_owned();
    }

    let inner = &value[1..value.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn escape_scalar(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn needs_quoting(value: &str) -> bool {
    value.contains(':') || value.contains('#') || value != value.trim()
}

fn push_block(lines: &mut Vec<String>, key: &str, body: &str) {
    lines.push(format!("{key}: {BLOCK_SENTINEL}"));
    for body_line in body.split('\n') {
        lines.push(format!("  {body_line}"));
    }
}

/// Serialize a post into the on-disk document format.
///
/// Pure function of the post: the date falls back to today when empty, the
/// slug is re-normalized (title fallback included), and only languages with
/// non-empty trimmed content get a block.
pub fn serialize_post(post: &Post) -> String {
    let title = post.title().trim();
    let title = if title.is_empty() { "Untitled" } else { title };
    let date = if post.date().is_empty() {
        super::today()
    } else {
        post.date().to_owned()
    };
    let slug = normalized_slug(post.slug(), title);

    let mut lines: Vec<String> = vec![
        MARKER.to_owned(),
        format!("layout: {LAYOUT}"),
        format!("title: \"{}\"", escape_scalar(title)),
        format!("date: {date}"),
        format!("slug: {slug}"),
        format!("permalink: {}", permalink(&slug)),
    ];

    for (key, value) in post.extra_fields() {
        if value.contains('\n') {
            push_block(&mut lines, key, value);
        } else if needs_quoting(value) {
            lines.push(format!("{key}: \"{}\"", escape_scalar(value)));
        } else {
            lines.push(format!("{key}: {value}"));
        }
    }

    for language in Language::ALL {
        let value = post.content(language).trim();
        if value.is_empty() {
            continue;
        }
        push_block(&mut lines, language.as_str(), value);
    }

    lines.push(MARKER.to_owned());
    lines.push(String::new());
    lines.join("\n")
}
