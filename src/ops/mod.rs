// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triton-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triton and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Editor transitions and the publish/rename/delete/load protocol.
//!
//! Remote mutations run the hash-guarded optimistic pattern: read, compare
//! the remembered hash, conditionally write. The conditional write is the
//! actual safety net; the pre-check only produces a friendlier error before
//! anything is mutated. Conflicts are values, not panics, so every caller
//! handles the conflict branch.
//!
//! Operations never touch the draft store or the listing watcher; a
//! successful publish, delete or load is the caller's cue to clear the draft
//! slot and refresh the listing.

use std::fmt;

use chrono::NaiveDate;

use crate::format::{self, front_matter, slug};
use crate::model::{ContentHash, Language, Post};
use crate::remote::{ContentHost, RemoteError};

/// A single field-level edit coming from the interaction flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Title(String),
    Date(String),
    Slug(String),
    ActiveLanguage(Language),
    /// New text for the active language's buffer.
    Content(String),
}

/// Apply one edit, keeping the auto-slug bookkeeping consistent: the slug
/// follows the title until the user types one, and clearing the slug hands
/// it back to the title.
pub fn apply_input(post: &mut Post, input: Input) {
    match input {
        Input::Title(title) => {
            post.set_title(title);
            if !post.manual_slug() {
                post.set_slug(slug::slugify(post.title()));
            }
        }
        Input::Date(date) => post.set_date(date),
        Input::Slug(value) => {
            let manual = !value.trim().is_empty();
            post.set_manual_slug(manual);
            if manual {
                post.set_slug(value);
            } else {
                post.set_slug(slug::slugify(post.title()));
            }
        }
        Input::ActiveLanguage(language) => post.set_active_language(language),
        Input::Content(content) => {
            let language = post.active_language();
            post.set_content(language, content);
        }
    }
}

/// Back to a blank document dated today.
pub fn reset(post: &mut Post) {
    *post = Post::new();
    post.set_date(format::today());
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingTitle,
    NoContent,
    InvalidDate { date: String },
    FutureDate { date: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTitle => f.write_str("a title is required"),
            Self::NoContent => f.write_str("at least one language needs content"),
            Self::InvalidDate { date } => write!(f, "'{date}' is not a valid ISO date"),
            Self::FutureDate { date } => write!(
                f,
                "'{date}' is in the future; future-dated posts stay hidden, use today or a past date"
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Checks that must pass before any network call is made.
pub fn validate_for_publish(post: &Post) -> Result<(), ValidationError> {
    if post.title().trim().is_empty() {
        return Err(ValidationError::MissingTitle);
    }

    if !post.date().is_empty() {
        let date = NaiveDate::parse_from_str(post.date(), "%Y-%m-%d").map_err(|_| {
            ValidationError::InvalidDate {
                date: post.date().to_owned(),
            }
        })?;
        if date > chrono::Local::now().date_naive() {
            return Err(ValidationError::FutureDate {
                date: post.date().to_owned(),
            });
        }
    }

    if !post.has_any_content() {
        return Err(ValidationError::NoContent);
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishOptions {
    /// Allow overwriting a file that already exists at the target path but
    /// belongs to a different logical document. Off by default; the caller
    /// asks the user and retries.
    pub overwrite_target: bool,
}

/// Outcome of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub path: String,
    pub hash: ContentHash,
    /// Whether the target path was newly created.
    pub created: bool,
    /// A rename whose trailing delete failed leaves the old file behind;
    /// the leftover is reported, not rolled back.
    pub leftover: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    Validation(ValidationError),
    Credential,
    /// The bound file no longer exists remotely.
    RemoteMissing { path: String },
    /// The remote hash moved under us.
    Conflict { path: String },
    /// The target path already holds an unrelated file and overwriting was
    /// not confirmed.
    TargetOccupied { path: String },
    Remote(RemoteError),
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(err) => err.fmt(f),
            Self::Credential => f.write_str("a bearer credential is required to publish"),
            Self::RemoteMissing { path } => write!(
                f,
                "'{path}' no longer exists remotely; reload the document before publishing"
            ),
            Self::Conflict { path } => write!(
                f,
                "'{path}' was modified remotely since it was last read; reload to pick up the changes"
            ),
            Self::TargetOccupied { path } => {
                write!(f, "'{path}' already exists; confirm overwriting it")
            }
            Self::Remote(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for PublishError {}

impl From<ValidationError> for PublishError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<RemoteError> for PublishError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Credential => Self::Credential,
            RemoteError::Conflict { path } => Self::Conflict { path },
            other => Self::Remote(other),
        }
    }
}

/// Create or update the remote file for `post`, renaming when the derived
/// path moved away from the bound one.
///
/// On success the post is rebound to the written path and fresh hash.
pub async fn publish<H: ContentHost>(
    post: &mut Post,
    host: &H,
    options: &PublishOptions,
) -> Result<Published, PublishError> {
    validate_for_publish(post)?;
    if !host.can_write() {
        return Err(PublishError::Credential);
    }

    let path = format::derived_path(post);
    let document = front_matter::serialize_post(post);
    let binding = post.remote().cloned();

    match binding {
        Some(binding) if binding.path() == path => {
            let current = host
                .get_file(&path)
                .await?
                .ok_or_else(|| PublishError::RemoteMissing { path: path.clone() })?;
            if let Some(remembered) = binding.content_hash() {
                if current.hash != *remembered {
                    return Err(PublishError::Conflict { path });
                }
            }
            let expected = binding
                .content_hash()
                .cloned()
                .unwrap_or_else(|| current.hash.clone());
            let hash = host
                .put_file(
                    &path,
                    &document,
                    &format!("Update post: {path}"),
                    Some(&expected),
                )
                .await?;
            post.bind(path.clone(), Some(hash.clone()));
            tracing::debug!(%path, "updated post in place");
            Ok(Published {
                path,
                hash,
                created: false,
                leftover: None,
            })
        }
        Some(binding) => {
            // Rename: the source must still be where we left it.
            let old_path = binding.path().to_owned();
            let source = host
                .get_file(&old_path)
                .await?
                .ok_or_else(|| PublishError::RemoteMissing {
                    path: old_path.clone(),
                })?;
            if let Some(remembered) = binding.content_hash() {
                if source.hash != *remembered {
                    return Err(PublishError::Conflict { path: old_path });
                }
            }

            let occupant = host.get_file(&path).await?;
            if occupant.is_some() && !options.overwrite_target {
                return Err(PublishError::TargetOccupied { path });
            }

            let message = if occupant.is_some() {
                format!("Update post: {path}")
            } else {
                format!("Create post: {path}")
            };
            let hash = host
                .put_file(
                    &path,
                    &document,
                    &message,
                    occupant.as_ref().map(|file| &file.hash),
                )
                .await?;

            // The new file exists from here on; a failed trailing delete is
            // a reported leftover, never a rollback.
            let leftover = match host
                .delete_file(
                    &old_path,
                    &source.hash,
                    &format!("Delete old renamed post: {old_path}"),
                )
                .await
            {
                Ok(()) => None,
                Err(err) => {
                    tracing::warn!(%old_path, error = %err, "old file left behind after rename");
                    Some(format!("old file '{old_path}' could not be deleted: {err}"))
                }
            };

            let created = occupant.is_none();
            post.bind(path.clone(), Some(hash.clone()));
            tracing::debug!(from = %old_path, to = %path, "renamed post");
            Ok(Published {
                path,
                hash,
                created,
                leftover,
            })
        }
        None => {
            let occupant = host.get_file(&path).await?;
            if occupant.is_some() && !options.overwrite_target {
                return Err(PublishError::TargetOccupied { path });
            }

            let message = if occupant.is_some() {
                format!("Update post: {path}")
            } else {
                format!("Create post: {path}")
            };
            let hash = host
                .put_file(
                    &path,
                    &document,
                    &message,
                    occupant.as_ref().map(|file| &file.hash),
                )
                .await?;

            let created = occupant.is_none();
            post.bind(path.clone(), Some(hash.clone()));
            tracing::debug!(%path, "published new post");
            Ok(Published {
                path,
                hash,
                created,
                leftover: None,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteError {
    Credential,
    /// Nothing is published at the selected path.
    Missing { path: String },
    Remote(RemoteError),
}

impl fmt::Display for DeleteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Credential => f.write_str("a bearer credential is required to delete"),
            Self::Missing { path } => write!(f, "'{path}' was not found remotely"),
            Self::Remote(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for DeleteError {}

impl From<RemoteError> for DeleteError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Credential => Self::Credential,
            other => Self::Remote(other),
        }
    }
}

/// Delete the post's remote file and reset the editor state.
///
/// Destructive intent is confirmed by the caller, so deletion skips the
/// optimistic pre-check: the remembered hash is used when present, otherwise
/// a fresh one is fetched. Returns the deleted path.
pub async fn delete<H: ContentHost>(post: &mut Post, host: &H) -> Result<String, DeleteError> {
    if !host.can_write() {
        return Err(DeleteError::Credential);
    }

    let (path, remembered) = match post.remote() {
        Some(binding) => (
            binding.path().to_owned(),
            binding.content_hash().cloned(),
        ),
        None => (format::derived_path(post), None),
    };

    let hash = match remembered {
        Some(hash) => hash,
        None => match host.get_file(&path).await? {
            Some(file) => file.hash,
            None => return Err(DeleteError::Missing { path }),
        },
    };

    host.delete_file(&path, &hash, &format!("Delete post: {path}"))
        .await?;
    reset(post);
    tracing::debug!(%path, "deleted post");
    Ok(path)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    NotFound { path: String },
    Remote(RemoteError),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { path } => write!(f, "'{path}' was not found remotely"),
            Self::Remote(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<RemoteError> for LoadError {
    fn from(err: RemoteError) -> Self {
        Self::Remote(err)
    }
}

/// Rebuild a post from a parsed document, with file-name fallbacks for the
/// date and slug. The result is unbound; `load` binds it afterwards.
pub fn post_from_document(path: &str, content: &str) -> Post {
    let parsed = front_matter::parse_front_matter(content);
    let meta = slug::file_meta(path);

    let slug_value = parsed
        .get("slug")
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .or_else(|| {
            let from_permalink = slug::slug_from_permalink(parsed.get("permalink").unwrap_or(""));
            if from_permalink.is_empty() {
                None
            } else {
                Some(from_permalink)
            }
        })
        .unwrap_or(meta.slug);

    let date = parsed
        .get("date")
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .unwrap_or(meta.date);
    let date = if date.is_empty() { format::today() } else { date };

    let mut post = Post::new();
    post.set_title(parsed.get("title").unwrap_or("").to_owned());
    post.set_date(date);
    post.set_slug(slug_value);
    post.set_manual_slug(true);
    for (key, value) in parsed.extras() {
        post.push_extra_field(key.clone(), value);
    }
    for language in Language::ALL {
        if let Some(content) = parsed.language_content(language) {
            post.set_content(language, content);
        }
    }
    post.set_active_language(post.first_language_with_content());
    post
}

/// Bind the editor to an existing remote document: fetch, decode, parse,
/// and record the fetched hash as the new baseline.
pub async fn load<H: ContentHost>(
    post: &mut Post,
    host: &H,
    path: &str,
) -> Result<(), LoadError> {
    let file = host
        .get_file(path)
        .await?
        .ok_or_else(|| LoadError::NotFound {
            path: path.to_owned(),
        })?;

    let mut next = post_from_document(path, &file.content);
    next.bind(path, Some(file.hash));
    *post = next;
    tracing::debug!(%path, "loaded post");
    Ok(())
}
