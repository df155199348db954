// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triton-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triton and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Typed operations over the remote content repository.
//!
//! Not-found is an absent value, never an error. Writes are conditional on a
//! content hash: the store rejects a write whose expected hash no longer
//! matches the file's current version, which is the protocol's actual safety
//! net against concurrent edits.

pub mod github;
pub mod memory;

pub use github::{GithubHost, RepoCoordinates};
pub use memory::MemoryHost;

use std::fmt;

use crate::model::{ContentHash, ListingEntry};

/// A file fetched from the remote store, already decoded to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub content: String,
    pub hash: ContentHash,
}

/// Payload of a connection check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoInfo {
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// A write or delete was attempted without a bearer credential.
    Credential,
    /// The store rejected a guarded write or delete because the file's
    /// current hash no longer matches the supplied one.
    Conflict { path: String },
    /// Any other non-2xx response.
    Api { status: u16, message: String },
    /// The request itself failed before producing a response.
    Transport { message: String },
    /// Content that could not be decoded to text.
    Decode { path: String, message: String },
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Credential => {
                f.write_str("a bearer credential is required for write operations")
            }
            Self::Conflict { path } => {
                write!(f, "remote content at '{path}' changed since it was last read")
            }
            Self::Api { status, message } if message.is_empty() => {
                write!(f, "remote API error {status}")
            }
            Self::Api { status, message } => {
                write!(f, "remote API error {status}: {message}")
            }
            Self::Transport { message } => write!(f, "request failed: {message}"),
            Self::Decode { path, message } => {
                write!(f, "cannot decode content of '{path}': {message}")
            }
        }
    }
}

impl std::error::Error for RemoteError {}

/// Read/write access to the remote documents repository.
///
/// Implementations never persist or inspect the caller's credential beyond
/// attaching it to requests, and must fail writes fast with
/// [`RemoteError::Credential`] before any network I/O when no credential is
/// configured.
#[trait_variant::make(ContentHost: Send)]
pub trait LocalContentHost {
    async fn repo_info(&self) -> Result<RepoInfo, RemoteError>;

    /// `None` on not-found; never an error for a missing file.
    async fn get_file(&self, path: &str) -> Result<Option<RemoteFile>, RemoteError>;

    /// `None` when the directory itself is absent.
    async fn list_dir(&self, path: &str) -> Result<Option<Vec<ListingEntry>>, RemoteError>;

    /// Conditional write. With `expected_hash` set, a hash mismatch yields
    /// [`RemoteError::Conflict`] instead of overwriting. Returns the new
    /// content hash.
    async fn put_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
        expected_hash: Option<&ContentHash>,
    ) -> Result<ContentHash, RemoteError>;

    /// Deleting requires knowing the exact version being removed.
    async fn delete_file(
        &self,
        path: &str,
        hash: &ContentHash,
        message: &str,
    ) -> Result<(), RemoteError>;

    /// Whether a credential is configured; false restricts the host to
    /// read-only operations.
    fn can_write(&self) -> bool;
}
