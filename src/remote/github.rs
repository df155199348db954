// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triton-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triton and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! GitHub contents-API implementation of the content host.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::{ContentHost, RemoteError, RemoteFile, RepoInfo};
use crate::model::{ContentHash, EntryKind, ListingEntry};

const API_BASE: &str = "https://api.github.com";
const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";

/// Coordinates of the repository the editor publishes into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoCoordinates {
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

/// Content host backed by the GitHub contents API.
///
/// The bearer token is attached to requests and never logged or persisted.
#[derive(Debug, Clone)]
pub struct GithubHost {
    coordinates: RepoCoordinates,
    token: Option<String>,
    client: reqwest::Client,
    api_base: String,
}

impl GithubHost {
    pub fn new(coordinates: RepoCoordinates, token: Option<String>) -> Self {
        Self {
            coordinates,
            token: token.filter(|token| !token.trim().is_empty()),
            client: reqwest::Client::new(),
            api_base: API_BASE.to_owned(),
        }
    }

    /// Point the host at a different API root (GitHub Enterprise, test
    /// servers).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn coordinates(&self) -> &RepoCoordinates {
        &self.coordinates
    }

    fn repo_url(&self) -> String {
        format!(
            "{}/repos/{}/{}",
            self.api_base,
            encode_segment(&self.coordinates.owner),
            encode_segment(&self.coordinates.repo)
        )
    }

    fn contents_url(&self, path: &str) -> String {
        format!("{}/contents/{}", self.repo_url(), encode_path(path))
    }

    fn ref_query(&self) -> String {
        format!("?ref={}", encode_segment(&self.coordinates.branch))
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, RemoteError> {
        let request = request
            .header("Accept", ACCEPT)
            .header("X-GitHub-Api-Version", API_VERSION);
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        request.send().await.map_err(|err| RemoteError::Transport {
            message: err.to_string(),
        })
    }

    async fn error_for(&self, path: &str, response: reqwest::Response) -> RemoteError {
        let status = response.status().as_u16();
        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|payload| payload.get("message")?.as_str().map(str::to_owned))
            .unwrap_or_default();
        tracing::warn!(path, status, "remote API rejected the request");
        if status == 409 {
            RemoteError::Conflict {
                path: path.to_owned(),
            }
        } else {
            RemoteError::Api { status, message }
        }
    }
}

fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            other => {
                out.push('%');
                out.push_str(&format!("{other:02X}"));
            }
        }
    }
    out
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .map(encode_segment)
        .collect::<Vec<_>>()
        .join("/")
}

fn decode_content(path: &str, encoded: &str) -> Result<String, RemoteError> {
    let compact: String = encoded.split_whitespace().collect();
    let bytes = BASE64
        .decode(compact.as_bytes())
        .map_err(|err| RemoteError::Decode {
            path: path.to_owned(),
            message: err.to_string(),
        })?;
    String::from_utf8(bytes).map_err(|err| RemoteError::Decode {
        path: path.to_owned(),
        message: err.to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct ContentsFile {
    sha: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentsEntry {
    name: String,
    path: String,
    sha: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Serialize)]
struct PutBody<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct DeleteBody<'a> {
    message: &'a str,
    sha: &'a str,
    branch: &'a str,
}

#[derive(Debug, Deserialize)]
struct WriteResponse {
    content: WrittenContent,
}

#[derive(Debug, Deserialize)]
struct WrittenContent {
    sha: String,
}

impl ContentHost for GithubHost {
    async fn repo_info(&self) -> Result<RepoInfo, RemoteError> {
        let response = self.send(self.client.get(self.repo_url())).await?;
        if !response.status().is_success() {
            return Err(self.error_for("", response).await);
        }

        #[derive(Debug, Deserialize)]
        struct Repo {
            full_name: String,
        }

        let repo: Repo = response.json().await.map_err(|err| RemoteError::Transport {
            message: err.to_string(),
        })?;
        Ok(RepoInfo {
            full_name: repo.full_name,
        })
    }

    async fn get_file(&self, path: &str) -> Result<Option<RemoteFile>, RemoteError> {
        let url = format!("{}{}", self.contents_url(path), self.ref_query());
        let response = self.send(self.client.get(url)).await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(self.error_for(path, response).await);
        }

        let file: ContentsFile = response.json().await.map_err(|err| RemoteError::Transport {
            message: err.to_string(),
        })?;
        let content = decode_content(path, file.content.as_deref().unwrap_or(""))?;
        tracing::debug!(path, "fetched remote file");
        Ok(Some(RemoteFile {
            content,
            hash: ContentHash::new(file.sha),
        }))
    }

    async fn list_dir(&self, path: &str) -> Result<Option<Vec<ListingEntry>>, RemoteError> {
        let url = format!("{}{}", self.contents_url(path), self.ref_query());
        let response = self.send(self.client.get(url)).await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(self.error_for(path, response).await);
        }

        // A file path answers with an object instead of an array; treat that
        // like an absent directory.
        let payload: serde_json::Value =
            response.json().await.map_err(|err| RemoteError::Transport {
                message: err.to_string(),
            })?;
        if !payload.is_array() {
            return Ok(None);
        }

        let raw: Vec<ContentsEntry> =
            serde_json::from_value(payload).map_err(|err| RemoteError::Transport {
                message: err.to_string(),
            })?;
        let entries = raw
            .into_iter()
            .map(|entry| ListingEntry {
                name: entry.name,
                path: entry.path,
                content_hash: ContentHash::new(entry.sha),
                kind: match entry.kind.as_str() {
                    "file" => EntryKind::File,
                    "dir" => EntryKind::Dir,
                    _ => EntryKind::Other,
                },
            })
            .collect();
        tracing::debug!(path, "fetched remote listing");
        Ok(Some(entries))
    }

    async fn put_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
        expected_hash: Option<&ContentHash>,
    ) -> Result<ContentHash, RemoteError> {
        if !self.can_write() {
            return Err(RemoteError::Credential);
        }

        let body = PutBody {
            message,
            content: BASE64.encode(content.as_bytes()),
            branch: &self.coordinates.branch,
            sha: expected_hash.map(ContentHash::as_str),
        };
        let response = self
            .send(self.client.put(self.contents_url(path)).json(&body))
            .await?;
        if !response.status().is_success() {
            return Err(self.error_for(path, response).await);
        }

        let written: WriteResponse =
            response.json().await.map_err(|err| RemoteError::Transport {
                message: err.to_string(),
            })?;
        tracing::debug!(path, "wrote remote file");
        Ok(ContentHash::new(written.content.sha))
    }

    async fn delete_file(
        &self,
        path: &str,
        hash: &ContentHash,
        message: &str,
    ) -> Result<(), RemoteError> {
        if !self.can_write() {
            return Err(RemoteError::Credential);
        }

        let body = DeleteBody {
            message,
            sha: hash.as_str(),
            branch: &self.coordinates.branch,
        };
        let response = self
            .send(self.client.delete(self.contents_url(path)).json(&body))
            .await?;
        if !response.status().is_success() {
            return Err(self.error_for(path, response).await);
        }
        tracing::debug!(path, "deleted remote file");
        Ok(())
    }

    fn can_write(&self) -> bool {
        self.token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::{encode_path, encode_segment, GithubHost, RepoCoordinates};
    use crate::remote::ContentHost as _;

    fn coordinates() -> RepoCoordinates {
        RepoCoordinates {
            owner: "someone".to_owned(),
            repo: "someone.github.io".to_owned(),
            branch: "main".to_owned(),
        }
    }

    #[test]
    fn encodes_path_per_segment() {
        assert_eq!(encode_segment("a b"), "a%20b");
        assert_eq!(encode_segment("ünïcode"), "%C3%BCn%C3%AFcode");
        assert_eq!(
            encode_path("_posts/2024-01-05-merhaba dünya.md"),
            "_posts/2024-01-05-merhaba%20d%C3%BCnya.md"
        );
    }

    #[test]
    fn contents_url_shape() {
        let host = GithubHost::new(coordinates(), None);
        assert_eq!(
            host.contents_url("_posts/2024-01-05-x.md"),
            "https://api.github.com/repos/someone/someone.github.io/contents/_posts/2024-01-05-x.md"
        );
        assert_eq!(host.ref_query(), "?ref=main");
    }

    #[test]
    fn blank_token_is_read_only() {
        assert!(!GithubHost::new(coordinates(), None).can_write());
        assert!(!GithubHost::new(coordinates(), Some("   ".to_owned())).can_write());
        assert!(GithubHost::new(coordinates(), Some("token".to_owned())).can_write());
    }

    #[test]
    fn decode_content_strips_embedded_newlines() {
        let decoded = super::decode_content("p", "bWVy\naGFiYQ==\n").expect("decode");
        assert_eq!(decoded, "merhaba");
    }
}
