//! Hosted repository access
//!
//! A thin, single-attempt wrapper over the three contents-API calls the
//! document store and the asset uploader need: read a file's revision marker,
//! read its bytes, and commit new bytes guarded by the marker.

pub mod client;
pub mod mock;

pub use client::GitHubClient;
pub use mock::MockRepository;

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Opaque content hash identifying one version of a remote file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RevisionMarker(String);

impl RevisionMarker {
    pub fn new(sha: impl Into<String>) -> Self {
        Self(sha.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RevisionMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Error, Debug)]
pub enum RepoError {
    #[error("repository credentials are not configured")]
    MissingCredentials,

    #[error("request to repository failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("repository API error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("revision conflict on {path} (status {status})")]
    Conflict { path: String, status: u16 },

    #[error("unexpected repository response: {0}")]
    Decode(String),
}

impl RepoError {
    /// Upstream HTTP status, when the failure came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            RepoError::Status { status, .. } | RepoError::Conflict { status, .. } => Some(*status),
            RepoError::Transport(e) => e.status().map(|s| s.as_u16()),
            RepoError::MissingCredentials | RepoError::Decode(_) => None,
        }
    }
}

#[async_trait]
pub trait RemoteRepository: Send + Sync {
    /// Current revision marker of `path`, or `None` when the file does not exist.
    async fn get_metadata(&self, path: &str) -> Result<Option<RevisionMarker>, RepoError>;

    /// Raw bytes of `path`, or `None` when the file does not exist.
    async fn get_content(&self, path: &str) -> Result<Option<Vec<u8>>, RepoError>;

    /// Commit `content` to `path`. With `marker = None` the file must not
    /// exist yet; otherwise the marker must match the current revision.
    async fn put_if_match(
        &self,
        path: &str,
        content: &[u8],
        message: &str,
        marker: Option<&RevisionMarker>,
    ) -> Result<RevisionMarker, RepoError>;

    /// Direct link to the raw file content on the target branch.
    fn raw_url(&self, path: &str) -> String;

    fn has_credentials(&self) -> bool;
}
