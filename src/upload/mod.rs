//! Binary asset uploads
//!
//! Each upload becomes exactly one new stored object named
//! `{millis}-{sanitized name}`; nothing is ever overwritten or deleted.

pub mod local;
pub mod mock;
pub mod remote;

pub use local::LocalAssetUploader;
pub use mock::MockAssetUploader;
pub use remote::RemoteAssetUploader;

use crate::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredAsset {
    pub filename: String,
    pub url: String,
}

#[async_trait]
pub trait AssetUploader: Send + Sync {
    async fn store(&self, bytes: &[u8], original_filename: &str) -> Result<StoredAsset>;
}

/// Replace every character outside `[A-Za-z0-9.]` with `_`.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        "upload".to_string()
    } else {
        sanitized
    }
}

pub fn storage_filename(original_filename: &str, millis: i64) -> String {
    format!("{}-{}", millis, sanitize_filename(original_filename))
}

/// Validate the payload and pick its storage filename.
pub(crate) fn prepare_upload(bytes: &[u8], original_filename: &str) -> Result<String> {
    if bytes.is_empty() {
        return Err(Error::NoFile);
    }
    Ok(storage_filename(
        original_filename,
        Utc::now().timestamp_millis(),
    ))
}
