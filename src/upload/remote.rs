use super::{prepare_upload, AssetUploader, StoredAsset};
use crate::repo::{RemoteRepository, RepoError};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};

/// Commits uploads as new files in the hosted repository.
pub struct RemoteAssetUploader {
    repo: Arc<dyn RemoteRepository>,
    prefix: String,
}

impl RemoteAssetUploader {
    pub fn new(repo: Arc<dyn RemoteRepository>, prefix: impl Into<String>) -> Self {
        Self {
            repo,
            prefix: prefix.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl AssetUploader for RemoteAssetUploader {
    async fn store(&self, bytes: &[u8], original_filename: &str) -> Result<StoredAsset> {
        let filename = prepare_upload(bytes, original_filename)?;

        if !self.repo.has_credentials() {
            return Err(Error::Configuration("GITHUB_TOKEN missing".to_string()));
        }

        let path = format!("{}/{}", self.prefix, filename);
        let message = format!("Upload {} via Admin Panel", filename);

        self.repo
            .put_if_match(&path, bytes, &message, None)
            .await
            .map_err(|e| match e {
                RepoError::MissingCredentials => {
                    Error::Configuration("GITHUB_TOKEN missing".to_string())
                }
                other => {
                    error!("Failed to commit upload {}: {}", path, other);
                    Error::UploadFailed {
                        status: other.status(),
                        message: other.to_string(),
                    }
                }
            })?;

        info!("Committed upload {} ({} bytes)", path, bytes.len());

        Ok(StoredAsset {
            url: self.repo.raw_url(&path),
            filename,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::MockRepository;

    fn uploader(repo: &MockRepository) -> RemoteAssetUploader {
        RemoteAssetUploader::new(Arc::new(repo.clone()), "public/uploads/")
    }

    #[tokio::test]
    async fn test_store_commits_new_file() {
        let repo = MockRepository::new();

        let asset = uploader(&repo).store(b"gif89a", "logo.gif").await.unwrap();

        let path = format!("public/uploads/{}", asset.filename);
        assert_eq!(repo.file(&path), Some(b"gif89a".to_vec()));
        assert_eq!(
            asset.url,
            format!("https://raw.mock-repo.example.com/owner/site/main/{}", path)
        );
    }

    #[tokio::test]
    async fn test_store_without_credentials() {
        let repo = MockRepository::new().with_credentials(false);

        let err = uploader(&repo).store(b"x", "a.png").await.unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(repo.get_files().is_empty());
    }

    #[tokio::test]
    async fn test_store_surfaces_upstream_status() {
        let repo = MockRepository::new().with_write_failure(502);

        let err = uploader(&repo).store(b"x", "a.png").await.unwrap_err();
        assert!(matches!(
            err,
            Error::UploadFailed {
                status: Some(502),
                ..
            }
        ));
        assert!(repo.get_files().is_empty());
    }
}
