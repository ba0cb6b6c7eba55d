use super::{prepare_upload, AssetUploader, StoredAsset};
use crate::models::DEFAULT_PUBLIC_UPLOAD_PREFIX;
use crate::{Error, Result};
use async_trait::async_trait;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::fs;
use tracing::info;

/// Stores uploads in a directory the web layer serves verbatim.
pub struct LocalAssetUploader {
    dir: PathBuf,
    public_prefix: String,
}

impl LocalAssetUploader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            public_prefix: DEFAULT_PUBLIC_UPLOAD_PREFIX.to_string(),
        }
    }

    pub fn with_public_prefix(mut self, prefix: String) -> Self {
        self.public_prefix = prefix.trim_end_matches('/').to_string();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn public_prefix(&self) -> &str {
        &self.public_prefix
    }
}

/// Write `contents` to a sibling temp file and move it to `path` only once it
/// is complete. Fails without touching anything if `path` already exists; the
/// temp file is removed on every error path.
fn write_new_file(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist_noclobber(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl AssetUploader for LocalAssetUploader {
    async fn store(&self, bytes: &[u8], original_filename: &str) -> Result<StoredAsset> {
        let filename = prepare_upload(bytes, original_filename)?;

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::upload(format!("create {}: {}", self.dir.display(), e)))?;

        let path = self.dir.join(&filename);
        let contents = bytes.to_vec();
        let target = path.clone();

        tokio::task::spawn_blocking(move || write_new_file(&target, &contents))
            .await
            .map_err(|e| Error::upload(format!("write task join error: {}", e)))?
            .map_err(|e| Error::upload(format!("write {}: {}", path.display(), e)))?;

        info!("Stored upload {} ({} bytes)", path.display(), bytes.len());

        Ok(StoredAsset {
            url: format!("{}/{}", self.public_prefix, filename),
            filename,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_store_creates_directory_and_file() {
        let dir = tempdir().unwrap();
        let upload_dir = dir.path().join("public").join("uploads");
        let uploader = LocalAssetUploader::new(&upload_dir);

        let asset = uploader.store(b"\x89PNG", "My Logo!@#.png").await.unwrap();

        assert!(asset.filename.ends_with("-My_Logo___.png"));
        assert_eq!(asset.url, format!("/uploads/{}", asset.filename));
        assert_eq!(
            std::fs::read(upload_dir.join(&asset.filename)).unwrap(),
            b"\x89PNG"
        );
    }

    #[tokio::test]
    async fn test_store_rejects_empty_payload() {
        let dir = tempdir().unwrap();
        let uploader = LocalAssetUploader::new(dir.path());

        let err = uploader.store(&[], "a.png").await.unwrap_err();
        assert!(matches!(err, Error::NoFile));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_custom_public_prefix() {
        let dir = tempdir().unwrap();
        let uploader =
            LocalAssetUploader::new(dir.path()).with_public_prefix("/static/img/".to_string());

        let asset = uploader.store(b"x", "a.gif").await.unwrap();
        assert!(asset.url.starts_with("/static/img/"));
        assert_eq!(uploader.public_prefix(), "/static/img");
    }

    #[test]
    fn test_failed_write_leaves_no_new_file() {
        let dir = tempdir().unwrap();
        let existing = dir.path().join("1700000000000-a.png");
        std::fs::write(&existing, b"original").unwrap();

        assert!(write_new_file(&existing, b"replacement").is_err());

        assert_eq!(std::fs::read(&existing).unwrap(), b"original");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_store_into_unusable_directory_fails_cleanly() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("uploads");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let err = LocalAssetUploader::new(&blocker)
            .store(b"img", "a.png")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UploadFailed { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
