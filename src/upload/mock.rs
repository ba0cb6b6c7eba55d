use super::{prepare_upload, AssetUploader, StoredAsset};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockAssetUploader {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    base_url: String,
    failure_status: Arc<Mutex<Option<u16>>>,
}

impl MockAssetUploader {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            base_url: "/uploads".to_string(),
            failure_status: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_failure(self, status: u16) -> Self {
        *self.failure_status.lock().unwrap() = Some(status);
        self
    }

    pub fn get_files(&self) -> HashMap<String, Vec<u8>> {
        self.files.lock().unwrap().clone()
    }
}

impl Default for MockAssetUploader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssetUploader for MockAssetUploader {
    async fn store(&self, bytes: &[u8], original_filename: &str) -> Result<StoredAsset> {
        let filename = prepare_upload(bytes, original_filename)?;

        if let Some(status) = *self.failure_status.lock().unwrap() {
            return Err(Error::UploadFailed {
                status: Some(status),
                message: "Mock failure".to_string(),
            });
        }

        self.files
            .lock()
            .unwrap()
            .insert(filename.clone(), bytes.to_vec());

        Ok(StoredAsset {
            url: format!("{}/{}", self.base_url, filename),
            filename,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_uploader_records_files() {
        let uploader = MockAssetUploader::new().with_base_url("https://assets.test".to_string());

        let asset = uploader.store(b"img", "x.png").await.unwrap();
        assert_eq!(asset.url, format!("https://assets.test/{}", asset.filename));
        assert_eq!(uploader.get_files().get(&asset.filename), Some(&b"img".to_vec()));
    }

    #[tokio::test]
    async fn test_mock_uploader_failure() {
        let uploader = MockAssetUploader::new().with_failure(500);
        let err = uploader.store(b"img", "x.png").await.unwrap_err();
        assert!(matches!(err, Error::UploadFailed { status: Some(500), .. }));
        assert!(uploader.get_files().is_empty());
    }
}
