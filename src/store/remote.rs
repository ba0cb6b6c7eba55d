use super::DocumentStore;
use crate::models::ConfigDocument;
use crate::repo::{RemoteRepository, RepoError};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const UPDATE_MESSAGE: &str = "Update data.json via Admin Panel";

/// Document kept as a file in a hosted repository.
///
/// Writes fetch the current revision marker and commit against it. The fetch
/// and the commit are separate round trips, so a writer landing in between is
/// only caught if the repository rejects the stale marker.
pub struct RemoteDocumentStore {
    repo: Arc<dyn RemoteRepository>,
    path: String,
}

impl RemoteDocumentStore {
    pub fn new(repo: Arc<dyn RemoteRepository>, path: impl Into<String>) -> Self {
        Self {
            repo,
            path: path.into(),
        }
    }
}

#[async_trait]
impl DocumentStore for RemoteDocumentStore {
    async fn read(&self) -> Result<ConfigDocument> {
        let bytes = self.repo.get_content(&self.path).await.map_err(|e| {
            error!("Failed to fetch {}: {}", self.path, e);
            Error::Unavailable(e.to_string())
        })?;

        match bytes {
            Some(bytes) => ConfigDocument::from_json(&bytes),
            None => {
                warn!("{} does not exist yet, serving defaults", self.path);
                Ok(ConfigDocument::default())
            }
        }
    }

    async fn write(&self, doc: &ConfigDocument) -> Result<()> {
        if !self.repo.has_credentials() {
            return Err(Error::Configuration("GITHUB_TOKEN missing".to_string()));
        }

        let marker = self
            .repo
            .get_metadata(&self.path)
            .await
            .map_err(|e| Error::PersistFailed(format!("fetch revision marker: {}", e)))?;

        let json = doc.to_pretty_json()?;

        let committed = self
            .repo
            .put_if_match(&self.path, &json, UPDATE_MESSAGE, marker.as_ref())
            .await
            .map_err(|e| match e {
                RepoError::MissingCredentials => {
                    Error::Configuration("GITHUB_TOKEN missing".to_string())
                }
                other => Error::PersistFailed(other.to_string()),
            })?;

        info!("Committed {} at revision {}", self.path, committed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::MockRepository;
    use pretty_assertions::assert_eq;

    const PATH: &str = "src/data.json";

    fn store(repo: &MockRepository) -> RemoteDocumentStore {
        RemoteDocumentStore::new(Arc::new(repo.clone()), PATH)
    }

    #[tokio::test]
    async fn test_read_missing_document_serves_defaults_without_writing() {
        let repo = MockRepository::new();

        let doc = store(&repo).read().await.unwrap();
        assert_eq!(doc, ConfigDocument::default());
        assert_eq!(repo.get_put_count(), 0);
    }

    #[tokio::test]
    async fn test_write_creates_then_updates() {
        let repo = MockRepository::new();
        let store = store(&repo);

        let mut doc = ConfigDocument::default();
        store.write(&doc).await.unwrap();

        doc.logo = "https://raw.example.com/new.png".to_string();
        store.write(&doc).await.unwrap();

        assert_eq!(store.read().await.unwrap(), doc);
        assert_eq!(repo.get_put_count(), 2);
    }

    #[tokio::test]
    async fn test_read_malformed() {
        let repo = MockRepository::new().with_file(PATH, b"<html>".to_vec());
        let err = store(&repo).read().await.unwrap_err();
        assert!(matches!(err, Error::MalformedDocument(_)));
    }

    #[tokio::test]
    async fn test_read_upstream_failure_is_unavailable() {
        let repo = MockRepository::new().with_read_failure(500);
        let err = store(&repo).read().await.unwrap_err();
        assert!(matches!(err, Error::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_write_without_credentials() {
        let repo = MockRepository::new().with_credentials(false);
        let err = store(&repo)
            .write(&ConfigDocument::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert_eq!(repo.get_read_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_writer_causes_persist_failure() {
        let racer = ConfigDocument {
            logo: "/uploads/racer.png".to_string(),
            ..ConfigDocument::default()
        };
        let racer_json = racer.to_pretty_json().unwrap();

        let repo = MockRepository::new()
            .with_file(PATH, ConfigDocument::default().to_pretty_json().unwrap())
            .with_interleaved_write(PATH, racer_json.clone());

        let mine = ConfigDocument {
            main_buttons: vec![],
            ..ConfigDocument::default()
        };
        let err = store(&repo).write(&mine).await.unwrap_err();

        assert!(matches!(err, Error::PersistFailed(_)));
        assert_eq!(repo.file(PATH), Some(racer_json));
    }
}
