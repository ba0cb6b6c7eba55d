use super::DocumentStore;
use crate::models::ConfigDocument;
use crate::{Error, Result};
use async_trait::async_trait;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::fs;
use tracing::{info, warn};

/// Document kept as a JSON file on the local filesystem.
pub struct LocalDocumentStore {
    path: PathBuf,
}

impl LocalDocumentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, doc: &ConfigDocument) -> Result<()> {
        let json = doc.to_pretty_json()?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || replace_file(&path, &json))
            .await
            .map_err(|e| Error::PersistFailed(format!("write task join error: {}", e)))?
            .map_err(|e| Error::PersistFailed(format!("write {}: {}", self.path.display(), e)))
    }
}

/// Replace `path` with `contents` by writing a sibling temp file and renaming
/// it over the target. Readers see the old file or the new one, never a mix.
fn replace_file(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl DocumentStore for LocalDocumentStore {
    async fn read(&self) -> Result<ConfigDocument> {
        match fs::read(&self.path).await {
            Ok(bytes) => ConfigDocument::from_json(&bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    "No document at {}, bootstrapping defaults",
                    self.path.display()
                );
                let doc = ConfigDocument::default();
                if let Err(e) = self.persist(&doc).await {
                    warn!("Could not save default document: {}. Serving it anyway.", e);
                }
                Ok(doc)
            }
            Err(e) => Err(Error::Unavailable(format!(
                "read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn write(&self, doc: &ConfigDocument) -> Result<()> {
        self.persist(doc).await?;
        info!("Saved document to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MainButton, Social};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn sample() -> ConfigDocument {
        ConfigDocument {
            logo: "/uploads/1700000000000-banner.png".to_string(),
            affiliate_button: None,
            main_buttons: vec![MainButton {
                id: "line".to_string(),
                label: "LINE".to_string(),
                url: "https://line.me/x".to_string(),
                color: Some("#00c300".to_string()),
            }],
            socials: vec![Social {
                id: "youtube".to_string(),
                url: "https://youtube.com/@x".to_string(),
                active: false,
            }],
        }
    }

    #[tokio::test]
    async fn test_missing_file_bootstraps_defaults() {
        let dir = tempdir().unwrap();
        let store = LocalDocumentStore::new(dir.path().join("src").join("data.json"));

        let doc = store.read().await.unwrap();
        assert_eq!(doc, ConfigDocument::default());
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let store = LocalDocumentStore::new(dir.path().join("data.json"));

        store.write(&sample()).await.unwrap();
        assert_eq!(store.read().await.unwrap(), sample());

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.starts_with("{\n  \"logo\""));
    }

    #[tokio::test]
    async fn test_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = LocalDocumentStore::new(&path).read().await.unwrap_err();
        assert!(matches!(err, Error::MalformedDocument(_)));
    }

    #[tokio::test]
    async fn test_unreadable_path_is_unavailable() {
        let dir = tempdir().unwrap();

        // A directory where the file should be.
        let err = LocalDocumentStore::new(dir.path()).read().await.unwrap_err();
        assert!(matches!(err, Error::Unavailable(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_readers_never_see_a_partial_document() {
        use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
        use std::sync::Arc;

        let dir = tempdir().unwrap();
        let store = LocalDocumentStore::new(dir.path().join("data.json"));

        let large = ConfigDocument {
            main_buttons: (0..5000)
                .map(|i| MainButton {
                    id: i.to_string(),
                    label: format!("Button {}", i),
                    url: format!("https://example.com/{}", i),
                    color: None,
                })
                .collect(),
            ..ConfigDocument::default()
        };
        store.write(&large).await.unwrap();

        let stop = Arc::new(AtomicBool::new(false));
        let torn = Arc::new(AtomicUsize::new(0));
        let reader = {
            let path = store.path().to_path_buf();
            let stop = stop.clone();
            let torn = torn.clone();
            std::thread::spawn(move || loop {
                let bytes = std::fs::read(&path).unwrap();
                if ConfigDocument::from_json(&bytes).is_err() {
                    torn.fetch_add(1, Ordering::SeqCst);
                }
                if stop.load(Ordering::SeqCst) {
                    break;
                }
            })
        };

        for i in 0..40 {
            let doc = if i % 2 == 0 { sample() } else { large.clone() };
            store.write(&doc).await.unwrap();
        }
        stop.store(true, Ordering::SeqCst);
        reader.join().unwrap();

        assert_eq!(torn.load(Ordering::SeqCst), 0);
        assert_eq!(store.read().await.unwrap(), large);
    }

    #[test]
    fn test_failed_replace_keeps_target_and_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("data.json");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), "kept").unwrap();

        assert!(replace_file(&target, b"{}").is_err());

        assert_eq!(std::fs::read_to_string(target.join("keep")).unwrap(), "kept");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_write_keeps_previous_document() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let docs = dir.path().join("docs");
        let store = LocalDocumentStore::new(docs.join("data.json"));
        store.write(&sample()).await.unwrap();

        std::fs::set_permissions(&docs, std::fs::Permissions::from_mode(0o555)).unwrap();
        let result = store.write(&ConfigDocument::default()).await;
        std::fs::set_permissions(&docs, std::fs::Permissions::from_mode(0o755)).unwrap();

        // Permission bits do not bind a privileged user.
        if result.is_ok() {
            return;
        }

        assert!(matches!(result, Err(Error::PersistFailed(_))));
        assert_eq!(store.read().await.unwrap(), sample());
        assert_eq!(std::fs::read_dir(&docs).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_bootstrap_serves_defaults_when_they_cannot_be_saved() {
        let dir = tempdir().unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(dir.path().join("nowhere"), &link).unwrap();

        let store = LocalDocumentStore::new(link.join("data.json"));
        assert_eq!(store.read().await.unwrap(), ConfigDocument::default());
        assert!(!store.path().exists());
    }
}
