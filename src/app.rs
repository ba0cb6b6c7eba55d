//! Service wiring: picks the storage backend and serves the HTTP surface.

use crate::api::{build_router, AppState};
use crate::models::{Config, StorageBackend};
use crate::repo::{GitHubClient, RemoteRepository};
use crate::store::{DocumentStore, LocalDocumentStore, RemoteDocumentStore};
use crate::upload::{AssetUploader, LocalAssetUploader, RemoteAssetUploader};
use crate::Result;
use axum::Router;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// The link-hub backend: one document store and one asset uploader.
pub struct App {
    store: Arc<dyn DocumentStore>,
    uploader: Arc<dyn AssetUploader>,
    public_upload_dir: Option<PathBuf>,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub store: Arc<dyn DocumentStore>,
    pub uploader: Arc<dyn AssetUploader>,
}

impl App {
    /// Build an app from concrete services. `public_upload_dir`, when set, is
    /// served under `/uploads`.
    pub fn with_services(services: AppServices, public_upload_dir: Option<PathBuf>) -> Self {
        Self {
            store: services.store,
            uploader: services.uploader,
            public_upload_dir,
        }
    }

    /// Construct an app from environment configuration (`Config::from_env`).
    pub fn new() -> Result<Self> {
        let config = Config::from_env()?;
        Ok(Self::from_config(&config))
    }

    pub fn from_config(config: &Config) -> Self {
        match config.backend {
            StorageBackend::Local => {
                info!(
                    "Storage backend: local (document {}, uploads {})",
                    config.data_file.display(),
                    config.upload_dir.display()
                );
                Self::with_services(
                    AppServices {
                        store: Arc::new(LocalDocumentStore::new(&config.data_file)),
                        uploader: Arc::new(LocalAssetUploader::new(&config.upload_dir)),
                    },
                    Some(config.upload_dir.clone()),
                )
            }
            StorageBackend::Remote => {
                info!(
                    "Storage backend: remote ({}/{}@{})",
                    config.repo.owner, config.repo.name, config.repo.branch
                );
                if config.github_token.is_none() {
                    warn!("GITHUB_TOKEN not set; reads use the public raw host, saves and uploads will fail");
                }

                let repo: Arc<dyn RemoteRepository> = Arc::new(GitHubClient::new(
                    config.repo.clone(),
                    config.github_token.clone(),
                ));
                Self::with_services(
                    AppServices {
                        store: Arc::new(RemoteDocumentStore::new(
                            repo.clone(),
                            config.repo.document_path.clone(),
                        )),
                        uploader: Arc::new(RemoteAssetUploader::new(
                            repo,
                            config.repo.upload_prefix.clone(),
                        )),
                    },
                    None,
                )
            }
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn uploader(&self) -> &Arc<dyn AssetUploader> {
        &self.uploader
    }

    pub fn router(&self) -> Router {
        build_router(
            AppState {
                store: self.store.clone(),
                uploader: self.uploader.clone(),
            },
            self.public_upload_dir.as_deref(),
        )
    }

    pub async fn serve(&self, addr: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(addr).await?;
        info!("Listening on http://{}", addr);

        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}
