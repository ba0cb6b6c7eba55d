//! Persistence for the single configuration document
//!
//! Reads always go to the source of truth; writes replace the whole document.

pub mod local;
pub mod mock;
pub mod remote;

pub use local::LocalDocumentStore;
pub use mock::MockDocumentStore;
pub use remote::RemoteDocumentStore;

use crate::models::ConfigDocument;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn read(&self) -> Result<ConfigDocument>;
    async fn write(&self, doc: &ConfigDocument) -> Result<()>;
}
