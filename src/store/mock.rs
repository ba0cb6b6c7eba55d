use super::DocumentStore;
use crate::models::ConfigDocument;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockDocumentStore {
    doc: Arc<Mutex<ConfigDocument>>,
    fail_reads: Arc<Mutex<bool>>,
    fail_writes: Arc<Mutex<bool>>,
    write_count: Arc<Mutex<usize>>,
}

impl MockDocumentStore {
    pub fn new() -> Self {
        Self {
            doc: Arc::new(Mutex::new(ConfigDocument::default())),
            fail_reads: Arc::new(Mutex::new(false)),
            fail_writes: Arc::new(Mutex::new(false)),
            write_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_document(self, doc: ConfigDocument) -> Self {
        *self.doc.lock().unwrap() = doc;
        self
    }

    pub fn with_read_failure(self, should_fail: bool) -> Self {
        *self.fail_reads.lock().unwrap() = should_fail;
        self
    }

    pub fn with_write_failure(self, should_fail: bool) -> Self {
        *self.fail_writes.lock().unwrap() = should_fail;
        self
    }

    pub fn document(&self) -> ConfigDocument {
        self.doc.lock().unwrap().clone()
    }

    pub fn get_write_count(&self) -> usize {
        *self.write_count.lock().unwrap()
    }
}

impl Default for MockDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MockDocumentStore {
    async fn read(&self) -> Result<ConfigDocument> {
        if *self.fail_reads.lock().unwrap() {
            return Err(Error::Unavailable("Mock failure".to_string()));
        }
        Ok(self.document())
    }

    async fn write(&self, doc: &ConfigDocument) -> Result<()> {
        if *self.fail_writes.lock().unwrap() {
            return Err(Error::PersistFailed("Mock failure".to_string()));
        }
        *self.write_count.lock().unwrap() += 1;
        *self.doc.lock().unwrap() = doc.clone();
        Ok(())
    }
}
