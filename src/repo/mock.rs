use super::{RemoteRepository, RepoError, RevisionMarker};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory repository that enforces the same revision-marker rules as the
/// hosted contents API.
#[derive(Clone)]
pub struct MockRepository {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    raw_base: String,
    authenticated: bool,
    read_status: Arc<Mutex<Option<u16>>>,
    write_status: Arc<Mutex<Option<u16>>>,
    interleaved_write: Arc<Mutex<Option<(String, Vec<u8>)>>>,
    put_count: Arc<Mutex<usize>>,
    read_count: Arc<Mutex<usize>>,
}

/// Content hash used as the revision marker for stored files.
pub fn content_marker(content: &[u8]) -> RevisionMarker {
    RevisionMarker::new(format!("{:x}", Sha256::digest(content)))
}

impl MockRepository {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            raw_base: "https://raw.mock-repo.example.com/owner/site/main".to_string(),
            authenticated: true,
            read_status: Arc::new(Mutex::new(None)),
            write_status: Arc::new(Mutex::new(None)),
            interleaved_write: Arc::new(Mutex::new(None)),
            put_count: Arc::new(Mutex::new(0)),
            read_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_raw_base(mut self, raw_base: String) -> Self {
        self.raw_base = raw_base;
        self
    }

    /// Simulate a client built without a bearer token.
    pub fn with_credentials(mut self, authenticated: bool) -> Self {
        self.authenticated = authenticated;
        self
    }

    pub fn with_file(self, path: &str, content: Vec<u8>) -> Self {
        self.files.lock().unwrap().insert(path.to_string(), content);
        self
    }

    /// Make every read fail with the given upstream status.
    pub fn with_read_failure(self, status: u16) -> Self {
        *self.read_status.lock().unwrap() = Some(status);
        self
    }

    /// Make every commit fail with the given upstream status.
    pub fn with_write_failure(self, status: u16) -> Self {
        *self.write_status.lock().unwrap() = Some(status);
        self
    }

    /// Commit `content` to `path` right after the next metadata read, as a
    /// second writer racing between marker fetch and commit would.
    pub fn with_interleaved_write(self, path: &str, content: Vec<u8>) -> Self {
        *self.interleaved_write.lock().unwrap() = Some((path.to_string(), content));
        self
    }

    /// Replace a file unconditionally, bypassing the marker check.
    pub fn overwrite(&self, path: &str, content: Vec<u8>) {
        self.files.lock().unwrap().insert(path.to_string(), content);
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn get_files(&self) -> HashMap<String, Vec<u8>> {
        self.files.lock().unwrap().clone()
    }

    pub fn get_put_count(&self) -> usize {
        *self.put_count.lock().unwrap()
    }

    pub fn get_read_count(&self) -> usize {
        *self.read_count.lock().unwrap()
    }

    fn check_reads(&self) -> Result<(), RepoError> {
        *self.read_count.lock().unwrap() += 1;
        match *self.read_status.lock().unwrap() {
            Some(status) => Err(RepoError::Status {
                status,
                body: "mock read failure".to_string(),
            }),
            None => Ok(()),
        }
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteRepository for MockRepository {
    async fn get_metadata(&self, path: &str) -> Result<Option<RevisionMarker>, RepoError> {
        self.check_reads()?;

        let marker = self.file(path).map(|content| content_marker(&content));

        if let Some((racing_path, content)) = self.interleaved_write.lock().unwrap().take() {
            self.overwrite(&racing_path, content);
        }

        Ok(marker)
    }

    async fn get_content(&self, path: &str) -> Result<Option<Vec<u8>>, RepoError> {
        self.check_reads()?;
        Ok(self.file(path))
    }

    async fn put_if_match(
        &self,
        path: &str,
        content: &[u8],
        _message: &str,
        marker: Option<&RevisionMarker>,
    ) -> Result<RevisionMarker, RepoError> {
        if !self.authenticated {
            return Err(RepoError::MissingCredentials);
        }

        *self.put_count.lock().unwrap() += 1;

        if let Some(status) = *self.write_status.lock().unwrap() {
            return Err(RepoError::Status {
                status,
                body: "mock write failure".to_string(),
            });
        }

        let mut files = self.files.lock().unwrap();
        let current = files.get(path).map(|existing| content_marker(existing));
        match (current.as_ref(), marker) {
            (None, None) => {}
            (Some(current), Some(expected)) if current == expected => {}
            (None, Some(_)) => {
                return Err(RepoError::Conflict {
                    path: path.to_string(),
                    status: 409,
                })
            }
            (Some(_), _) => {
                return Err(RepoError::Conflict {
                    path: path.to_string(),
                    status: if marker.is_none() { 422 } else { 409 },
                })
            }
        }

        files.insert(path.to_string(), content.to_vec());
        Ok(content_marker(content))
    }

    fn raw_url(&self, path: &str) -> String {
        format!("{}/{}", self.raw_base, path)
    }

    fn has_credentials(&self) -> bool {
        self.authenticated
    }
}
