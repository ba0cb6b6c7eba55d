//! Error handling and custom error types
//!
//! Every failure a request can hit maps onto one of these variants, which the
//! HTTP layer turns into a JSON error body.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Document unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to persist document: {0}")]
    PersistFailed(String),

    #[error("No file uploaded")]
    NoFile,

    #[error("Upload failed: {message}")]
    UploadFailed {
        status: Option<u16>,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

impl Error {
    pub(crate) fn upload(message: impl Into<String>) -> Self {
        Error::UploadFailed {
            status: None,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
