//! Backend for a link-hub landing page and its admin editor
//!
//! Serves one JSON configuration document (logo, promo button, action buttons,
//! social links) and accepts image uploads, persisting both either to the
//! local filesystem or to a hosted git repository through its contents API.

pub mod api;
pub mod app;
pub mod error;
pub mod models;
pub mod repo;
pub mod store;
pub mod upload;

pub use error::{Error, Result};
