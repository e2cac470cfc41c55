//! Provider client seam
//!
//! An [`ObjectClient`] is the thin, provider-specific part of a downloader: it
//! knows how to fetch one page of a listing and how to copy one object into a
//! local file. Everything else (scoping, pagination, marker filtering, partial
//! file handling, lifecycle) is shared and lives in the generic
//! [`RemoteDownloader`](crate::downloader::RemoteDownloader).

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors reported by a provider client
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Provider request failed: {0}")]
    Request(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One page of a provider listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Raw keys in provider order, pseudo-directory markers included
    pub keys: Vec<String>,
    /// Continuation token, present while more pages remain
    pub next: Option<String>,
}

impl ListPage {
    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }
}

/// Provider-specific client operations
#[async_trait]
pub trait ObjectClient: Send + Sync + 'static {
    /// Fetch one listing page of `bucket` under `prefix`, continuing from
    /// `continuation` when given.
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation: Option<&str>,
    ) -> Result<ListPage, ProviderError>;

    /// Copy the object `key` of `bucket` into `destination`, creating or
    /// truncating it. Returns the number of bytes written.
    async fn fetch_to(
        &self,
        bucket: &str,
        key: &str,
        destination: &Path,
    ) -> Result<u64, ProviderError>;

    /// Release connections and other client resources.
    async fn shutdown(&self) {}
}
