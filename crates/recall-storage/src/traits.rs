//! Downloader abstraction trait
//!
//! This module defines the Downloader trait that every provider binding exposes
//! to the restore orchestrator, and the error taxonomy shared by all of them.

use crate::reference::RemoteObjectReference;
use async_trait::async_trait;
use recall_core::{ProviderKind, RestoreScope};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Download operation errors
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Downloader construction failed: {0}")]
    ConstructionFailed(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Listing of {prefix} failed: {reason}")]
    ListingFailed { prefix: String, reason: String },

    #[error("Download of {canonical_path} failed: {reason}")]
    DownloadFailed {
        canonical_path: String,
        reason: String,
    },

    #[error("IO error at {}: {}", path.display(), source)]
    IoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Downloader has been cleaned up")]
    ClosedResource,
}

impl DownloadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DownloadError::IoFailure {
            path: path.into(),
            source,
        }
    }

    /// Whether the caller may retry the failed operation as-is.
    ///
    /// IO failures are reported as retryable since they usually clear once an
    /// operator fixes the local volume.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DownloadError::ListingFailed { .. }
                | DownloadError::DownloadFailed { .. }
                | DownloadError::IoFailure { .. }
        )
    }
}

/// Result type for download operations
pub type DownloadResult<T> = Result<T, DownloadError>;

/// Downloader abstraction trait
///
/// Every provider binding (S3-compatible stores, local backup volumes) is
/// exposed through this trait so the restore orchestrator never depends on a
/// concrete provider client.
///
/// A downloader is Active from construction until [`Downloader::cleanup`] is
/// called; afterwards every operation fails with
/// [`DownloadError::ClosedResource`].
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Provider this downloader was built for
    fn provider(&self) -> ProviderKind;

    /// Restore scope every reference produced by this downloader lives under
    fn scope(&self) -> &RestoreScope;

    /// Translate a local-relative key into a remote reference
    fn object_key_to_remote_reference(
        &self,
        object_key: &Path,
    ) -> DownloadResult<RemoteObjectReference>;

    /// List every real object under `prefix`
    ///
    /// Pseudo-directory markers are dropped. The full listing is returned at
    /// once: a failure on any page yields an error and no partial result.
    async fn list_files(
        &self,
        prefix: &RemoteObjectReference,
    ) -> DownloadResult<Vec<RemoteObjectReference>>;

    /// Download one object to `local_path`, creating missing parent directories
    ///
    /// Returns only once the transfer has either completed or failed. No
    /// retry is attempted.
    async fn download_file(
        &self,
        local_path: &Path,
        object: &RemoteObjectReference,
    ) -> DownloadResult<()>;

    /// Release the provider client. Call once, at the end of the restore job.
    async fn cleanup(&self) -> DownloadResult<()>;
}
