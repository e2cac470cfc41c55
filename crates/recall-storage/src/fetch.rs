//! Single-object fetch shared by all provider bindings.
//!
//! The provider transfer runs as its own tokio task and the caller waits on
//! it. Bytes land in a hidden sibling file first and are renamed over the
//! destination only once the provider reports success, so a failed or
//! cancelled fetch never leaves a complete-looking file behind.
//!
//! The partial file is owned by the transfer task. If the caller stops
//! waiting, the task still runs to the end and the partial file is removed
//! once the provider call has returned, never while it may still write.

use crate::client::{ObjectClient, ProviderError};
use crate::reference::RemoteObjectReference;
use crate::traits::{DownloadError, DownloadResult};
use crate::transfer::{TransferEvent, TransferObserver};
use recall_core::constants::PARTIAL_FILE_SUFFIX;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use uuid::Uuid;

pub(crate) async fn fetch_object<C>(
    client: Arc<C>,
    bucket: &str,
    local_path: &Path,
    object: &RemoteObjectReference,
    observer: &dyn TransferObserver,
) -> DownloadResult<u64>
where
    C: ObjectClient,
{
    let start = std::time::Instant::now();
    let canonical_path = object.canonical_path().to_string();

    ensure_parent_dir(local_path).await?;
    let partial = PartialFile::new(local_path)?;

    observer.on_event(&TransferEvent::Started {
        canonical_path: canonical_path.clone(),
        destination: local_path.to_path_buf(),
    });

    let handle = tokio::spawn(transfer(
        client,
        bucket.to_string(),
        canonical_path.clone(),
        partial,
    ));
    let outcome = match handle.await {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(join_error) => Err(format!("transfer task did not finish: {}", join_error)),
    };

    let (size_bytes, partial) = match outcome {
        Ok(done) => done,
        Err(reason) => {
            observer.on_event(&TransferEvent::Failed {
                canonical_path: canonical_path.clone(),
                destination: local_path.to_path_buf(),
                reason: reason.clone(),
            });
            return Err(DownloadError::DownloadFailed {
                canonical_path,
                reason,
            });
        }
    };

    partial.persist(local_path).await?;

    observer.on_event(&TransferEvent::Completed {
        canonical_path,
        destination: local_path.to_path_buf(),
        size_bytes,
        duration: start.elapsed(),
    });

    Ok(size_bytes)
}

/// Create the destination's parent chain; succeeds if it already exists.
async fn ensure_parent_dir(path: &Path) -> DownloadResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| DownloadError::io(parent, e))?;
    }
    Ok(())
}

/// Run the provider copy into `partial`.
///
/// On error the partial file is dropped here, after the provider call has
/// completed. A successful result hands it back for the rename; if nobody
/// awaits the task anymore, tokio drops that result and the file with it.
async fn transfer<C: ObjectClient>(
    client: Arc<C>,
    bucket: String,
    key: String,
    partial: PartialFile,
) -> Result<(u64, PartialFile), ProviderError> {
    let size_bytes = client.fetch_to(&bucket, &key, partial.path()).await?;
    Ok((size_bytes, partial))
}

/// In-flight download file, removed on drop unless persisted.
struct PartialFile {
    path: PathBuf,
    persisted: bool,
}

impl PartialFile {
    fn new(destination: &Path) -> DownloadResult<Self> {
        let file_name = destination.file_name().ok_or_else(|| {
            DownloadError::io(
                destination,
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "destination has no file name",
                ),
            )
        })?;
        let name = format!(
            ".{}.{}.{}",
            file_name.to_string_lossy(),
            Uuid::new_v4().simple(),
            PARTIAL_FILE_SUFFIX
        );
        Ok(Self {
            path: destination.with_file_name(name),
            persisted: false,
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(mut self, destination: &Path) -> DownloadResult<()> {
        fs::rename(&self.path, destination)
            .await
            .map_err(|e| DownloadError::io(destination, e))?;
        self.persisted = true;
        Ok(())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.persisted {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to remove partial download"
                );
            }
        }
    }
}
