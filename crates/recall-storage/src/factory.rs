#[cfg(feature = "storage-local")]
use crate::LocalDownloader;
#[cfg(feature = "storage-s3")]
use crate::S3Downloader;
use crate::{DownloadError, DownloadResult, Downloader, ProviderKind};
use recall_core::RestoreConfig;
use std::sync::Arc;

/// Create a downloader for the configured provider
///
/// Invalid configuration and providers compiled out of this build are
/// reported as `ConstructionFailed`, which aborts the restore job.
pub async fn create_downloader(config: &RestoreConfig) -> DownloadResult<Arc<dyn Downloader>> {
    config
        .validate()
        .map_err(|e| DownloadError::ConstructionFailed(e.to_string()))?;

    let downloader: Arc<dyn Downloader> = match config.provider {
        #[cfg(feature = "storage-s3")]
        ProviderKind::S3 | ProviderKind::Ibm => Arc::new(S3Downloader::connect(config).await?),

        #[cfg(not(feature = "storage-s3"))]
        ProviderKind::S3 | ProviderKind::Ibm => {
            return Err(DownloadError::ConstructionFailed(format!(
                "{} provider not available (storage-s3 feature not enabled)",
                config.provider
            )))
        }

        #[cfg(feature = "storage-local")]
        ProviderKind::Local => Arc::new(LocalDownloader::connect(config).await?),

        #[cfg(not(feature = "storage-local"))]
        ProviderKind::Local => {
            return Err(DownloadError::ConstructionFailed(
                "local provider not available (storage-local feature not enabled)".to_string(),
            ))
        }
    };

    tracing::info!(
        provider = %config.provider,
        bucket = %config.bucket(),
        scope = %config.scope.root(),
        endpoint = ?config.endpoint(),
        "Downloader created"
    );

    Ok(downloader)
}
