use crate::client::{ListPage, ObjectClient, ProviderError};
use crate::downloader::RemoteDownloader;
use crate::traits::{DownloadError, DownloadResult};
use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client;
use recall_core::constants::DEFAULT_REGION;
use recall_core::RestoreConfig;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Downloader backed by an S3-compatible store
pub type S3Downloader = RemoteDownloader<S3Client>;

/// S3 client used for AWS S3, IBM Cloud Object Storage and other
/// S3-compatible providers
#[derive(Clone)]
pub struct S3Client {
    client: Client,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
    page_size: Option<i32>,
}

impl S3Client {
    /// Create a new S3Client instance
    ///
    /// # Arguments
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "https://s3.us-south.cloud-object-storage.appdomain.cloud" for IBM COS,
    ///   "http://localhost:9000" for MinIO)
    /// * `page_size` - Optional max-keys for each listing request
    ///
    /// Credentials come from the default provider chain and are resolved
    /// once, for the lifetime of the client.
    pub async fn new(
        region: String,
        endpoint_url: Option<String>,
        page_size: Option<usize>,
    ) -> DownloadResult<Self> {
        let page_size = page_size
            .map(|n| {
                i32::try_from(n).map_err(|_| {
                    DownloadError::ConstructionFailed(format!("list page size {} is too large", n))
                })
            })
            .transpose()?;

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(ref endpoint) = endpoint_url {
            // Most S3-compatible services only support path-style addressing.
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        tracing::debug!(
            region = %region,
            endpoint = ?endpoint_url,
            "S3 client created"
        );

        Ok(S3Client {
            client: Client::from_conf(builder.build()),
            region,
            endpoint_url,
            page_size,
        })
    }

    /// Create a client from the restore configuration
    pub async fn from_config(config: &RestoreConfig) -> DownloadResult<Self> {
        let region = config.region().unwrap_or(DEFAULT_REGION).to_string();
        Self::new(
            region,
            config.endpoint().map(String::from),
            config.list_page_size,
        )
        .await
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn endpoint_url(&self) -> Option<&str> {
        self.endpoint_url.as_deref()
    }
}

impl S3Downloader {
    /// Build an S3-backed downloader for the configured provider and scope
    pub async fn connect(config: &RestoreConfig) -> DownloadResult<Self> {
        let client = S3Client::from_config(config).await?;
        Ok(RemoteDownloader::new(
            config.provider,
            config.scope.clone(),
            client,
        ))
    }
}

#[async_trait]
impl ObjectClient for S3Client {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation: Option<&str>,
    ) -> Result<ListPage, ProviderError> {
        let start = std::time::Instant::now();

        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .set_continuation_token(continuation.map(String::from))
            .set_max_keys(self.page_size)
            .send()
            .await
            .map_err(|e| ProviderError::Request(DisplayErrorContext(&e).to_string()))?;

        let keys: Vec<String> = output
            .contents()
            .iter()
            .filter_map(|object| object.key().map(String::from))
            .collect();

        let next = if output.is_truncated().unwrap_or(false) {
            let token = output.next_continuation_token().ok_or_else(|| {
                ProviderError::Request(
                    "truncated listing did not carry a continuation token".to_string(),
                )
            })?;
            Some(token.to_string())
        } else {
            None
        };

        tracing::debug!(
            bucket = %bucket,
            prefix = %prefix,
            keys = keys.len(),
            truncated = next.is_some(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 list page received"
        );

        Ok(ListPage { keys, next })
    }

    async fn fetch_to(
        &self,
        bucket: &str,
        key: &str,
        destination: &Path,
    ) -> Result<u64, ProviderError> {
        let start = std::time::Instant::now();

        let mut object = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(service_error) if service_error.is_no_such_key() => {
                    ProviderError::NotFound(key.to_string())
                }
                _ => ProviderError::Request(DisplayErrorContext(&e).to_string()),
            })?;

        let expected = object.content_length().and_then(|n| u64::try_from(n).ok());

        let mut file = tokio::fs::File::create(destination).await?;
        let mut written: u64 = 0;

        while let Some(chunk) = object
            .body
            .try_next()
            .await
            .map_err(|e| ProviderError::Request(format!("Failed to read object body: {}", e)))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        file.sync_all().await?;

        if let Some(expected) = expected {
            if expected != written {
                tracing::error!(
                    bucket = %bucket,
                    key = %key,
                    expected_bytes = expected,
                    size_bytes = written,
                    "S3 download truncated"
                );
                return Err(ProviderError::Request(format!(
                    "received {} of {} bytes",
                    written, expected
                )));
            }
        }

        tracing::info!(
            bucket = %bucket,
            key = %key,
            size_bytes = written,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 download successful"
        );

        Ok(written)
    }

    async fn shutdown(&self) {
        // The SDK client has no explicit shutdown; its connection pool goes
        // away with the last clone.
        tracing::debug!(
            region = %self.region,
            endpoint = ?self.endpoint_url,
            "S3 client released"
        );
    }
}
