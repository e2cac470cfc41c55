use crate::client::{ListPage, ObjectClient, ProviderError};
use crate::downloader::RemoteDownloader;
use crate::traits::{DownloadError, DownloadResult};
use async_trait::async_trait;
use recall_core::constants::{DEFAULT_LIST_PAGE_SIZE, KEY_SEPARATOR};
use recall_core::RestoreConfig;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::fs;

/// Downloader backed by a local directory tree
pub type LocalDownloader = RemoteDownloader<LocalClient>;

/// Local filesystem client
///
/// Each bucket is a directory under `root` and object keys are paths relative
/// to that directory. Empty directories are reported as `dir/` markers, the
/// way object stores report folder placeholders.
///
/// A listing walks the directory tree once, on its first page; later pages
/// are served from that sorted snapshot.
#[derive(Debug)]
pub struct LocalClient {
    root: PathBuf,
    page_size: usize,
    snapshot: Mutex<Option<ListingSnapshot>>,
}

/// Sorted keys of the listing currently being paged through
#[derive(Debug)]
struct ListingSnapshot {
    bucket: String,
    prefix: String,
    keys: Arc<Vec<String>>,
}

impl LocalClient {
    /// Create a new LocalClient instance
    ///
    /// # Arguments
    /// * `root` - Directory holding one sub-directory per bucket (e.g., "/mnt/backups")
    /// * `page_size` - Keys per listing page, `DEFAULT_LIST_PAGE_SIZE` if not set
    pub async fn new(root: impl Into<PathBuf>, page_size: Option<usize>) -> DownloadResult<Self> {
        let root = root.into();

        let metadata = fs::metadata(&root).await.map_err(|e| {
            DownloadError::ConstructionFailed(format!(
                "Backup root {} is not accessible: {}",
                root.display(),
                e
            ))
        })?;
        if !metadata.is_dir() {
            return Err(DownloadError::ConstructionFailed(format!(
                "Backup root {} is not a directory",
                root.display()
            )));
        }

        Ok(LocalClient {
            root,
            page_size: page_size.unwrap_or(DEFAULT_LIST_PAGE_SIZE).max(1),
            snapshot: Mutex::new(None),
        })
    }

    pub async fn from_config(config: &RestoreConfig) -> DownloadResult<Self> {
        let root = config.local_root.clone().ok_or_else(|| {
            DownloadError::ConstructionFailed("RECALL_LOCAL_ROOT not configured".to_string())
        })?;
        Self::new(root, config.list_page_size).await
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Convert a bucket and key to a filesystem path
    ///
    /// Every segment must be a plain name so the result can never resolve
    /// outside the bucket directory.
    fn key_to_path(&self, bucket: &str, key: &str) -> Result<PathBuf, ProviderError> {
        let mut path = self.bucket_dir(bucket)?;
        for segment in key.split(KEY_SEPARATOR) {
            if !is_plain_segment(segment) {
                return Err(ProviderError::Request(format!(
                    "Key {} contains invalid segment '{}'",
                    key, segment
                )));
            }
            path.push(segment);
        }
        Ok(path)
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf, ProviderError> {
        if !is_plain_segment(bucket) || bucket.contains(KEY_SEPARATOR) {
            return Err(ProviderError::Request(format!(
                "Invalid bucket name '{}'",
                bucket
            )));
        }
        Ok(self.root.join(bucket))
    }

    fn cached_keys(&self, bucket: &str, prefix: &str) -> Option<Arc<Vec<String>>> {
        self.snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|snapshot| snapshot.bucket == bucket && snapshot.prefix == prefix)
            .map(|snapshot| Arc::clone(&snapshot.keys))
    }

    async fn walk_into_snapshot(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Arc<Vec<String>>, ProviderError> {
        let keys = Arc::new(self.collect_keys(bucket, prefix).await?);
        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) = Some(ListingSnapshot {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
            keys: Arc::clone(&keys),
        });
        Ok(keys)
    }

    /// Walk the bucket below the deepest directory named by `prefix` and
    /// return every key starting with `prefix`, sorted.
    async fn collect_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, ProviderError> {
        let bucket_dir = self.bucket_dir(bucket)?;
        if !fs::try_exists(&bucket_dir).await? {
            return Err(ProviderError::NotFound(format!("bucket {}", bucket)));
        }

        // Directory part of the prefix, e.g. "c/n/" for "c/n/da"
        let base = match prefix.rfind(KEY_SEPARATOR) {
            Some(i) => &prefix[..=i],
            None => "",
        };
        let mut start_dir = bucket_dir.clone();
        for segment in base.split(KEY_SEPARATOR).filter(|s| !s.is_empty()) {
            if !is_plain_segment(segment) {
                return Ok(Vec::new());
            }
            start_dir.push(segment);
        }

        let mut keys = Vec::new();
        if !fs::try_exists(&start_dir).await? {
            return Ok(keys);
        }

        let mut stack = vec![(start_dir, base.to_string())];
        while let Some((dir, dir_key)) = stack.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            let mut is_empty = true;

            while let Some(entry) = entries.next_entry().await? {
                is_empty = false;
                let name = match entry.file_name().into_string() {
                    Ok(name) => name,
                    Err(raw) => {
                        tracing::warn!(
                            dir = %dir.display(),
                            name = ?raw,
                            "Skipping entry with non UTF-8 name"
                        );
                        continue;
                    }
                };
                let key = format!("{}{}", dir_key, name);
                let file_type = entry.file_type().await?;

                if file_type.is_dir() {
                    stack.push((entry.path(), format!("{}{}", key, KEY_SEPARATOR)));
                } else if file_type.is_file() {
                    keys.push(key);
                } else if file_type.is_symlink() {
                    // Follow links to files only; dangling links are skipped
                    let target_is_file = fs::metadata(entry.path())
                        .await
                        .map(|m| m.is_file())
                        .unwrap_or(false);
                    if target_is_file {
                        keys.push(key);
                    }
                }
            }

            if is_empty && dir_key != base {
                keys.push(dir_key);
            }
        }

        keys.retain(|key| key.starts_with(prefix));
        keys.sort();
        Ok(keys)
    }
}

fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".." && !segment.contains('\\')
}

impl LocalDownloader {
    /// Build a downloader over the configured backup root
    pub async fn connect(config: &RestoreConfig) -> DownloadResult<Self> {
        let client = LocalClient::from_config(config).await?;
        Ok(RemoteDownloader::new(
            config.provider,
            config.scope.clone(),
            client,
        ))
    }
}

#[async_trait]
impl ObjectClient for LocalClient {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation: Option<&str>,
    ) -> Result<ListPage, ProviderError> {
        let keys = match continuation.and_then(|_| self.cached_keys(bucket, prefix)) {
            Some(keys) => keys,
            None => self.walk_into_snapshot(bucket, prefix).await?,
        };

        // Continuation token is the last key of the previous page
        let start = match continuation {
            Some(after) => keys.partition_point(|key| key.as_str() <= after),
            None => 0,
        };
        let end = keys.len().min(start + self.page_size);
        let page: Vec<String> = keys[start..end].to_vec();

        let next = if end < keys.len() {
            page.last().cloned()
        } else {
            *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) = None;
            None
        };

        Ok(ListPage { keys: page, next })
    }

    async fn fetch_to(
        &self,
        bucket: &str,
        key: &str,
        destination: &Path,
    ) -> Result<u64, ProviderError> {
        let start = std::time::Instant::now();
        let source = self.key_to_path(bucket, key)?;

        let size = fs::copy(&source, destination).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ProviderError::NotFound(key.to_string())
            } else {
                ProviderError::Io(e)
            }
        })?;

        tracing::info!(
            path = %source.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local download successful"
        );

        Ok(size)
    }
}
