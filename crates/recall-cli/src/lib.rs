use anyhow::Context;
use recall_storage::{Downloader, RemoteObjectReference};
use std::path::{Path, PathBuf};

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Local destination of a listed object below the restore directory.
pub fn destination_for(dest_root: &Path, object: &RemoteObjectReference) -> PathBuf {
    dest_root.join(object.object_key())
}

/// Outcome of a prefix restore
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RestoreSummary {
    pub files: usize,
    pub bytes: u64,
}

/// Download every object under `prefix` into `dest_root`, one after another.
///
/// Stops at the first failure; files already restored are left in place.
pub async fn restore_prefix(
    downloader: &dyn Downloader,
    prefix: &Path,
    dest_root: &Path,
) -> anyhow::Result<RestoreSummary> {
    let prefix = downloader
        .object_key_to_remote_reference(prefix)
        .with_context(|| format!("Invalid prefix {}", prefix.display()))?;

    let objects = downloader
        .list_files(&prefix)
        .await
        .with_context(|| format!("Failed to list {}", prefix))?;

    tracing::info!(
        prefix = %prefix,
        objects = objects.len(),
        destination = %dest_root.display(),
        "Starting restore"
    );

    let mut summary = RestoreSummary::default();
    for object in &objects {
        let destination = destination_for(dest_root, object);
        downloader
            .download_file(&destination, object)
            .await
            .with_context(|| format!("Failed to download {}", object))?;

        let metadata = tokio::fs::metadata(&destination)
            .await
            .with_context(|| format!("Restored file {} is missing", destination.display()))?;
        summary.files += 1;
        summary.bytes += metadata.len();
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::{ProviderKind, RestoreConfig, RestoreScope};
    use recall_storage::create_downloader;
    use tempfile::tempdir;

    fn seed(root: &Path, relative: &str, data: &[u8]) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, data).unwrap();
    }

    #[test]
    fn destination_keeps_object_layout() {
        let scope = RestoreScope::new("backups", "prod", "node-1");
        let object =
            RemoteObjectReference::from_local_key(&scope, Path::new("data/ks/1.db")).unwrap();

        assert_eq!(
            destination_for(Path::new("/var/lib/restore"), &object),
            PathBuf::from("/var/lib/restore/data/ks/1.db")
        );
    }

    #[tokio::test]
    async fn restore_prefix_downloads_all_objects() {
        let root = tempdir().unwrap();
        seed(root.path(), "backups/prod/node-1/data/ks/1.db", b"12345");
        seed(root.path(), "backups/prod/node-1/data/ks/2.db", b"678");
        seed(root.path(), "backups/prod/node-1/schema.cql", b"ignored");
        let config = RestoreConfig::new(
            ProviderKind::Local,
            RestoreScope::new("backups", "prod", "node-1"),
        )
        .with_local_root(root.path());
        let downloader = create_downloader(&config).await.unwrap();
        let restore = tempdir().unwrap();

        let summary = restore_prefix(downloader.as_ref(), Path::new("data"), restore.path())
            .await
            .unwrap();

        assert_eq!(summary, RestoreSummary { files: 2, bytes: 8 });
        assert_eq!(
            std::fs::read(restore.path().join("data/ks/2.db")).unwrap(),
            b"678"
        );
        assert!(!restore.path().join("schema.cql").exists());
    }

    #[tokio::test]
    async fn restore_prefix_fails_after_cleanup() {
        let root = tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("backups")).unwrap();
        let config = RestoreConfig::new(
            ProviderKind::Local,
            RestoreScope::new("backups", "prod", "node-1"),
        )
        .with_local_root(root.path());
        let downloader = create_downloader(&config).await.unwrap();
        downloader.cleanup().await.unwrap();
        let restore = tempdir().unwrap();

        let result = restore_prefix(downloader.as_ref(), Path::new(""), restore.path()).await;

        assert!(result.is_err());
    }
}
