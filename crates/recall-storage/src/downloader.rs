//! Provider-agnostic downloader façade
//!
//! [`RemoteDownloader`] composes key resolution, paginated listing and the
//! single-object fetch on top of any [`ObjectClient`], and owns that client
//! until [`Downloader::cleanup`] releases it.

use crate::client::ObjectClient;
use crate::fetch;
use crate::keys;
use crate::listing;
use crate::reference::RemoteObjectReference;
use crate::traits::{DownloadError, DownloadResult, Downloader};
use crate::transfer::{LoggingObserver, TransferObserver};
use async_trait::async_trait;
use recall_core::{ProviderKind, RestoreScope};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

pub struct RemoteDownloader<C: ObjectClient> {
    provider: ProviderKind,
    scope: RestoreScope,
    // None once cleaned up
    client: RwLock<Option<Arc<C>>>,
    observer: Arc<dyn TransferObserver>,
}

impl<C: ObjectClient> RemoteDownloader<C> {
    pub fn new(provider: ProviderKind, scope: RestoreScope, client: C) -> Self {
        Self {
            provider,
            scope,
            client: RwLock::new(Some(Arc::new(client))),
            observer: Arc::new(LoggingObserver),
        }
    }

    /// Replace the default logging observer of transfer events
    pub fn with_observer(mut self, observer: Arc<dyn TransferObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn is_active(&self) -> bool {
        self.client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn active_client(&self) -> DownloadResult<Arc<C>> {
        self.client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(DownloadError::ClosedResource)
    }
}

#[async_trait]
impl<C: ObjectClient> Downloader for RemoteDownloader<C> {
    fn provider(&self) -> ProviderKind {
        self.provider
    }

    fn scope(&self) -> &RestoreScope {
        &self.scope
    }

    fn object_key_to_remote_reference(
        &self,
        object_key: &Path,
    ) -> DownloadResult<RemoteObjectReference> {
        self.active_client()?;
        RemoteObjectReference::from_local_key(&self.scope, object_key)
    }

    async fn list_files(
        &self,
        prefix: &RemoteObjectReference,
    ) -> DownloadResult<Vec<RemoteObjectReference>> {
        let client = self.active_client()?;

        if !prefix
            .canonical_path()
            .starts_with(&keys::scope_prefix(&self.scope))
        {
            return Err(DownloadError::InvalidKey(format!(
                "prefix {} was not built for scope {}",
                prefix,
                self.scope.root()
            )));
        }

        listing::list_all(client.as_ref(), &self.scope, prefix).await
    }

    async fn download_file(
        &self,
        local_path: &Path,
        object: &RemoteObjectReference,
    ) -> DownloadResult<()> {
        let client = self.active_client()?;
        fetch::fetch_object(
            client,
            &self.scope.bucket,
            local_path,
            object,
            self.observer.as_ref(),
        )
        .await?;
        Ok(())
    }

    async fn cleanup(&self) -> DownloadResult<()> {
        let client = {
            let mut guard = self.client.write().unwrap_or_else(PoisonError::into_inner);
            guard.take()
        }
        .ok_or(DownloadError::ClosedResource)?;

        client.shutdown().await;

        tracing::info!(
            provider = %self.provider,
            bucket = %self.scope.bucket,
            scope = %self.scope.root(),
            "Downloader cleaned up"
        );
        Ok(())
    }
}
