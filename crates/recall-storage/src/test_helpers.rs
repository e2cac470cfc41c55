//! In-memory provider client for unit tests

use crate::client::{ListPage, ObjectClient, ProviderError};
use crate::transfer::{TransferEvent, TransferObserver};
use async_trait::async_trait;
use recall_core::RestoreScope;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub(crate) fn test_scope() -> RestoreScope {
    RestoreScope::new("backups", "cluster-a", "node-1")
}

/// Serves pre-arranged listing pages and object bodies from memory
///
/// Continuation tokens are `page-{index}`. Call counters allow tests to assert
/// how the pagination loop drove the client.
#[derive(Default)]
pub(crate) struct MockObjectClient {
    pages: Vec<Vec<String>>,
    objects: Mutex<HashMap<String, Vec<u8>>>,
    fail_list_on_page: Option<usize>,
    fail_fetch: bool,
    fetch_delay: Option<Duration>,
    repeat_token: bool,
    pub list_calls: AtomicUsize,
    pub next_page_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    pub shutdown_calls: AtomicUsize,
}

impl MockObjectClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pages(mut self, pages: Vec<Vec<&str>>) -> Self {
        self.pages = pages
            .into_iter()
            .map(|page| page.into_iter().map(String::from).collect())
            .collect();
        self
    }

    pub fn with_object(self, key: &str, data: &[u8]) -> Self {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), data.to_vec());
        self
    }

    /// Fail the listing call for the zero-based page `index`
    pub fn failing_list_on_page(mut self, index: usize) -> Self {
        self.fail_list_on_page = Some(index);
        self
    }

    /// Write a few bytes and then fail every transfer
    pub fn failing_fetch(mut self) -> Self {
        self.fail_fetch = true;
        self
    }

    /// Wait before writing anything, to model a slow transfer
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    /// Report the same continuation token forever after the first page
    pub fn with_repeating_token(mut self) -> Self {
        self.repeat_token = true;
        self
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectClient for MockObjectClient {
    async fn list_page(
        &self,
        _bucket: &str,
        prefix: &str,
        continuation: Option<&str>,
    ) -> Result<ListPage, ProviderError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let index = match continuation {
            None => 0,
            Some(token) => {
                self.next_page_calls.fetch_add(1, Ordering::SeqCst);
                token
                    .strip_prefix("page-")
                    .and_then(|i| i.parse::<usize>().ok())
                    .ok_or_else(|| ProviderError::Request(format!("bad token {}", token)))?
            }
        };

        if self.fail_list_on_page == Some(index) {
            return Err(ProviderError::Request(format!(
                "listing page {} timed out",
                index
            )));
        }

        let keys = self
            .pages
            .get(index)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .collect();

        let next = if self.repeat_token && index >= 1 {
            Some(format!("page-{}", index))
        } else if index + 1 < self.pages.len() {
            Some(format!("page-{}", index + 1))
        } else {
            None
        };

        Ok(ListPage { keys, next })
    }

    async fn fetch_to(
        &self,
        _bucket: &str,
        key: &str,
        destination: &Path,
    ) -> Result<u64, ProviderError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_fetch {
            tokio::fs::write(destination, b"trunc").await?;
            return Err(ProviderError::Request("connection reset by peer".to_string()));
        }

        let data = self
            .objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(key.to_string()))?;

        tokio::fs::write(destination, &data).await?;
        Ok(data.len() as u64)
    }

    async fn shutdown(&self) {
        self.shutdown_calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Keeps every transfer event for later assertions
#[derive(Default)]
pub(crate) struct RecordingObserver {
    pub events: Mutex<Vec<TransferEvent>>,
}

impl TransferObserver for RecordingObserver {
    fn on_event(&self, event: &TransferEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
