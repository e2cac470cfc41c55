//! Transfer progress events
//!
//! A fetch reports its lifecycle to a [`TransferObserver`]. The default
//! observer turns events into `tracing` records; callers that collect metrics
//! can install their own through
//! [`RemoteDownloader::with_observer`](crate::downloader::RemoteDownloader::with_observer).
//!
//! Transfers are never resumed: a fetch that dies half way leaves nothing to
//! pick up again, so there is no event carrying resume state.

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum TransferEvent {
    Started {
        canonical_path: String,
        destination: PathBuf,
    },
    Completed {
        canonical_path: String,
        destination: PathBuf,
        size_bytes: u64,
        duration: Duration,
    },
    Failed {
        canonical_path: String,
        destination: PathBuf,
        reason: String,
    },
}

impl TransferEvent {
    pub fn canonical_path(&self) -> &str {
        match self {
            TransferEvent::Started { canonical_path, .. }
            | TransferEvent::Completed { canonical_path, .. }
            | TransferEvent::Failed { canonical_path, .. } => canonical_path,
        }
    }
}

pub trait TransferObserver: Send + Sync {
    fn on_event(&self, event: &TransferEvent);
}

/// Logs every transfer event
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl TransferObserver for LoggingObserver {
    fn on_event(&self, event: &TransferEvent) {
        match event {
            TransferEvent::Started {
                canonical_path,
                destination,
            } => {
                tracing::debug!(
                    key = %canonical_path,
                    destination = %destination.display(),
                    "Download started"
                );
            }
            TransferEvent::Completed {
                canonical_path,
                destination,
                size_bytes,
                duration,
            } => {
                tracing::debug!(
                    key = %canonical_path,
                    destination = %destination.display(),
                    size_bytes = *size_bytes,
                    duration_ms = duration.as_secs_f64() * 1000.0,
                    "Successfully downloaded"
                );
            }
            TransferEvent::Failed {
                canonical_path,
                destination,
                reason,
            } => {
                tracing::error!(
                    key = %canonical_path,
                    destination = %destination.display(),
                    error = %reason,
                    "Download failed"
                );
            }
        }
    }
}
