//! Recall Storage Library
//!
//! This crate retrieves backup artifacts from remote stores during a restore.
//! It includes the Downloader trait, the provider-neutral listing and fetch
//! logic, and provider bindings for S3-compatible stores and local directories.
//!
//! # Key format
//!
//! Remote keys are scoped by cluster and node: `{cluster_id}/{node_id}/{key}`
//! inside the restore bucket. Local-relative keys must not contain `..`, a
//! root, or empty segments. Key mapping is centralized in the `keys` module so
//! all providers stay consistent.

pub mod client;
pub mod downloader;
pub mod factory;
mod fetch;
pub mod keys;
mod listing;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod reference;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;
pub mod transfer;

#[cfg(test)]
mod test_helpers;

// Re-export commonly used types
pub use client::{ListPage, ObjectClient, ProviderError};
pub use downloader::RemoteDownloader;
pub use factory::create_downloader;
#[cfg(feature = "storage-local")]
pub use local::{LocalClient, LocalDownloader};
pub use recall_core::{ProviderKind, RestoreScope};
pub use reference::RemoteObjectReference;
#[cfg(feature = "storage-s3")]
pub use s3::{S3Client, S3Downloader};
pub use traits::{DownloadError, DownloadResult, Downloader};
pub use transfer::{LoggingObserver, TransferEvent, TransferObserver};
