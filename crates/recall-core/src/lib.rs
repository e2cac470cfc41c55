//! Recall Core Library
//!
//! This crate provides the configuration, restore scope and provider selection
//! shared by the Recall storage adapters and the command-line client.

pub mod config;
pub mod constants;
pub mod provider_types;

// Re-export commonly used types
pub use config::{RestoreConfig, RestoreScope};
pub use provider_types::ProviderKind;
