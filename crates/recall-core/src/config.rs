//! Configuration module
//!
//! This module provides the restore scope and the provider configuration a
//! restore job is started with. Values are read once from the environment
//! (optionally seeded from a `.env` file) and treated as immutable afterwards.

use std::env;
use std::path::PathBuf;

use crate::constants::KEY_SEPARATOR;
use crate::provider_types::ProviderKind;

/// The (bucket, cluster id, node id) tuple narrowing which remote objects a
/// restore job can see.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RestoreScope {
    pub bucket: String,
    pub cluster_id: String,
    pub node_id: String,
}

impl RestoreScope {
    pub fn new(
        bucket: impl Into<String>,
        cluster_id: impl Into<String>,
        node_id: impl Into<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            cluster_id: cluster_id.into(),
            node_id: node_id.into(),
        }
    }

    /// Remote root of this scope: `<cluster_id>/<node_id>`
    pub fn root(&self) -> String {
        format!("{}{}{}", self.cluster_id, KEY_SEPARATOR, self.node_id)
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.bucket.trim().is_empty() {
            return Err(anyhow::anyhow!("RECALL_BUCKET must not be empty"));
        }
        for (name, value) in [
            ("RECALL_CLUSTER_ID", &self.cluster_id),
            ("RECALL_NODE_ID", &self.node_id),
        ] {
            if value.trim().is_empty() {
                return Err(anyhow::anyhow!("{} must not be empty", name));
            }
            if value.contains(KEY_SEPARATOR) || value == "." || value == ".." {
                return Err(anyhow::anyhow!(
                    "{} must be a single path segment, got '{}'",
                    name,
                    value
                ));
            }
        }
        Ok(())
    }
}

/// Restore job configuration
#[derive(Clone, Debug)]
pub struct RestoreConfig {
    pub provider: ProviderKind,
    pub scope: RestoreScope,
    // Custom endpoint for S3-compatible providers (IBM COS, MinIO, etc.)
    pub endpoint: Option<String>,
    pub region: Option<String>,
    // Root directory holding one sub-directory per bucket (local provider only)
    pub local_root: Option<PathBuf>,
    pub list_page_size: Option<usize>,
}

impl RestoreConfig {
    pub fn new(provider: ProviderKind, scope: RestoreScope) -> Self {
        Self {
            provider,
            scope,
            endpoint: None,
            region: None,
            local_root: None,
            list_page_size: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_local_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.local_root = Some(root.into());
        self
    }

    pub fn with_list_page_size(mut self, page_size: usize) -> Self {
        self.list_page_size = Some(page_size);
        self
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |name: &str| {
            var(name).ok_or_else(|| anyhow::anyhow!("{} must be set for a restore job", name))
        };

        let provider = var("RECALL_PROVIDER")
            .unwrap_or_else(|| "s3".to_string())
            .parse::<ProviderKind>()?;

        let scope = RestoreScope::new(
            required("RECALL_BUCKET")?,
            required("RECALL_CLUSTER_ID")?,
            required("RECALL_NODE_ID")?,
        );

        let list_page_size = match var("RECALL_LIST_PAGE_SIZE") {
            Some(raw) => Some(raw.parse::<usize>().map_err(|_| {
                anyhow::anyhow!("RECALL_LIST_PAGE_SIZE must be a positive number")
            })?),
            None => None,
        };

        let config = RestoreConfig {
            provider,
            scope,
            endpoint: var("RECALL_ENDPOINT"),
            region: var("RECALL_REGION").or_else(|| var("AWS_REGION")),
            local_root: var("RECALL_LOCAL_ROOT").map(PathBuf::from),
            list_page_size,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.scope.validate()?;

        if let Some(ref endpoint) = self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(anyhow::anyhow!(
                    "RECALL_ENDPOINT must start with http:// or https://, got '{}'",
                    endpoint
                ));
            }
        }

        if self.list_page_size == Some(0) {
            return Err(anyhow::anyhow!("RECALL_LIST_PAGE_SIZE must be greater than 0"));
        }

        match self.provider {
            ProviderKind::Ibm if self.endpoint.is_none() => Err(anyhow::anyhow!(
                "RECALL_ENDPOINT must be set for the ibm provider"
            )),
            ProviderKind::Local if self.local_root.is_none() => Err(anyhow::anyhow!(
                "RECALL_LOCAL_ROOT must be set for the local provider"
            )),
            _ => Ok(()),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.scope.bucket
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }
}
