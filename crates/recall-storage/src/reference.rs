use crate::keys;
use crate::traits::DownloadResult;
use recall_core::RestoreScope;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};

/// Identifies one remote object: the provider-neutral relative key and the
/// canonical key string provider API calls use.
///
/// The canonical path is always derived from the object key and the restore
/// scope, so two references built from the same key under the same scope are
/// equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteObjectReference {
    object_key: PathBuf,
    canonical_path: String,
}

impl RemoteObjectReference {
    /// Build a reference from a local-relative key.
    pub fn from_local_key(scope: &RestoreScope, object_key: &Path) -> DownloadResult<Self> {
        let canonical_path = keys::resolve(scope, object_key)?;
        Ok(Self {
            object_key: object_key.to_path_buf(),
            canonical_path,
        })
    }

    /// Build a reference from a key reported by a provider listing.
    pub fn from_canonical_path(scope: &RestoreScope, canonical_path: &str) -> DownloadResult<Self> {
        let object_key = keys::relativize(scope, canonical_path)?;
        Self::from_local_key(scope, &object_key)
    }

    pub fn object_key(&self) -> &Path {
        &self.object_key
    }

    pub fn canonical_path(&self) -> &str {
        &self.canonical_path
    }
}

impl Display for RemoteObjectReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.canonical_path)
    }
}
