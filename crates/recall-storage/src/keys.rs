//! Mapping between local-relative keys and canonical remote keys.
//!
//! Key format: `{cluster_id}/{node_id}/{relative key}`, segments always joined
//! with `/` whatever the host separator is. `resolve` and `relativize` are exact
//! inverses for every key they accept.

use crate::traits::{DownloadError, DownloadResult};
use recall_core::constants::KEY_SEPARATOR;
use recall_core::RestoreScope;
use std::path::{Component, Path, PathBuf};

/// Canonical prefix every object of `scope` lives under, separator included.
pub fn scope_prefix(scope: &RestoreScope) -> String {
    format!("{}{}", scope.root(), KEY_SEPARATOR)
}

/// Map a local-relative key to the canonical remote key under `scope`.
///
/// The empty key maps to the scope prefix itself, which is what a listing of
/// the whole node uses.
pub fn resolve(scope: &RestoreScope, relative_key: &Path) -> DownloadResult<String> {
    let mut canonical = scope_prefix(scope);
    for (i, segment) in key_segments(relative_key)?.into_iter().enumerate() {
        if i > 0 {
            canonical.push(KEY_SEPARATOR);
        }
        canonical.push_str(segment);
    }
    Ok(canonical)
}

/// Map a canonical remote key back to its local-relative key under `scope`.
pub fn relativize(scope: &RestoreScope, canonical_path: &str) -> DownloadResult<PathBuf> {
    let prefix = scope_prefix(scope);
    let rest = canonical_path.strip_prefix(prefix.as_str()).ok_or_else(|| {
        DownloadError::InvalidKey(format!(
            "{} is outside the restore scope {}",
            canonical_path, prefix
        ))
    })?;

    let mut key = PathBuf::new();
    if rest.is_empty() {
        return Ok(key);
    }

    for segment in rest.split(KEY_SEPARATOR) {
        if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
            return Err(DownloadError::InvalidKey(format!(
                "{} contains an unusable segment '{}'",
                canonical_path, segment
            )));
        }
        key.push(segment);
    }

    Ok(key)
}

fn key_segments(key: &Path) -> DownloadResult<Vec<&str>> {
    key.components()
        .map(|component| match component {
            Component::Normal(part) => part.to_str().ok_or_else(|| {
                DownloadError::InvalidKey(format!("{} is not valid UTF-8", key.display()))
            }),
            _ => Err(DownloadError::InvalidKey(format!(
                "{} escapes the restore scope",
                key.display()
            ))),
        })
        .collect()
}
