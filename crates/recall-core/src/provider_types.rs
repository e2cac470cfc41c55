use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Remote provider types
///
/// This enum selects which provider adapter a restore job talks to.
/// It's defined in core because it's used in configuration and by the
/// storage factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Amazon S3 or any S3-compatible store (MinIO, Ceph RGW, ...)
    S3,
    /// IBM Cloud Object Storage, S3-compatible but always behind an explicit endpoint
    Ibm,
    /// A directory tree laid out like a bucket, e.g. a mounted backup volume
    Local,
}

impl ProviderKind {
    /// Whether this provider speaks the S3 API.
    pub fn is_s3_compatible(&self) -> bool {
        matches!(self, ProviderKind::S3 | ProviderKind::Ibm)
    }
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "s3" => Ok(ProviderKind::S3),
            "ibm" | "cos" => Ok(ProviderKind::Ibm),
            "local" | "filesystem" => Ok(ProviderKind::Local),
            _ => Err(anyhow::anyhow!("Invalid provider: {}", s)),
        }
    }
}

impl Display for ProviderKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ProviderKind::S3 => write!(f, "s3"),
            ProviderKind::Ibm => write!(f, "ibm"),
            ProviderKind::Local => write!(f, "local"),
        }
    }
}
