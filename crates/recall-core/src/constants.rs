//! Shared constants

/// Separator used in canonical remote keys, regardless of the host OS.
pub const KEY_SEPARATOR: char = '/';

/// Region used for S3-compatible endpoints when none is configured.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Extension given to in-flight download files.
pub const PARTIAL_FILE_SUFFIX: &str = "partial";

/// Maximum number of keys requested per listing page.
pub const DEFAULT_LIST_PAGE_SIZE: usize = 1000;
