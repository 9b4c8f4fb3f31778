//! Configuration for a scan run.

use ps_error::{PsError, Result};
use serde::{Deserialize, Serialize};

use crate::extract::{normalize_policy, ColumnRange};

/// Default maximum concurrent object scans.
pub const DEFAULT_MAX_WORKERS: usize = 32;

/// Default maximum pooled connections shared by listing and retrieval.
pub const DEFAULT_MAX_CONNECTIONS: usize = 64;

/// Default object suffix for candidate report files.
pub const DEFAULT_SUFFIX: &str = ".txt";

/// Configuration for a scan run.
///
/// The coordinator entry point expects these values to be already
/// resolved - prompting, environment lookup and argument parsing happen in
/// the CLI, never here. [`ScanConfig::validate`] rejects unusable values
/// before any work is dispatched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// S3 bucket to scan
    pub bucket: String,

    /// Raw prefix within the bucket; empty means the entire bucket
    pub prefix: String,

    /// Policy number to search for (normalized at run start)
    pub policy: String,

    /// Column range holding the policy number on data lines
    pub columns: ColumnRange,

    /// Suffix of candidate objects
    pub suffix: String,

    /// Maximum concurrent in-flight object scans
    pub max_workers: usize,

    /// Maximum pooled connections available to listing and retrieval
    pub max_connections: usize,
}

impl ScanConfig {
    /// Create a configuration with the required bucket and policy number.
    pub fn new(bucket: impl Into<String>, policy: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: String::new(),
            policy: policy.into(),
            columns: ColumnRange::default(),
            suffix: DEFAULT_SUFFIX.to_string(),
            max_workers: DEFAULT_MAX_WORKERS,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }

    /// Set the prefix to scan under.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the column range to extract.
    pub fn with_columns(mut self, columns: ColumnRange) -> Self {
        self.columns = columns;
        self
    }

    /// Set the candidate object suffix.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Set the maximum concurrent object scans.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Set the maximum pooled connections.
    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Reject unusable configurations before any work is dispatched.
    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(PsError::Config("bucket is required".to_string()));
        }
        if normalize_policy(&self.policy).is_empty() {
            return Err(PsError::Config("policy number is required".to_string()));
        }
        // Re-check in case the range was built without ColumnRange::new
        ColumnRange::new(self.columns.start, self.columns.end)?;
        if self.max_workers < 1 {
            return Err(PsError::Config("max_workers must be >= 1".to_string()));
        }
        if self.max_connections < 1 {
            return Err(PsError::Config("max_connections must be >= 1".to_string()));
        }
        Ok(())
    }
}
