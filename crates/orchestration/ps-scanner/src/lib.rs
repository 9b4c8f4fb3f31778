//! ps-scanner - concurrent policy-number search over S3 report objects.
//!
//! This crate provides the scanning engine behind the `ps-scan` CLI. It
//! locates, among the text objects under a bucket/prefix, every object
//! whose data lines carry a target policy number in a fixed column range
//! (columns 6-23 by default). It supports:
//!
//! - Paginated S3 listing behind one continuous key stream, with suffix
//!   filtering and prefix normalization
//! - Streaming line reads with bounded memory, skipping the header and
//!   trailer metadata lines via a one-line lookahead
//! - Per-object short-circuit on the first matching data line
//! - Bounded worker and connection counts, with per-object failures
//!   recovered and enumeration failures fatal
//! - Completion/match/failure events while the scan is running
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ps_scanner::{NoopObserver, S3Config, S3ObjectStore, ScanConfig, ScanCoordinator};
//! use ps_scanner::create_s3_client;
//!
//! let client = create_s3_client(&S3Config::new().with_region("us-east-1")).await?;
//! let config = ScanConfig::new("stat-reports", "6H1096926").with_prefix("WCSTAT");
//! let store = Arc::new(S3ObjectStore::new(client, config.max_connections));
//!
//! let coordinator = ScanCoordinator::new(store, config);
//! let summary = coordinator.run(Arc::new(NoopObserver)).await?;
//!
//! for key in &summary.matches {
//!     println!("{}", key.uri());
//! }
//! ```

use serde::{Deserialize, Serialize};

pub use ps_error::{PsError, Result, RetrievalError};

pub mod config;
pub mod coordinator;
pub mod enumerate;
pub mod extract;
pub mod filter;
pub mod lines;
pub mod matcher;
pub mod s3;
pub mod stats;
pub mod store;

pub use config::{ScanConfig, DEFAULT_MAX_CONNECTIONS, DEFAULT_MAX_WORKERS, DEFAULT_SUFFIX};
pub use coordinator::{scan_object, NoopObserver, ScanCoordinator, ScanObserver, ShutdownHandle};
pub use enumerate::{normalize_prefix, Enumerator};
pub use extract::{extract_field, normalize_policy, ColumnRange, DEFAULT_COLUMNS};
pub use filter::{KeyFilter, MatchAllFilter, SuffixFilter};
pub use lines::DataLines;
pub use matcher::{scan_lines, ScanOutcome};
pub use s3::{create_s3_client, S3Config, S3ObjectStore};
pub use stats::{ScanStats, ScanSummary};
pub use store::{MemoryObjectStore, ObjectReader, ObjectStore};

/// Identifies one object within a bucket.
///
/// Immutable once listed; created during enumeration and consumed exactly
/// once by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectKey {
    /// The bucket holding the object
    pub bucket: String,

    /// The object's full path within the bucket
    pub key: String,
}

impl ObjectKey {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// The object's S3 URI, e.g. `s3://bucket/path/file.txt`.
    pub fn uri(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.uri())
    }
}
