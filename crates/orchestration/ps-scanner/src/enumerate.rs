//! Object enumeration: prefix normalization, listing, suffix filtering.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use ps_error::Result;
use tracing::debug;

use crate::filter::KeyFilter;
use crate::store::ObjectStore;
use crate::ObjectKey;

/// Normalize a user-supplied listing prefix.
///
/// An empty (or whitespace-only) prefix means the entire bucket. A
/// non-empty prefix gets a trailing `/` appended when missing, so
/// `"WCSTAT"` and `"WCSTAT/"` enumerate the same namespace rather than
/// `"WCSTAT"` also matching `"WCSTAT2/..."`.
pub fn normalize_prefix(prefix: &str) -> Option<String> {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        None
    } else if prefix.ends_with('/') {
        Some(prefix.to_string())
    } else {
        Some(format!("{}/", prefix))
    }
}

/// Produces the candidate object keys for one scan run.
///
/// Wraps the store's listing with prefix normalization and key filtering,
/// so keys that are not candidate report objects never reach the
/// coordinator and the scan's cost is driven only by objects worth
/// retrieving.
pub struct Enumerator<S, F> {
    store: Arc<S>,
    bucket: String,
    prefix: Option<String>,
    filter: F,
}

impl<S: ObjectStore, F: KeyFilter> Enumerator<S, F> {
    /// Create an enumerator; `prefix` is raw user input and is normalized
    /// here.
    pub fn new(store: Arc<S>, bucket: impl Into<String>, prefix: &str, filter: F) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            prefix: normalize_prefix(prefix),
            filter,
        }
    }

    /// The normalized prefix, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// All qualifying keys under the bucket/prefix as one stream.
    ///
    /// Listing errors pass through so the caller can treat them as fatal.
    pub fn keys(&self) -> impl Stream<Item = Result<ObjectKey>> + '_ {
        debug!(
            bucket = %self.bucket,
            prefix = ?self.prefix,
            filter = %self.filter.description(),
            "Starting enumeration"
        );

        self.store
            .list(&self.bucket, self.prefix.as_deref())
            .filter(move |result| {
                let keep = match result {
                    Ok(key) => self.filter.matches(&key.key),
                    Err(_) => true,
                };
                futures::future::ready(keep)
            })
    }
}
