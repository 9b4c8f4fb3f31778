//! The object-store capability consumed by the scanning engine.
//!
//! The engine needs exactly two operations from remote storage: list the
//! keys under a bucket/prefix and open one object for sequential reading.
//! [`ObjectStore`] captures that seam so the coordinator can be driven by
//! the real S3 backend or by [`MemoryObjectStore`] in tests.

use std::collections::{BTreeMap, HashSet};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::Stream;
use ps_error::{PsError, Result, RetrievalError};
use tokio::io::{AsyncBufRead, AsyncRead, BufReader, ReadBuf};
use tokio::sync::OwnedSemaphorePermit;

use crate::ObjectKey;

/// A paginated, logically continuous stream of object keys.
pub type KeyStream = Pin<Box<dyn Stream<Item = Result<ObjectKey>> + Send>>;

/// Forward-only reader over one object's content.
///
/// May hold a connection-pool permit for the lifetime of the read, so the
/// pooled connection is released only when the reader is dropped.
pub struct ObjectReader {
    inner: Pin<Box<dyn AsyncBufRead + Send>>,
    _permit: Option<OwnedSemaphorePermit>,
}

impl ObjectReader {
    /// Wrap a buffered reader without any pool accounting.
    pub fn new(inner: Pin<Box<dyn AsyncBufRead + Send>>) -> Self {
        Self {
            inner,
            _permit: None,
        }
    }

    /// Wrap a buffered reader that occupies a pooled connection.
    pub fn with_permit(
        inner: Pin<Box<dyn AsyncBufRead + Send>>,
        permit: OwnedSemaphorePermit,
    ) -> Self {
        Self {
            inner,
            _permit: Some(permit),
        }
    }
}

impl AsyncRead for ObjectReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.get_mut().inner.as_mut().poll_read(cx, buf)
    }
}

impl AsyncBufRead for ObjectReader {
    fn poll_fill_buf(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<&[u8]>> {
        self.get_mut().inner.as_mut().poll_fill_buf(cx)
    }

    fn consume(self: Pin<&mut Self>, amt: usize) {
        self.get_mut().inner.as_mut().consume(amt)
    }
}

/// Remote object storage as the scanning engine sees it.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List all object keys under `bucket`/`prefix`, recursively.
    ///
    /// Pagination is handled behind the stream; the caller sees one
    /// continuous sequence. A listing failure is fatal to the run.
    fn list(&self, bucket: &str, prefix: Option<&str>) -> KeyStream;

    /// Open one object for sequential reading.
    ///
    /// Issues exactly one retrieval request; the returned reader is
    /// forward-only and not restartable.
    async fn open(&self, key: &ObjectKey) -> Result<ObjectReader>;
}

/// In-memory object store.
///
/// Serves uploaded string bodies from a map, with optional injected
/// failures. Used by coordinator tests and usable wherever a scan needs to
/// run against locally assembled fixtures.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: BTreeMap<String, Vec<u8>>,
    fail_open: HashSet<String>,
    listing_error: bool,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object body under `key`.
    pub fn insert(&mut self, key: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.objects.insert(key.into(), body.into());
    }

    /// Make `open` fail for `key` with a retrieval error.
    pub fn fail_open(&mut self, key: impl Into<String>) {
        self.fail_open.insert(key.into());
    }

    /// Make the listing stream end with an error after yielding all keys.
    pub fn fail_listing(&mut self) {
        self.listing_error = true;
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn list(&self, bucket: &str, prefix: Option<&str>) -> KeyStream {
        let bucket = bucket.to_string();
        let prefix = prefix.unwrap_or_default().to_string();
        let keys: Vec<String> = self
            .objects
            .keys()
            .filter(|k| k.starts_with(&prefix))
            .cloned()
            .collect();
        let listing_error = self.listing_error;

        Box::pin(futures::stream::iter(
            keys.into_iter()
                .map(move |key| Ok(ObjectKey::new(bucket.clone(), key)))
                .chain(
                    listing_error
                        .then(|| Err(PsError::List("injected listing failure".to_string()))),
                ),
        ))
    }

    async fn open(&self, key: &ObjectKey) -> Result<ObjectReader> {
        if self.fail_open.contains(&key.key) {
            return Err(RetrievalError::Request(format!(
                "injected failure for {}",
                key.uri()
            ))
            .into());
        }

        let body = self
            .objects
            .get(&key.key)
            .ok_or_else(|| RetrievalError::NotFound(key.uri()))?
            .clone();

        Ok(ObjectReader::new(Box::pin(BufReader::new(
            std::io::Cursor::new(body),
        ))))
    }
}
