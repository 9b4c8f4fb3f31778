//! S3-backed object store with a bounded connection pool.

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client;
use ps_error::{Result, RetrievalError};
use tokio::io::BufReader;
use tokio::sync::Semaphore;
use tracing::debug;

use super::list::list_objects;
use crate::store::{KeyStream, ObjectReader, ObjectStore};
use crate::ObjectKey;

/// Buffer size for reading object bodies.
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// [`ObjectStore`] implementation over aws-sdk-s3.
///
/// Listing pages and object retrievals share one semaphore sized to the
/// configured connection bound; when it is exhausted new requests wait
/// instead of opening further connections, independent of how many keys the
/// namespace holds. A retrieval's permit is held until its reader is
/// dropped, since the connection stays busy for the whole streaming read.
pub struct S3ObjectStore {
    client: Client,
    pool: Arc<Semaphore>,
}

impl S3ObjectStore {
    /// Create a store with at most `max_connections` concurrent requests.
    pub fn new(client: Client, max_connections: usize) -> Self {
        Self {
            client,
            pool: Arc::new(Semaphore::new(max_connections)),
        }
    }

    /// Get the underlying S3 client.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn list(&self, bucket: &str, prefix: Option<&str>) -> KeyStream {
        Box::pin(list_objects(
            self.client.clone(),
            bucket.to_string(),
            prefix.map(|p| p.to_string()),
            self.pool.clone(),
        ))
    }

    async fn open(&self, key: &ObjectKey) -> Result<ObjectReader> {
        let permit = self
            .pool
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| RetrievalError::Request(format!("connection pool closed: {}", e)))?;

        debug!(key = %key.uri(), "Opening object");

        let resp = match self
            .client
            .get_object()
            .bucket(&key.bucket)
            .key(&key.key)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                let uri = key.uri();
                let err = if e
                    .as_service_error()
                    .map(|se| se.is_no_such_key())
                    .unwrap_or(false)
                {
                    RetrievalError::NotFound(uri)
                } else {
                    let msg = DisplayErrorContext(&e).to_string();
                    if msg.to_lowercase().contains("access denied") {
                        RetrievalError::AccessDenied(uri)
                    } else {
                        RetrievalError::Request(format!("{}: {}", uri, msg))
                    }
                };
                return Err(err.into());
            }
        };

        let reader = BufReader::with_capacity(READ_BUFFER_SIZE, resp.body.into_async_read());
        Ok(ObjectReader::with_permit(Box::pin(reader), permit))
    }
}
