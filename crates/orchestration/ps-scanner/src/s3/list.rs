//! S3 object listing with pagination support.

use std::sync::Arc;

use async_stream::try_stream;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client;
use futures::Stream;
use ps_error::{PsError, Result};
use tokio::sync::Semaphore;
use tracing::debug;

use crate::ObjectKey;

/// List object keys in an S3 bucket with optional prefix filtering.
///
/// Returns a stream of [`ObjectKey`] items, issuing as many ListObjectsV2
/// requests as the namespace needs and following continuation tokens, so
/// the caller sees one continuous sequence. Directory markers (keys ending
/// with `/`) are skipped. Each page request occupies a pooled connection
/// while in flight.
pub(crate) fn list_objects(
    client: Client,
    bucket: String,
    prefix: Option<String>,
    pool: Arc<Semaphore>,
) -> impl Stream<Item = Result<ObjectKey>> + Send {
    try_stream! {
        let mut continuation_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let permit = pool
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| PsError::List(format!("connection pool closed: {}", e)))?;

            let mut req = client.list_objects_v2().bucket(&bucket);

            if let Some(ref prefix) = prefix {
                req = req.prefix(prefix);
            }

            if let Some(ref token) = continuation_token {
                req = req.continuation_token(token);
            }

            let resp = req.send().await.map_err(|e| {
                PsError::List(format!(
                    "S3 list objects failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

            drop(permit);
            pages += 1;

            if let Some(contents) = resp.contents {
                for obj in contents {
                    let key = obj.key.unwrap_or_default();

                    // Skip directory markers
                    if key.ends_with('/') || key.is_empty() {
                        continue;
                    }

                    yield ObjectKey::new(bucket.clone(), key);
                }
            }

            // Check if there are more results
            if resp.is_truncated == Some(true) {
                continuation_token = resp.next_continuation_token;
                if continuation_token.is_none() {
                    break;
                }
            } else {
                break;
            }
        }

        debug!(bucket = %bucket, prefix = ?prefix, pages, "Listing exhausted");
    }
}
