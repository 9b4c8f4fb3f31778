//! Per-object match detection.

use ps_error::{Result, RetrievalError};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncBufRead;
use tracing::trace;

use crate::extract::{extract_field, ColumnRange};
use crate::lines::DataLines;

/// Result of scanning one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOutcome {
    /// Whether any data line carried the target policy number
    pub matched: bool,

    /// Data lines examined (up to the match, or all of them)
    pub data_lines: u64,

    /// Bytes consumed from the object stream
    pub bytes_read: u64,
}

/// Scan one object's line stream for the target policy number.
///
/// Iterates data lines, extracts the configured column range from each and
/// compares against the already-normalized `target`. Stops at the first hit
/// without reading the remainder of the object, which bounds cost for large
/// matching objects. Lines too short to reach the range never match and are
/// not errors.
///
/// Scanning the same object twice (fresh streams) yields the same outcome.
pub async fn scan_lines<R>(reader: R, target: &str, columns: &ColumnRange) -> Result<ScanOutcome>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = DataLines::new(reader);
    let mut data_lines = 0u64;

    loop {
        let line = lines
            .next_data_line()
            .await
            .map_err(|e| RetrievalError::Io(e.to_string()))?;

        let Some(line) = line else {
            return Ok(ScanOutcome {
                matched: false,
                data_lines,
                bytes_read: lines.bytes_read(),
            });
        };

        data_lines += 1;

        if let Some(field) = extract_field(&line, columns) {
            if field == target {
                trace!(data_lines, "Matched policy number");
                return Ok(ScanOutcome {
                    matched: true,
                    data_lines,
                    bytes_read: lines.bytes_read(),
                });
            }
        }
    }
}
