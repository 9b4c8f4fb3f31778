//! Data-line classification over a streaming line source.
//!
//! Report objects bracket their records with a header line and a trailer
//! line. Object length is unknown while streaming, so the trailer cannot be
//! recognized when it is read - only once end-of-stream proves no further
//! line exists. [`DataLines`] solves this with a one-line lookahead buffer:
//! the first line is discarded, each subsequent line is emitted only after
//! its successor arrives, and whatever is buffered at end-of-stream is the
//! trailer and is dropped. One forward pass, O(1) extra memory, independent
//! of the transport the bytes arrive over.

use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Yields the data lines of an object: every line except the first and last.
///
/// Works over any [`AsyncBufRead`]; the source is consumed forward-only and
/// is not restartable. Lines are decoded lossily (a stray non-UTF-8 byte
/// becomes U+FFFD rather than failing the object) and trailing `\n`/`\r`
/// are trimmed.
pub struct DataLines<R> {
    reader: R,
    /// Raw bytes of the line currently being read
    buf: Vec<u8>,
    /// Lookahead: the most recent line, not yet proven non-terminal
    pending: Option<String>,
    /// Whether the header line has been consumed
    started: bool,
    bytes_read: u64,
}

impl<R: AsyncBufRead + Unpin> DataLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            pending: None,
            started: false,
            bytes_read: 0,
        }
    }

    /// Total bytes consumed from the underlying reader so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Read one raw line, or `None` at end of stream.
    async fn read_line(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();
        let n = self.reader.read_until(b'\n', &mut self.buf).await?;
        if n == 0 {
            return Ok(None);
        }
        self.bytes_read += n as u64;

        while matches!(self.buf.last(), Some(b'\n') | Some(b'\r')) {
            self.buf.pop();
        }
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }

    /// Produce the next data line, or `None` when the object is exhausted.
    ///
    /// After `None` is returned the buffered trailer has been discarded and
    /// further calls keep returning `None`.
    pub async fn next_data_line(&mut self) -> io::Result<Option<String>> {
        if !self.started {
            self.started = true;
            // Header line: always metadata, never emitted
            if self.read_line().await?.is_none() {
                return Ok(None);
            }
        }

        loop {
            match self.read_line().await? {
                None => {
                    // Whatever is buffered is the trailer line
                    self.pending = None;
                    return Ok(None);
                }
                Some(line) => {
                    // The buffered line now has a successor, so it is data.
                    // Empty right after the header; loop for one more line.
                    if let Some(prev) = self.pending.replace(line) {
                        return Ok(Some(prev));
                    }
                }
            }
        }
    }
}
