//! Statistics and the final summary for scan runs.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::matcher::ScanOutcome;
use crate::ObjectKey;

/// Live counters updated by concurrent scan tasks.
///
/// Counters are atomics and the match list is mutex-guarded, so updates
/// from any number of workers are never lost and never double-counted.
/// Reads for final reporting go through [`ScanStats::snapshot`], which the
/// coordinator calls only after every task has joined.
#[derive(Debug)]
pub struct ScanStats {
    /// When the run started
    started_at: DateTime<Utc>,

    /// Objects retrieved and scanned to completion (or first match)
    objects_scanned: AtomicU64,

    /// Objects whose retrieval failed; excluded from objects_scanned
    objects_failed: AtomicU64,

    /// Data lines examined across all objects
    data_lines: AtomicU64,

    /// Bytes consumed from object streams
    bytes_read: AtomicU64,

    /// Matching keys in discovery order
    matches: Mutex<Vec<ObjectKey>>,
}

impl ScanStats {
    /// Create a stats tracker with the current time as start time.
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            objects_scanned: AtomicU64::new(0),
            objects_failed: AtomicU64::new(0),
            data_lines: AtomicU64::new(0),
            bytes_read: AtomicU64::new(0),
            matches: Mutex::new(Vec::new()),
        }
    }

    /// Record a successfully scanned object.
    pub fn record_outcome(&self, key: &ObjectKey, outcome: &ScanOutcome) {
        self.objects_scanned.fetch_add(1, Ordering::Relaxed);
        self.data_lines
            .fetch_add(outcome.data_lines, Ordering::Relaxed);
        self.bytes_read
            .fetch_add(outcome.bytes_read, Ordering::Relaxed);

        if outcome.matched {
            self.matches.lock().push(key.clone());
        }
    }

    /// Record an object whose retrieval or read failed.
    pub fn record_failure(&self) {
        self.objects_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Objects scanned so far.
    pub fn objects_scanned(&self) -> u64 {
        self.objects_scanned.load(Ordering::Relaxed)
    }

    /// Objects failed so far.
    pub fn objects_failed(&self) -> u64 {
        self.objects_failed.load(Ordering::Relaxed)
    }

    /// Matches found so far.
    pub fn matches_found(&self) -> u64 {
        self.matches.lock().len() as u64
    }

    /// Take a completed-run snapshot.
    pub fn snapshot(&self) -> ScanSummary {
        let matches = self.matches.lock().clone();
        ScanSummary {
            started_at: self.started_at,
            completed_at: Utc::now(),
            objects_scanned: self.objects_scanned.load(Ordering::Relaxed),
            objects_matched: matches.len() as u64,
            objects_failed: self.objects_failed.load(Ordering::Relaxed),
            data_lines: self.data_lines.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            matches,
        }
    }
}

impl Default for ScanStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Final aggregated result of a scan run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run completed
    pub completed_at: DateTime<Utc>,

    /// Objects retrieved and scanned (failures excluded)
    pub objects_scanned: u64,

    /// Objects containing the policy number
    pub objects_matched: u64,

    /// Objects whose retrieval failed
    pub objects_failed: u64,

    /// Data lines examined across all objects
    pub data_lines: u64,

    /// Bytes consumed from object streams
    pub bytes_read: u64,

    /// Matching keys in discovery order (not guaranteed stable across runs)
    pub matches: Vec<ObjectKey>,
}

impl ScanSummary {
    /// Duration of the run.
    pub fn duration(&self) -> Duration {
        self.completed_at - self.started_at
    }

    /// Whether any object failed to scan.
    pub fn has_failures(&self) -> bool {
        self.objects_failed > 0
    }

    /// Whether any object matched.
    pub fn has_matches(&self) -> bool {
        !self.matches.is_empty()
    }

    /// Throughput in objects per second.
    pub fn objects_per_second(&self) -> Option<f64> {
        let secs = self.duration().num_milliseconds() as f64 / 1000.0;
        if secs > 0.0 {
            Some(self.objects_scanned as f64 / secs)
        } else {
            None
        }
    }
}
