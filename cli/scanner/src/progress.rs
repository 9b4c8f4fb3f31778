//! Progress reporting for ps-scan.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use ps_scanner::{ObjectKey, PsError, ScanObserver, ScanOutcome};
use tokio::task::JoinHandle;

/// Progress reporter for scan runs.
///
/// Owns the shared counters and a background task that prints a progress
/// line to stderr at a fixed interval. The paired [`ProgressObserver`]
/// feeds the counters from the scan's worker tasks and announces matches
/// the moment they are found.
pub struct ProgressReporter {
    /// Whether periodic reporting is enabled
    enabled: bool,
    /// Reporting interval
    interval: Duration,
    /// Shared state for progress tracking
    state: Arc<ProgressState>,
    /// Handle to the background reporter task
    handle: Option<JoinHandle<()>>,
}

/// Shared state for progress tracking.
struct ProgressState {
    objects_scanned: AtomicU64,
    objects_failed: AtomicU64,
    matches_found: AtomicU64,
    bytes_read: AtomicU64,
    /// Whether to stop reporting
    stop: AtomicBool,
    start_time: Instant,
}

impl ProgressReporter {
    /// Create a new progress reporter; `interval_secs == 0` disables the
    /// periodic line (matches are still announced).
    pub fn new(interval_secs: u64) -> Self {
        Self {
            enabled: interval_secs > 0,
            interval: Duration::from_secs(interval_secs.max(1)),
            state: Arc::new(ProgressState {
                objects_scanned: AtomicU64::new(0),
                objects_failed: AtomicU64::new(0),
                matches_found: AtomicU64::new(0),
                bytes_read: AtomicU64::new(0),
                stop: AtomicBool::new(false),
                start_time: Instant::now(),
            }),
            handle: None,
        }
    }

    /// The observer to hand to the coordinator.
    pub fn observer(&self) -> Arc<ProgressObserver> {
        Arc::new(ProgressObserver {
            state: Arc::clone(&self.state),
        })
    }

    /// Start the background progress reporter.
    pub fn start(&mut self) {
        if !self.enabled {
            return;
        }

        let state = Arc::clone(&self.state);
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);
            interval_timer.tick().await; // Skip first immediate tick

            loop {
                interval_timer.tick().await;

                if state.stop.load(Ordering::Relaxed) {
                    break;
                }

                let scanned = state.objects_scanned.load(Ordering::Relaxed);
                let failed = state.objects_failed.load(Ordering::Relaxed);
                let matches = state.matches_found.load(Ordering::Relaxed);
                let bytes = state.bytes_read.load(Ordering::Relaxed);
                let elapsed = state.start_time.elapsed();

                let _ = writeln!(
                    io::stderr(),
                    "[Progress] {} objects scanned, {} matches, {} failed, {:.1} MB read ({:.1}s elapsed)",
                    scanned,
                    matches,
                    failed,
                    bytes as f64 / 1_000_000.0,
                    elapsed.as_secs_f64()
                );
            }
        });

        self.handle = Some(handle);
    }

    /// Stop the background reporter.
    pub async fn stop(mut self) {
        if !self.enabled {
            return;
        }

        self.state.stop.store(true, Ordering::Relaxed);

        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
        }
    }
}

/// Observer feeding the progress counters from scan worker tasks.
pub struct ProgressObserver {
    state: Arc<ProgressState>,
}

impl ScanObserver for ProgressObserver {
    fn object_scanned(&self, _key: &ObjectKey, outcome: &ScanOutcome) {
        self.state.objects_scanned.fetch_add(1, Ordering::Relaxed);
        self.state
            .bytes_read
            .fetch_add(outcome.bytes_read, Ordering::Relaxed);
    }

    fn object_failed(&self, _key: &ObjectKey, _error: &PsError) {
        self.state.objects_failed.fetch_add(1, Ordering::Relaxed);
    }

    fn match_found(&self, key: &ObjectKey) {
        self.state.matches_found.fetch_add(1, Ordering::Relaxed);
        // Incremental notification, the full list goes to stdout at the end
        let _ = writeln!(io::stderr(), "  Match: {}", key.uri());
    }
}
