//! Scan orchestration: bounded-concurrency dispatch and aggregation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::{pin_mut, StreamExt};
use ps_error::{PsError, Result};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use crate::config::ScanConfig;
use crate::enumerate::Enumerator;
use crate::extract::{normalize_policy, ColumnRange};
use crate::filter::SuffixFilter;
use crate::matcher::{scan_lines, ScanOutcome};
use crate::stats::{ScanStats, ScanSummary};
use crate::store::ObjectStore;
use crate::ObjectKey;

/// Receives scan events as soon as each result is known.
///
/// Implementations must be cheap and non-blocking; they run on the worker
/// tasks. The default methods ignore every event.
pub trait ScanObserver: Send + Sync {
    /// An object was retrieved and scanned.
    fn object_scanned(&self, key: &ObjectKey, outcome: &ScanOutcome) {
        let _ = (key, outcome);
    }

    /// An object's retrieval or read failed.
    fn object_failed(&self, key: &ObjectKey, error: &PsError) {
        let _ = (key, error);
    }

    /// An object matched the policy number.
    fn match_found(&self, key: &ObjectKey) {
        let _ = key;
    }
}

/// Observer that ignores all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ScanObserver for NoopObserver {}

/// Handle for requesting cooperative shutdown of a running scan.
///
/// Shutdown stops the coordinator from dispatching further objects;
/// already-dispatched scans run to completion and the aggregated summary
/// stays consistent.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Request shutdown.
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Drives a scan run to completion under the configured bounds.
///
/// Pulls keys from the [`Enumerator`], dispatches each to a worker task
/// gated by the in-flight bound, and aggregates per-object results into the
/// run summary. A single object's failure never aborts the run; an
/// enumeration failure does, after in-flight work drains.
pub struct ScanCoordinator<S> {
    store: Arc<S>,
    config: ScanConfig,
    shutdown: Arc<AtomicBool>,
}

impl<S: ObjectStore + 'static> ScanCoordinator<S> {
    /// Create a coordinator over a store and validated-or-validatable
    /// configuration.
    pub fn new(store: Arc<S>, config: ScanConfig) -> Self {
        Self {
            store,
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a handle for requesting cooperative shutdown.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: self.shutdown.clone(),
        }
    }

    /// Run the scan to completion.
    ///
    /// # Returns
    ///
    /// The aggregated [`ScanSummary`], produced only after every dispatched
    /// scan has completed. Configuration and enumeration errors abort the
    /// run with no summary.
    pub async fn run(&self, observer: Arc<dyn ScanObserver>) -> Result<ScanSummary> {
        self.config.validate()?;

        let target = normalize_policy(&self.config.policy);
        let columns = self.config.columns;
        let stats = Arc::new(ScanStats::new());

        info!(
            bucket = %self.config.bucket,
            prefix = %self.config.prefix,
            columns = %columns,
            workers = self.config.max_workers,
            connections = self.config.max_connections,
            "Starting scan"
        );

        let enumerator = Enumerator::new(
            self.store.clone(),
            &self.config.bucket,
            &self.config.prefix,
            SuffixFilter::new(&self.config.suffix),
        );
        let keys = enumerator.keys();
        pin_mut!(keys);

        let limiter = Arc::new(Semaphore::new(self.config.max_workers));
        let mut tasks = JoinSet::new();
        let mut listing_error: Option<PsError> = None;

        while let Some(next) = keys.next().await {
            if self.shutdown.load(Ordering::Relaxed) {
                warn!("Shutdown requested, not dispatching further objects");
                break;
            }

            let key = match next {
                Ok(key) => key,
                Err(e) => {
                    listing_error = Some(e);
                    break;
                }
            };

            let permit = limiter
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| PsError::Config(format!("worker limiter closed: {}", e)))?;

            debug!(key = %key.uri(), "Dispatching object");

            let store = self.store.clone();
            let stats = stats.clone();
            let observer = observer.clone();
            let target = target.clone();

            tasks.spawn(async move {
                let _permit = permit;
                scan_one(
                    store.as_ref(),
                    &key,
                    &target,
                    &columns,
                    stats.as_ref(),
                    observer.as_ref(),
                )
                .await;
            });

            // Reap finished tasks so the set does not grow with the namespace
            while let Some(joined) = tasks.try_join_next() {
                log_panicked(joined);
            }
        }

        // The summary is only meaningful after every dispatched scan joined
        while let Some(joined) = tasks.join_next().await {
            log_panicked(joined);
        }

        if let Some(e) = listing_error {
            error!(error = %e, "Enumeration failed, aborting run");
            return Err(e);
        }

        let summary = stats.snapshot();
        info!(
            objects_scanned = summary.objects_scanned,
            objects_matched = summary.objects_matched,
            objects_failed = summary.objects_failed,
            data_lines = summary.data_lines,
            "Scan completed"
        );

        Ok(summary)
    }
}

/// Scan a single object via the store.
///
/// Issues one retrieval request and runs the matcher over the resulting
/// line stream.
pub async fn scan_object<S: ObjectStore + ?Sized>(
    store: &S,
    key: &ObjectKey,
    target: &str,
    columns: &ColumnRange,
) -> Result<ScanOutcome> {
    let reader = store.open(key).await?;
    scan_lines(reader, target, columns).await
}

async fn scan_one<S: ObjectStore + ?Sized>(
    store: &S,
    key: &ObjectKey,
    target: &str,
    columns: &ColumnRange,
    stats: &ScanStats,
    observer: &dyn ScanObserver,
) {
    match scan_object(store, key, target, columns).await {
        Ok(outcome) => {
            stats.record_outcome(key, &outcome);
            observer.object_scanned(key, &outcome);
            if outcome.matched {
                debug!(key = %key.uri(), data_lines = outcome.data_lines, "Match");
                observer.match_found(key);
            }
        }
        Err(error) => {
            warn!(key = %key.uri(), error = %error, "Failed to scan object");
            stats.record_failure();
            observer.object_failed(key, &error);
        }
    }
}

fn log_panicked(joined: std::result::Result<(), JoinError>) {
    if let Err(e) = joined {
        error!(error = %e, "Scan task panicked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryObjectStore;
    use parking_lot::Mutex;
    use std::collections::HashSet;

    const POLICY: &str = "6H1096926";
    const MATCHING_LINE: &str = "155396H1096926         ";

    fn matching_body() -> String {
        format!("HEADER\n{}\nFOOTER\n", MATCHING_LINE)
    }

    fn plain_body(lines: usize) -> String {
        let mut body = String::from("HEADER\n");
        for i in 0..lines {
            body.push_str(&format!("12345REC{:014}     \n", i));
        }
        body.push_str("FOOTER\n");
        body
    }

    #[derive(Default)]
    struct CollectingObserver {
        scanned: Mutex<Vec<String>>,
        matched: Mutex<Vec<String>>,
        failed: Mutex<Vec<String>>,
    }

    impl ScanObserver for CollectingObserver {
        fn object_scanned(&self, key: &ObjectKey, _outcome: &ScanOutcome) {
            self.scanned.lock().push(key.key.clone());
        }

        fn object_failed(&self, key: &ObjectKey, _error: &PsError) {
            self.failed.lock().push(key.key.clone());
        }

        fn match_found(&self, key: &ObjectKey) {
            self.matched.lock().push(key.key.clone());
        }
    }

    fn fixture_store() -> MemoryObjectStore {
        let mut store = MemoryObjectStore::new();
        for i in 0..10 {
            let key = format!("WCSTAT/report{:02}.txt", i);
            if i % 3 == 0 {
                store.insert(key, matching_body());
            } else {
                store.insert(key, plain_body(5));
            }
        }
        store
    }

    fn config() -> ScanConfig {
        ScanConfig::new("bucket", POLICY).with_prefix("WCSTAT")
    }

    async fn run_with_workers(workers: usize) -> ScanSummary {
        let store = Arc::new(fixture_store());
        let coordinator =
            ScanCoordinator::new(store, config().with_max_workers(workers));
        coordinator.run(Arc::new(NoopObserver)).await.unwrap()
    }

    #[tokio::test]
    async fn test_totals_are_independent_of_worker_bound() {
        let single = run_with_workers(1).await;
        let some = run_with_workers(3).await;
        let many = run_with_workers(10).await;

        for summary in [&single, &some, &many] {
            assert_eq!(summary.objects_scanned, 10);
            assert_eq!(summary.objects_failed, 0);
        }

        let as_set = |s: &ScanSummary| -> HashSet<String> {
            s.matches.iter().map(|k| k.key.clone()).collect()
        };
        assert_eq!(as_set(&single), as_set(&some));
        assert_eq!(as_set(&some), as_set(&many));
        assert_eq!(single.objects_matched, 4);
    }

    #[tokio::test]
    async fn test_observer_sees_every_completion_and_match() {
        let store = Arc::new(fixture_store());
        let coordinator = ScanCoordinator::new(store, config().with_max_workers(3));
        let observer = Arc::new(CollectingObserver::default());

        let summary = coordinator.run(observer.clone()).await.unwrap();

        assert_eq!(observer.scanned.lock().len() as u64, summary.objects_scanned);
        assert_eq!(observer.matched.lock().len() as u64, summary.objects_matched);
        assert!(observer.failed.lock().is_empty());
    }

    #[tokio::test]
    async fn test_per_object_failure_does_not_abort_the_run() {
        let mut store = fixture_store();
        store.fail_open("WCSTAT/report01.txt");
        store.fail_open("WCSTAT/report02.txt");

        let coordinator = ScanCoordinator::new(Arc::new(store), config());
        let observer = Arc::new(CollectingObserver::default());
        let summary = coordinator.run(observer.clone()).await.unwrap();

        assert_eq!(summary.objects_scanned, 8);
        assert_eq!(summary.objects_failed, 2);
        assert_eq!(observer.failed.lock().len(), 2);
        // Failed objects were not report00/03/06/09, so all matches survive
        assert_eq!(summary.objects_matched, 4);
    }

    #[tokio::test]
    async fn test_enumeration_failure_is_fatal() {
        let mut store = fixture_store();
        store.fail_listing();

        let coordinator = ScanCoordinator::new(Arc::new(store), config());
        let result = coordinator.run(Arc::new(NoopObserver)).await;

        assert!(matches!(result, Err(PsError::List(_))));
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected_before_dispatch() {
        let store = Arc::new(fixture_store());
        let coordinator =
            ScanCoordinator::new(store, ScanConfig::new("bucket", "   "));
        let observer = Arc::new(CollectingObserver::default());

        let result = coordinator.run(observer.clone()).await;

        assert!(matches!(result, Err(PsError::Config(_))));
        assert!(observer.scanned.lock().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_before_run_dispatches_nothing() {
        let store = Arc::new(fixture_store());
        let coordinator = ScanCoordinator::new(store, config());
        coordinator.shutdown_handle().shutdown();

        let summary = coordinator.run(Arc::new(NoopObserver)).await.unwrap();
        assert_eq!(summary.objects_scanned, 0);
    }

    #[tokio::test]
    async fn test_no_candidate_objects_yields_empty_summary() {
        let mut store = MemoryObjectStore::new();
        store.insert("WCSTAT/notes.csv", "irrelevant");

        let coordinator = ScanCoordinator::new(Arc::new(store), config());
        let summary = coordinator.run(Arc::new(NoopObserver)).await.unwrap();

        assert_eq!(summary.objects_scanned, 0);
        assert!(!summary.has_matches());
    }

    #[tokio::test]
    async fn test_scan_object_against_store() {
        let store = fixture_store();
        let key = ObjectKey::new("bucket", "WCSTAT/report00.txt");
        let outcome = scan_object(&store, &key, POLICY, &ColumnRange::default())
            .await
            .unwrap();
        assert!(outcome.matched);
    }
}
