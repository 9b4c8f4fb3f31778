//! End-to-end scan tests using LocalStack.
//!
//! These tests verify that listing, streaming and matching work against a
//! real S3-compatible endpoint. They are ignored by default; start
//! LocalStack (or set `LOCALSTACK_ENDPOINT`) and run
//! `cargo test -- --ignored` to exercise them.

use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use parking_lot::Mutex;
use ps_error::PsError;
use ps_scanner::{
    create_s3_client, NoopObserver, ObjectKey, S3Config, S3ObjectStore, ScanConfig,
    ScanCoordinator, ScanObserver, ScanOutcome, ScanSummary,
};

const POLICY: &str = "6H1096926";

/// LocalStack test context providing an S3 client.
struct LocalStackTestContext {
    s3: S3Client,
    endpoint: String,
}

impl LocalStackTestContext {
    /// Create a new LocalStack test context.
    ///
    /// Uses the `LOCALSTACK_ENDPOINT` environment variable if set,
    /// otherwise defaults to `http://localhost:4566`.
    async fn new() -> Self {
        let endpoint = std::env::var("LOCALSTACK_ENDPOINT")
            .unwrap_or_else(|_| "http://localhost:4566".to_string());

        let config = S3Config::new()
            .with_region("us-east-1")
            .with_endpoint(&endpoint)
            .with_credentials("test", "test");

        let s3 = create_s3_client(&config).await.unwrap();

        Self { s3, endpoint }
    }

    /// Check if LocalStack is available and healthy.
    async fn is_available(&self) -> bool {
        self.s3.list_buckets().send().await.is_ok()
    }

    /// Create an S3 bucket for testing if it does not exist yet.
    async fn create_bucket(&self, name: &str) {
        let buckets = self.s3.list_buckets().send().await.unwrap();
        let exists = buckets
            .buckets()
            .iter()
            .any(|b| b.name().unwrap_or_default() == name);

        if !exists {
            self.s3.create_bucket().bucket(name).send().await.unwrap();
        }
    }

    /// Upload a text report object.
    async fn upload_text(&self, bucket: &str, key: &str, body: &str) {
        self.s3
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body.as_bytes().to_vec().into())
            .content_type("text/plain")
            .send()
            .await
            .unwrap();
    }

    /// Build a store sized like the scan config it will serve.
    fn store(&self, config: &ScanConfig) -> Arc<S3ObjectStore> {
        Arc::new(S3ObjectStore::new(self.s3.clone(), config.max_connections))
    }
}

/// Observer that collects matched keys for verification.
#[derive(Default)]
struct CollectingObserver {
    matches: Mutex<Vec<ObjectKey>>,
}

impl ScanObserver for CollectingObserver {
    fn object_scanned(&self, _key: &ObjectKey, _outcome: &ScanOutcome) {}

    fn match_found(&self, key: &ObjectKey) {
        self.matches.lock().push(key.clone());
    }
}

fn matching_body() -> String {
    "HEADER 2024-01-01\n155396H1096926         REST\nTRAILER 1\n".to_string()
}

fn plain_body() -> String {
    "HEADER 2024-01-01\n12345ZZZZZZZZZ         REST\n12345YYYYYYYYY         REST\nTRAILER 2\n"
        .to_string()
}

async fn run_scan(ctx: &LocalStackTestContext, config: ScanConfig) -> ScanSummary {
    let store = ctx.store(&config);
    let coordinator = ScanCoordinator::new(store, config);
    coordinator.run(Arc::new(NoopObserver)).await.unwrap()
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_scan_finds_policy_across_objects() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available at {}, skipping test", ctx.endpoint);
        return;
    }

    let bucket = "ps-scan-test-basic";
    ctx.create_bucket(bucket).await;

    ctx.upload_text(bucket, "WCSTAT/match.txt", &matching_body())
        .await;
    ctx.upload_text(bucket, "WCSTAT/plain.txt", &plain_body())
        .await;
    ctx.upload_text(bucket, "WCSTAT/ignored.csv", &matching_body())
        .await;
    ctx.upload_text(bucket, "OTHER/outside.txt", &matching_body())
        .await;

    let config = ScanConfig::new(bucket, POLICY).with_prefix("WCSTAT/");
    let store = ctx.store(&config);
    let coordinator = ScanCoordinator::new(store, config);
    let observer = Arc::new(CollectingObserver::default());

    let summary = coordinator.run(observer.clone()).await.unwrap();

    // Only the two .txt objects under the prefix were scanned
    assert_eq!(summary.objects_scanned, 2);
    assert_eq!(summary.objects_matched, 1);
    assert_eq!(summary.objects_failed, 0);
    assert_eq!(summary.matches[0].key, "WCSTAT/match.txt");

    let observed = observer.matches.lock();
    assert_eq!(observed.len(), 1);
    assert_eq!(observed[0].key, "WCSTAT/match.txt");
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_prefix_with_and_without_slash_agree() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available at {}, skipping test", ctx.endpoint);
        return;
    }

    let bucket = "ps-scan-test-prefix";
    ctx.create_bucket(bucket).await;

    ctx.upload_text(bucket, "WCSTAT/one.txt", &matching_body())
        .await;
    ctx.upload_text(bucket, "WCSTAT2/two.txt", &matching_body())
        .await;

    let bare = run_scan(
        &ctx,
        ScanConfig::new(bucket, POLICY).with_prefix("WCSTAT"),
    )
    .await;
    let slashed = run_scan(
        &ctx,
        ScanConfig::new(bucket, POLICY).with_prefix("WCSTAT/"),
    )
    .await;

    assert_eq!(bare.objects_scanned, 1);
    assert_eq!(slashed.objects_scanned, 1);
    assert_eq!(bare.matches, slashed.matches);
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_missing_bucket_is_fatal() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available at {}, skipping test", ctx.endpoint);
        return;
    }

    let config = ScanConfig::new("ps-scan-test-no-such-bucket", POLICY);
    let store = ctx.store(&config);
    let coordinator = ScanCoordinator::new(store, config);

    let result = coordinator.run(Arc::new(NoopObserver)).await;
    assert!(matches!(result, Err(PsError::List(_))));
}
