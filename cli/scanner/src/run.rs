//! Main execution logic for the ps-scan CLI.

use std::sync::Arc;

use anyhow::Result;
use ps_scanner::{
    create_s3_client, S3Config, S3ObjectStore, ScanConfig, ScanCoordinator, ScanSummary,
};
use tracing::{warn, Level};
use tracing_subscriber::fmt;

use crate::args::{Cli, LogLevel};
use crate::progress::ProgressReporter;

/// Initialize logging.
pub fn init_logging(level: LogLevel) -> Result<()> {
    let level: Level = level.into();

    let subscriber = fmt::Subscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr); // Log to stderr so stdout is clean for output

    subscriber.init();

    Ok(())
}

/// Execute the scan with the provided arguments.
pub async fn execute(args: Cli) -> Result<ScanSummary> {
    // Build S3 configuration
    let mut s3_config = S3Config::new().with_region(&args.region);

    if let Some(endpoint) = &args.s3_endpoint {
        s3_config = s3_config.with_endpoint(endpoint);
    }

    if let (Some(access_key), Some(secret_key)) = (&args.access_key, &args.secret_key) {
        s3_config = s3_config.with_credentials(access_key, secret_key);
    }

    if let Some(profile) = &args.profile {
        s3_config = s3_config.with_profile(profile);
    }

    let client = create_s3_client(&s3_config).await?;

    // Build scan configuration; the coordinator validates it before work
    // is dispatched
    let config = ScanConfig::new(&args.bucket, &args.policy)
        .with_prefix(&args.prefix)
        .with_columns(args.columns)
        .with_suffix(&args.suffix)
        .with_max_workers(args.workers)
        .with_max_connections(args.max_pool);

    let store = Arc::new(S3ObjectStore::new(client, config.max_connections));
    let coordinator = ScanCoordinator::new(store, config);

    // Ctrl-C stops dispatching new objects; in-flight scans finish and the
    // summary stays consistent
    let shutdown = coordinator.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing in-flight scans");
            shutdown.shutdown();
        }
    });

    let mut reporter = ProgressReporter::new(args.progress_interval);
    let observer = reporter.observer();
    reporter.start();

    let result = coordinator.run(observer).await;
    reporter.stop().await;

    Ok(result?)
}
