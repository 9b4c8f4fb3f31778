//! ps-scan CLI
//!
//! Concurrent policy-number search over S3 report objects.

use clap::Parser;
use ps_scanner::normalize_policy;

mod args;
mod progress;
mod run;

use args::{Cli, OutputFormatArg};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    // Initialize logging (to stderr, so stdout is clean for matching keys)
    run::init_logging(args.log_level)?;

    let output_format = args.output_format;
    let policy = normalize_policy(&args.policy);

    // Run the scan
    let summary = run::execute(args).await?;

    // Matching keys to stdout so the list can be piped
    for key in &summary.matches {
        match output_format {
            OutputFormatArg::Lines => println!("{}", key.uri()),
            OutputFormatArg::Jsonl => println!("{}", serde_json::to_string(key)?),
        }
    }

    // Report results to stderr
    eprintln!();
    eprintln!("Scan completed:");
    eprintln!("  Objects scanned:  {}", summary.objects_scanned);
    eprintln!("  Objects matched:  {}", summary.objects_matched);
    eprintln!("  Objects failed:   {}", summary.objects_failed);
    eprintln!("  Data lines:       {}", summary.data_lines);
    eprintln!("  Bytes read:       {}", format_bytes(summary.bytes_read));
    eprintln!(
        "  Duration:         {:.2}s",
        summary.duration().num_milliseconds() as f64 / 1000.0
    );

    if let Some(ops) = summary.objects_per_second() {
        eprintln!("  Throughput:       {:.1} objects/sec", ops);
    }

    if !summary.has_matches() {
        eprintln!();
        eprintln!("No objects contain policy {:?} in the configured columns.", policy);
    }

    if summary.has_failures() {
        std::process::exit(4); // Partial failure
    }

    Ok(())
}

/// Format bytes as human-readable string.
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
