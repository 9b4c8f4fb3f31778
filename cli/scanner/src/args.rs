//! CLI argument definitions for ps-scan.

use clap::{Parser, ValueEnum};
use ps_scanner::{ColumnRange, DEFAULT_MAX_CONNECTIONS, DEFAULT_MAX_WORKERS, DEFAULT_SUFFIX};

/// Find which S3 report objects contain a policy number.
///
/// Scans the text objects under a bucket/prefix for a policy number in a
/// fixed column range of their data lines; the first and last line of each
/// object are metadata and are never matched. Matching keys are printed to
/// stdout; logs, progress and the final summary go to stderr.
///
/// ## Examples
///
/// Basic usage:
///   ps-scan -b stat-reports -p WCSTAT 6H1096926
///
/// Tuning parallelism:
///   ps-scan -b stat-reports --workers 64 --max-pool 128 6H1096926
///
/// Against LocalStack:
///   ps-scan -b test-bucket --s3-endpoint http://localhost:4566 6H1096926
#[derive(Parser, Debug)]
#[command(name = "ps-scan")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Policy number to search for
    pub policy: String,

    // === S3 Configuration ===
    /// S3 bucket name
    #[arg(short, long, env = "PS_S3_BUCKET")]
    pub bucket: String,

    /// S3 prefix to scan under (empty = entire bucket)
    #[arg(short, long, env = "PS_S3_PREFIX", default_value = "")]
    pub prefix: String,

    /// Custom S3 endpoint URL (for LocalStack)
    #[arg(long, env = "PS_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS region
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    pub region: String,

    /// AWS access key ID
    #[arg(long, env = "AWS_ACCESS_KEY_ID")]
    pub access_key: Option<String>,

    /// AWS secret access key
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY")]
    pub secret_key: Option<String>,

    /// AWS profile name
    #[arg(long, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    // === Scan Options ===
    /// Column range holding the policy number, 1-based inclusive (e.g. "6-23")
    #[arg(long, default_value = "6-23", value_parser = parse_column_range)]
    pub columns: ColumnRange,

    /// Suffix of candidate objects
    #[arg(long, default_value = DEFAULT_SUFFIX)]
    pub suffix: String,

    // === Parallelism Options ===
    /// Maximum concurrent object scans (must be >= 1)
    #[arg(long, env = "S3_SCAN_WORKERS", default_value_t = DEFAULT_MAX_WORKERS, value_parser = parse_positive_usize)]
    pub workers: usize,

    /// Maximum pooled connections shared by listing and retrieval (must be >= 1)
    #[arg(long, env = "S3_MAX_POOL", default_value_t = DEFAULT_MAX_CONNECTIONS, value_parser = parse_positive_usize)]
    pub max_pool: usize,

    // === Output Options ===
    /// Output format for matching keys on stdout
    #[arg(long, value_enum, default_value = "lines")]
    pub output_format: OutputFormatArg,

    /// Progress reporting interval in seconds (0 = no periodic progress)
    #[arg(long, default_value = "10")]
    pub progress_interval: u64,

    // === Logging Options ===
    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

/// Output format argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormatArg {
    /// One S3 URI per line
    Lines,
    /// One JSON object per line
    Jsonl,
}

/// Log level argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Trace level (most verbose)
    Trace,
    /// Debug level
    Debug,
    /// Info level (default)
    Info,
    /// Warning level
    Warn,
    /// Error level (least verbose)
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Parse a positive usize (>= 1).
fn parse_positive_usize(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if value < 1 {
        return Err(format!("{} is not in 1..", value));
    }
    Ok(value)
}

/// Parse a "start-end" column range, 1-based inclusive.
fn parse_column_range(s: &str) -> Result<ColumnRange, String> {
    let (start, end) = s
        .split_once('-')
        .ok_or_else(|| format!("'{}' is not a START-END column range", s))?;
    let start: usize = start
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a valid column number", start))?;
    let end: usize = end
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a valid column number", end))?;

    ColumnRange::new(start, end).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_column_range() {
        assert_eq!(
            parse_column_range("6-23").unwrap(),
            ColumnRange::new(6, 23).unwrap()
        );
        assert_eq!(
            parse_column_range(" 1 - 9 ").unwrap(),
            ColumnRange::new(1, 9).unwrap()
        );
        assert!(parse_column_range("6").is_err());
        assert!(parse_column_range("6-").is_err());
        assert!(parse_column_range("0-5").is_err());
        assert!(parse_column_range("9-5").is_err());
    }

    #[test]
    fn test_parse_positive_usize() {
        assert_eq!(parse_positive_usize("32").unwrap(), 32);
        assert!(parse_positive_usize("0").is_err());
        assert!(parse_positive_usize("many").is_err());
    }
}
