//! Error types for policy-scan.
//!
//! This crate provides:
//! - [`PsError`] - Top-level error enum for all scan errors
//! - [`RetrievalError`] - Per-object retrieval failures
//! - The [`Result`] alias used throughout the workspace
//!
//! Configuration and listing errors are fatal to a run; retrieval errors
//! belong to a single object and are recovered by the coordinator.

use thiserror::Error;

/// Top-level error type for policy-scan.
#[derive(Error, Debug)]
pub enum PsError {
    /// Configuration errors (rejected before any work is dispatched)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Listing errors (enumeration failed, fatal to the run)
    #[error("Listing error: {0}")]
    List(String),

    /// Retrieval errors (one object's scan failed, run continues)
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    /// Generic errors (wrapped anyhow)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Retrieval-related errors for a single object.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Object not found
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Access denied for this object
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// The GET request itself failed
    #[error("Get request failed: {0}")]
    Request(String),

    /// I/O error while streaming the object body
    #[error("I/O error: {0}")]
    Io(String),
}

impl PsError {
    /// Whether this error is scoped to a single object.
    ///
    /// Per-object errors are counted and logged by the coordinator without
    /// aborting the run; everything else is fatal.
    pub fn is_per_object(&self) -> bool {
        matches!(self, Self::Retrieval(_))
    }
}

/// Result type alias using PsError.
pub type Result<T> = std::result::Result<T, PsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieval_errors_are_per_object() {
        let error = PsError::Retrieval(RetrievalError::NotFound(
            "s3://bucket/file.txt".to_string(),
        ));
        assert!(error.is_per_object());
    }

    #[test]
    fn test_fatal_errors_are_not_per_object() {
        assert!(!PsError::Config("empty policy number".to_string()).is_per_object());
        assert!(!PsError::List("listing failed".to_string()).is_per_object());
    }

    #[test]
    fn test_error_display() {
        let error = PsError::Retrieval(RetrievalError::AccessDenied(
            "s3://bucket/file.txt".to_string(),
        ));
        assert!(error.to_string().contains("Access denied"));

        let error = PsError::Config("column range start must be >= 1".to_string());
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_anyhow_passthrough() {
        let error: PsError = anyhow::anyhow!("something else").into();
        assert_eq!(error.to_string(), "something else");
    }
}
