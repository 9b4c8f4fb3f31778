//! Fixed-column field extraction.
//!
//! Statistical report lines carry the policy number in a fixed character
//! range (columns 6-23 in the documented layout). Extraction and comparison
//! both go through [`normalize_policy`] so padding differences on either
//! side never change a match outcome.

use ps_error::{PsError, Result};
use serde::{Deserialize, Serialize};

/// Default column range for the policy number field (columns 6-23).
pub const DEFAULT_COLUMNS: ColumnRange = ColumnRange { start: 6, end: 23 };

/// A 1-based inclusive character range within a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRange {
    /// First column, 1-based
    pub start: usize,
    /// Last column, 1-based inclusive
    pub end: usize,
}

impl Default for ColumnRange {
    fn default() -> Self {
        DEFAULT_COLUMNS
    }
}

impl ColumnRange {
    /// Create a validated column range.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `start` is zero or `end` precedes
    /// `start`.
    pub fn new(start: usize, end: usize) -> Result<Self> {
        if start < 1 {
            return Err(PsError::Config(
                "column range start must be >= 1".to_string(),
            ));
        }
        if end < start {
            return Err(PsError::Config(format!(
                "column range end {} precedes start {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// Number of characters covered by the range.
    pub fn width(&self) -> usize {
        self.end - self.start + 1
    }
}

impl std::fmt::Display for ColumnRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Remove every whitespace character from a policy identifier.
///
/// Applied once to the target at run start and to every extracted field,
/// so both sides of the comparison are normalized identically.
pub fn normalize_policy(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Extract the normalized field covering `columns` from one line.
///
/// Returns `None` when the line ends before the range starts - a short
/// line can never match and is not an error. A line that reaches `start`
/// but ends before `end` yields the clamped field. Positions are counted
/// in characters, not bytes.
pub fn extract_field(line: &str, columns: &ColumnRange) -> Option<String> {
    let field: String = line
        .chars()
        .skip(columns.start - 1)
        .take(columns.width())
        .collect();

    if field.is_empty() {
        None
    } else {
        Some(normalize_policy(&field))
    }
}
