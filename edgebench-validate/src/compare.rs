//! Cell and Result-Set Comparison
//!
//! Row-and-column-aligned comparison of two already-ordered result sets.
//! Per cell, the first matching interpretation wins:
//! 1. Both parse as numbers: equal when `|a-b| <= atol + rtol*|b|`
//! 2. Both parse as timestamps (epoch seconds, epoch milliseconds, ISO-8601
//!    or `YYYY-MM-DD HH:MM:SS`): normalized to epoch seconds, compared
//!    exactly
//! 3. Otherwise: exact string equality
//!
//! The relation is symmetric in practice: the tolerance formula references
//! `|b|`, but at the magnitudes and tolerances involved the asymmetry is far
//! below the relative tolerance itself.

use crate::pair::ValidationPair;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Integer timestamps at or above this magnitude are read as epoch
/// milliseconds; below it, as epoch seconds. The boundary (~5138 CE in
/// seconds, ~1973 in milliseconds) keeps both encodings unambiguous for any
/// plausible sensor data.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Numeric comparison tolerances
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Relative tolerance
    pub rtol: f64,
    /// Absolute tolerance
    pub atol: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            rtol: 1e-5,
            atol: 1e-8,
        }
    }
}

/// One differing cell between two result sets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellDiff {
    /// Zero-based row index
    pub row: usize,
    /// Zero-based column index
    pub col: usize,
    /// Value on the left side
    pub left: String,
    /// Value on the right side
    pub right: String,
}

/// Outcome of comparing two ValidationPairs' result sets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairComparison {
    /// Left side of the comparison
    pub left: ValidationPair,
    /// Right side of the comparison
    pub right: ValidationPair,
    /// True when no structural or cell difference was found
    pub identical: bool,
    /// Row counts when they disagree (reported before any cell comparison)
    pub row_count_mismatch: Option<(usize, usize)>,
    /// First differing cells, up to the configured cap
    pub diffs: Vec<CellDiff>,
    /// Total number of differing cells, which may exceed `diffs.len()`
    pub total_diffs: usize,
    /// Tolerances the comparison used
    pub tolerance: Tolerance,
}

/// Normalize a cell that encodes a point in time to epoch seconds.
///
/// Recognized encodings: integer epoch seconds, integer epoch milliseconds,
/// RFC 3339 / ISO-8601 text, and `YYYY-MM-DD HH:MM:SS[.fff]` text (read as
/// UTC). Returns `None` for anything else.
pub fn normalize_timestamp(value: &str) -> Option<i64> {
    let value = value.trim();

    if let Ok(n) = value.parse::<i64>() {
        // Small integers are ordinary numbers, not timestamps; the numeric
        // comparison path handles them first, so any integer reaching here
        // is interpreted by magnitude.
        return Some(if n.abs() >= MILLIS_THRESHOLD {
            n / 1000
        } else {
            n
        });
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp());
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.and_utc().timestamp());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0)?;
        return Some(midnight.and_utc().timestamp());
    }

    None
}

/// Compare two cells under the given tolerance
pub fn cells_equal(a: &str, b: &str, tolerance: Tolerance) -> bool {
    let (a, b) = (a.trim(), b.trim());

    if let (Ok(x), Ok(y)) = (a.parse::<f64>(), b.parse::<f64>()) {
        return (x - y).abs() <= tolerance.atol + tolerance.rtol * y.abs();
    }

    // Numeric parse failed for at least one side; a mixed encoding like
    // "2021-03-04 07:42:00" vs 1614843720000 lands here
    if let (Some(x), Some(y)) = (normalize_timestamp(a), normalize_timestamp(b)) {
        return x == y;
    }

    a == b
}

/// Compare two ordered result sets cell by cell.
///
/// A row-count mismatch is a structural difference and short-circuits the
/// cell walk. Differences beyond `max_diffs` are counted but not retained.
pub fn compare_result_sets(
    left: (&ValidationPair, &[Vec<String>]),
    right: (&ValidationPair, &[Vec<String>]),
    tolerance: Tolerance,
    max_diffs: usize,
) -> PairComparison {
    let (left_pair, left_rows) = left;
    let (right_pair, right_rows) = right;

    if left_rows.len() != right_rows.len() {
        return PairComparison {
            left: left_pair.clone(),
            right: right_pair.clone(),
            identical: false,
            row_count_mismatch: Some((left_rows.len(), right_rows.len())),
            diffs: Vec::new(),
            total_diffs: 0,
            tolerance,
        };
    }

    let mut diffs = Vec::new();
    let mut total_diffs = 0;

    for (row_idx, (lrow, rrow)) in left_rows.iter().zip(right_rows.iter()).enumerate() {
        let width = lrow.len().max(rrow.len());
        for col_idx in 0..width {
            let lcell = lrow.get(col_idx).map(String::as_str).unwrap_or("");
            let rcell = rrow.get(col_idx).map(String::as_str).unwrap_or("");

            if !cells_equal(lcell, rcell, tolerance) {
                total_diffs += 1;
                if diffs.len() < max_diffs {
                    diffs.push(CellDiff {
                        row: row_idx,
                        col: col_idx,
                        left: lcell.to_string(),
                        right: rcell.to_string(),
                    });
                }
            }
        }
    }

    PairComparison {
        left: left_pair.clone(),
        right: right_pair.clone(),
        identical: total_diffs == 0,
        row_count_mismatch: None,
        diffs,
        total_diffs,
        tolerance,
    }
}
