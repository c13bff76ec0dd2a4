//! Canonical Metric Record
//!
//! Every engine reports profiling data in its own shape; the profile
//! adapters normalize them all into `QueryMetric`. Fields an engine does not
//! report stay `None` rather than being zero-filled, so absence and an
//! actual zero remain distinguishable downstream.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Canonical per-run metric record produced by the profile adapters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMetric {
    /// Engine-reported elapsed time in seconds
    pub elapsed_s: f64,
    /// Rows scanned/read by the engine, where reported
    pub rows_read: Option<u64>,
    /// Bytes read by the engine, where reported
    pub bytes_read: Option<u64>,
    /// Engine-reported peak memory in bytes, where reported
    pub peak_memory_bytes: Option<u64>,
    /// Result rows produced by the query
    pub output_rows: u64,
}

/// Raw profiling artifact captured from one engine run, before normalization
#[derive(Debug, Clone)]
pub enum RawArtifact {
    /// Profiling data interleaved with the captured output streams
    /// (SQLite timer lines, chDB shim statistics block)
    Text {
        /// Captured standard output
        stdout: String,
        /// Captured standard error
        stderr: String,
    },
    /// Profiling data written to disk, one JSON document per statement
    /// (DuckDB)
    ProfileDir {
        /// Directory holding the per-statement documents
        dir: PathBuf,
        /// Which statement of the script was the measured query
        statement_index: usize,
        /// Captured standard output, for result-row counting
        stdout: String,
    },
}
