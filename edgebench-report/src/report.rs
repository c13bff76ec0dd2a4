//! Report Data Structures

use chrono::{DateTime, Utc};
use edgebench_core::EngineKind;
use edgebench_stats::MetricSummary;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete benchmark report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Run metadata (system, config, git)
    pub meta: ReportMeta,
    /// One record per configured experiment, in execution order
    pub experiments: Vec<ExperimentRecord>,
    /// Batch-level counts
    pub summary: ReportSummary,
}

/// Outcome of one experiment in the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentRecord {
    /// Experiment identifier (`<query_group>/<engine>`)
    pub id: String,
    /// Query group component
    pub query_group: String,
    /// Engine component
    pub engine: EngineKind,
    /// Whether measurement completed
    pub status: ExperimentStatus,
    /// Per-metric summaries; empty for failed experiments
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metrics: BTreeMap<String, MetricSummary>,
    /// Result rows per run - a constant across correct runs, not a
    /// distribution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_rows: Option<u64>,
    /// Derived throughput: output rows over mean execution time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub throughput_rows_per_sec: Option<f64>,
    /// Failure details when status is Failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureInfo>,
}

/// Experiment execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperimentStatus {
    /// All runs succeeded and summaries were produced
    Passed,
    /// A run failed; the experiment carries a reason instead of summaries
    Failed,
}

/// Why and where an experiment failed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureInfo {
    /// Error class: "invocation", "parse" or "timeout"
    pub kind: String,
    /// Which stage the failing run belonged to
    pub stage: String,
    /// Zero-based index of the failing run within its stage
    pub run: usize,
    /// Captured error text
    pub message: String,
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    /// Report schema version
    pub schema_version: u32,
    /// Tool version
    pub version: String,
    /// UTC time the report was generated
    pub timestamp: DateTime<Utc>,
    /// Git commit of the working tree, if available
    pub git_commit: Option<String>,
    /// Git branch of the working tree, if available
    pub git_branch: Option<String>,
    /// Host details
    pub system: SystemInfo,
    /// Measurement protocol settings in effect
    pub config: ReportConfig,
}

/// Measurement protocol settings captured in report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Calibration runs per experiment
    pub repeat_pilot: usize,
    /// Measured runs per experiment
    pub std_repeat: usize,
    /// Target snapshots per measured run
    pub sample_count: u32,
    /// Coarse monitoring interval used during calibration, in seconds
    pub pilot_interval_s: f64,
    /// Floor under the derived monitoring interval, in seconds
    pub min_interval_s: f64,
    /// Per-run timeout in seconds
    pub timeout_s: f64,
}

/// System information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Operating system name
    pub os: String,
    /// Architecture
    pub arch: String,
    /// CPU model
    pub cpu: String,
    /// Available CPU cores
    pub cpu_cores: u32,
    /// Total memory in GB
    pub memory_gb: f64,
}

/// Report summary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Experiments configured for this run
    pub total_experiments: usize,
    /// Experiments that produced summaries
    pub passed: usize,
    /// Experiments that failed
    pub failed: usize,
    /// Wall-clock duration of the whole batch in milliseconds
    pub total_duration_ms: f64,
}
