//! Metric Summaries
//!
//! One `MetricSummary` describes the distribution of a single metric over all
//! successful runs of one experiment. Min and max are exact; percentiles use
//! linear interpolation, so `min <= p50 <= p95 <= p99 <= max` always holds
//! over the same run set.

use crate::percentiles::compute_percentile;
use serde::{Deserialize, Serialize};

/// Distributional summary of one metric over repeated runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    /// Smallest observed value
    pub min: f64,
    /// Largest observed value
    pub max: f64,
    /// Arithmetic mean
    pub avg: f64,
    /// 50th percentile (median)
    pub p50: f64,
    /// 95th percentile
    pub p95: f64,
    /// 99th percentile
    pub p99: f64,
}

impl MetricSummary {
    /// Summarize a run series. Returns `None` for an empty series: an
    /// experiment with no successful runs must be reported as failed, never
    /// as a summary of zeros.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let min = samples
            .iter()
            .cloned()
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))?;
        let max = samples
            .iter()
            .cloned()
            .max_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))?;
        let avg = samples.iter().sum::<f64>() / samples.len() as f64;

        Some(Self {
            min,
            max,
            avg,
            p50: compute_percentile(samples, 50.0),
            p95: compute_percentile(samples, 95.0),
            p99: compute_percentile(samples, 99.0),
        })
    }
}

/// Derived throughput: output rows over mean execution time.
///
/// Not a sampled metric; recomputed from the summary rather than averaged
/// per run. Returns `None` when the mean is not positive.
pub fn throughput_rows_per_sec(output_rows: u64, mean_execution_s: f64) -> Option<f64> {
    if mean_execution_s > 0.0 {
        Some(output_rows as f64 / mean_execution_s)
    } else {
        None
    }
}
