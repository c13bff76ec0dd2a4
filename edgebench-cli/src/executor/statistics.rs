//! Statistics Computation
//!
//! Reduces each experiment's measured runs into per-metric summaries.
//! Execution is strictly sequential, but this step runs on already
//! materialized data, so summaries are computed in parallel across
//! experiments with Rayon.

use super::execution::ExperimentOutcome;
use edgebench_stats::{throughput_rows_per_sec, MetricSummary};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Metric name for wall-clock execution time, in seconds
pub const METRIC_EXECUTION_TIME: &str = "execution_time_s";
/// Metric name for engine-reported elapsed time, in seconds
pub const METRIC_ENGINE_TIME: &str = "engine_time_s";
/// Metric name for peak CPU percent per run
pub const METRIC_CPU_PEAK: &str = "cpu_peak_pct";
/// Metric name for peak resident memory per run, in bytes
pub const METRIC_RSS_PEAK: &str = "rss_peak_bytes";

/// Aggregates for one successfully measured experiment
#[derive(Debug, Clone)]
pub struct ExperimentStats {
    /// Per-metric distributional summaries
    pub metrics: BTreeMap<String, MetricSummary>,
    /// Result rows per run; identical across correct runs, so a constant
    pub output_rows: u64,
    /// Derived throughput: output rows over mean execution time
    pub throughput_rows_per_sec: Option<f64>,
}

/// Compute statistics for all outcomes (parallelized with Rayon).
///
/// Returns `(experiment_id, stats)` pairs; failed experiments carry `None`
/// and are reported through their failure reason instead.
pub fn compute_statistics(
    outcomes: &[ExperimentOutcome],
) -> Vec<(String, Option<ExperimentStats>)> {
    outcomes
        .par_iter()
        .map(|outcome| {
            let stats = outcome.result.as_ref().ok().map(|measured| {
                let mut metrics = BTreeMap::new();

                let series: [(&str, Vec<f64>); 4] = [
                    (
                        METRIC_EXECUTION_TIME,
                        measured
                            .runs
                            .iter()
                            .map(|r| r.wall_time.as_secs_f64())
                            .collect(),
                    ),
                    (
                        METRIC_ENGINE_TIME,
                        measured.runs.iter().map(|r| r.metric.elapsed_s).collect(),
                    ),
                    (
                        METRIC_CPU_PEAK,
                        measured
                            .runs
                            .iter()
                            .map(|r| r.resources.cpu_peak as f64)
                            .collect(),
                    ),
                    (
                        METRIC_RSS_PEAK,
                        measured
                            .runs
                            .iter()
                            .map(|r| r.resources.rss_peak as f64)
                            .collect(),
                    ),
                ];

                for (name, values) in series {
                    if let Some(summary) = MetricSummary::from_samples(&values) {
                        metrics.insert(name.to_string(), summary);
                    }
                }

                // Row count is a constant across correct runs, not a
                // distribution; disagreement between runs is worth a warning
                // because it means the engine is not deterministic here
                let output_rows = measured
                    .runs
                    .first()
                    .map(|r| r.metric.output_rows)
                    .unwrap_or(0);
                if measured
                    .runs
                    .iter()
                    .any(|r| r.metric.output_rows != output_rows)
                {
                    tracing::warn!(
                        experiment = %outcome.experiment.id,
                        "output row count varied between runs"
                    );
                }

                let mean_execution = metrics
                    .get(METRIC_EXECUTION_TIME)
                    .map(|s| s.avg)
                    .unwrap_or(0.0);

                ExperimentStats {
                    metrics,
                    output_rows,
                    throughput_rows_per_sec: throughput_rows_per_sec(output_rows, mean_execution),
                }
            });

            (outcome.experiment.id.clone(), stats)
        })
        .collect()
}
