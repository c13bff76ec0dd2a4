//! Report Building
//!
//! Folds per-experiment outcomes and their statistics into the final
//! [`Report`]. Every configured experiment lands in the report - with metric
//! summaries when it passed, with its failure reason when it did not.

use super::execution::{ExecutionConfig, ExperimentOutcome};
use super::metadata::build_report_meta;
use super::statistics::ExperimentStats;
use edgebench_report::{
    ExperimentRecord, ExperimentStatus, FailureInfo, Report, ReportSummary,
};
use std::collections::BTreeMap;
use std::collections::HashMap;

/// Build a complete Report from outcomes and pre-computed statistics
pub fn build_report(
    outcomes: &[ExperimentOutcome],
    stats: &[(String, Option<ExperimentStats>)],
    config: &ExecutionConfig,
    total_duration_ms: f64,
) -> Report {
    let stats_map: HashMap<&str, &ExperimentStats> = stats
        .iter()
        .filter_map(|(id, stats)| stats.as_ref().map(|s| (id.as_str(), s)))
        .collect();

    let mut experiments = Vec::with_capacity(outcomes.len());
    let mut summary = ReportSummary {
        total_experiments: outcomes.len(),
        total_duration_ms,
        ..Default::default()
    };

    for outcome in outcomes {
        let record = match &outcome.result {
            Ok(_) => {
                summary.passed += 1;
                let stats = stats_map.get(outcome.experiment.id.as_str());
                ExperimentRecord {
                    id: outcome.experiment.id.clone(),
                    query_group: outcome.experiment.query_group.clone(),
                    engine: outcome.experiment.engine,
                    status: ExperimentStatus::Passed,
                    metrics: stats.map(|s| s.metrics.clone()).unwrap_or_default(),
                    output_rows: stats.map(|s| s.output_rows),
                    throughput_rows_per_sec: stats.and_then(|s| s.throughput_rows_per_sec),
                    failure: None,
                }
            }
            Err(failure) => {
                summary.failed += 1;
                ExperimentRecord {
                    id: outcome.experiment.id.clone(),
                    query_group: outcome.experiment.query_group.clone(),
                    engine: outcome.experiment.engine,
                    status: ExperimentStatus::Failed,
                    metrics: BTreeMap::new(),
                    output_rows: None,
                    throughput_rows_per_sec: None,
                    failure: Some(FailureInfo {
                        kind: failure.kind.as_str().to_string(),
                        stage: failure.stage.to_string(),
                        run: failure.run,
                        message: failure.message.clone(),
                    }),
                }
            }
        };
        experiments.push(record);
    }

    Report {
        meta: build_report_meta(config),
        experiments,
        summary,
    }
}
