//! JSON Output

use crate::report::{ExperimentStatus, Report};
use serde_json::{json, Map, Value};

/// Generate the prettified full JSON report.
pub fn generate_json_report(report: &Report) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Build the nested summary document consumed by the visualization step:
/// query group -> engine -> metric name -> {min,max,avg,p50,p95,p99}, plus
/// `output_rows` and derived throughput. Failed experiments appear with
/// their failure reason so the document still accounts for every configured
/// experiment.
pub fn summary_document(report: &Report) -> Value {
    let mut groups: Map<String, Value> = Map::new();

    for record in &report.experiments {
        let engines = groups
            .entry(record.query_group.clone())
            .or_insert_with(|| Value::Object(Map::new()));

        let entry = match record.status {
            ExperimentStatus::Passed => {
                let mut metrics: Map<String, Value> = Map::new();
                for (name, summary) in &record.metrics {
                    metrics.insert(
                        name.clone(),
                        json!({
                            "min": summary.min,
                            "max": summary.max,
                            "avg": summary.avg,
                            "p50": summary.p50,
                            "p95": summary.p95,
                            "p99": summary.p99,
                        }),
                    );
                }
                json!({
                    "metrics": Value::Object(metrics),
                    "output_rows": record.output_rows,
                    "throughput_rows_per_sec": record.throughput_rows_per_sec,
                })
            }
            ExperimentStatus::Failed => json!({
                "failed": record.failure.as_ref().map(|f| {
                    json!({ "kind": f.kind, "stage": f.stage, "run": f.run, "message": f.message })
                }),
            }),
        };

        if let Value::Object(map) = engines {
            map.insert(record.engine.to_string(), entry);
        }
    }

    Value::Object(groups)
}
