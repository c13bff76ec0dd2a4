//! Output Formatting
//!
//! Human-readable terminal output for benchmark reports and validation
//! results. Machine consumers use the JSON paths in `edgebench-report`.

use super::statistics::{
    METRIC_CPU_PEAK, METRIC_ENGINE_TIME, METRIC_EXECUTION_TIME, METRIC_RSS_PEAK,
};
use edgebench_report::{ExperimentRecord, ExperimentStatus, Report};
use edgebench_validate::PairComparison;

/// Format a report for human-readable terminal display
pub fn format_human_output(report: &Report) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str("Edgebench Results\n");
    output.push_str(&"=".repeat(60));
    output.push_str("\n\n");

    // Group experiments by query group
    let mut groups: std::collections::BTreeMap<&str, Vec<&ExperimentRecord>> =
        std::collections::BTreeMap::new();
    for record in &report.experiments {
        groups.entry(&record.query_group).or_default().push(record);
    }

    for (group, records) in groups {
        output.push_str(&format!("Query group: {}\n", group));
        output.push_str(&"-".repeat(60));
        output.push('\n');

        for record in records {
            let status_icon = match record.status {
                ExperimentStatus::Passed => "✓",
                ExperimentStatus::Failed => "✗",
            };
            output.push_str(&format!("  {} {}\n", status_icon, record.engine));

            if let Some(exec) = record.metrics.get(METRIC_EXECUTION_TIME) {
                output.push_str(&format!(
                    "      time: avg {:.3}s  p50 {:.3}s  p95 {:.3}s  p99 {:.3}s  [{:.3}s .. {:.3}s]\n",
                    exec.avg, exec.p50, exec.p95, exec.p99, exec.min, exec.max
                ));
            }
            if let Some(engine_time) = record.metrics.get(METRIC_ENGINE_TIME) {
                output.push_str(&format!(
                    "      engine time: avg {:.3}s  p95 {:.3}s\n",
                    engine_time.avg, engine_time.p95
                ));
            }
            if let Some(cpu) = record.metrics.get(METRIC_CPU_PEAK) {
                output.push_str(&format!(
                    "      cpu peak: avg {:.1}%  max {:.1}%\n",
                    cpu.avg, cpu.max
                ));
            }
            if let Some(rss) = record.metrics.get(METRIC_RSS_PEAK) {
                output.push_str(&format!(
                    "      rss peak: avg {}  max {}\n",
                    format_bytes(rss.avg),
                    format_bytes(rss.max)
                ));
            }
            if let Some(rows) = record.output_rows {
                match record.throughput_rows_per_sec {
                    Some(throughput) => output.push_str(&format!(
                        "      rows: {}  throughput: {:.1} rows/s\n",
                        rows, throughput
                    )),
                    None => output.push_str(&format!("      rows: {}\n", rows)),
                }
            }
            if let Some(failure) = &record.failure {
                output.push_str(&format!(
                    "      error: {} in {} run {}: {}\n",
                    failure.kind, failure.stage, failure.run, failure.message
                ));
            }

            output.push('\n');
        }
    }

    output.push_str("Summary\n");
    output.push_str(&"-".repeat(60));
    output.push('\n');
    output.push_str(&format!(
        "  {} experiments: {} passed, {} failed  ({:.1}s total)\n",
        report.summary.total_experiments,
        report.summary.passed,
        report.summary.failed,
        report.summary.total_duration_ms / 1000.0
    ));

    output
}

/// Format pairwise validation results for a human operator
pub fn format_validation_output(comparisons: &[PairComparison]) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str("Edgebench Validation\n");
    output.push_str(&"=".repeat(60));
    output.push_str("\n\n");

    let mut mismatches = 0;
    for cmp in comparisons {
        let icon = if cmp.identical { "✓" } else { "✗" };
        output.push_str(&format!("{} {} vs {}\n", icon, cmp.left, cmp.right));

        if let Some((left_rows, right_rows)) = cmp.row_count_mismatch {
            output.push_str(&format!(
                "    row count mismatch: {} vs {}\n",
                left_rows, right_rows
            ));
        }
        for diff in &cmp.diffs {
            output.push_str(&format!(
                "    row {} col {}: {:?} vs {:?}\n",
                diff.row, diff.col, diff.left, diff.right
            ));
        }
        if cmp.total_diffs > cmp.diffs.len() {
            output.push_str(&format!(
                "    ... and {} more differing cells\n",
                cmp.total_diffs - cmp.diffs.len()
            ));
        }
        if !cmp.identical {
            mismatches += 1;
            output.push_str(&format!(
                "    tolerance: rtol {:e}, atol {:e}\n",
                cmp.tolerance.rtol, cmp.tolerance.atol
            ));
        }
        output.push('\n');
    }

    output.push_str(&format!(
        "{} pairwise comparisons, {} identical, {} differing\n",
        comparisons.len(),
        comparisons.len() - mismatches,
        mismatches
    ));

    output
}

fn format_bytes(bytes: f64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = 1024.0 * 1024.0;
    const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

    if bytes >= GIB {
        format!("{:.2} GiB", bytes / GIB)
    } else if bytes >= MIB {
        format!("{:.1} MiB", bytes / MIB)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes / KIB)
    } else {
        format!("{:.0} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgebench_core::EngineKind;
    use edgebench_validate::{CellDiff, Tolerance, ValidationPair};

    #[test]
    fn bytes_formatting() {
        assert_eq!(format_bytes(512.0), "512 B");
        assert_eq!(format_bytes(2048.0), "2.0 KiB");
        assert_eq!(format_bytes(3.5 * 1024.0 * 1024.0), "3.5 MiB");
    }

    #[test]
    fn validation_output_reports_diffs_and_tolerance() {
        let cmp = PairComparison {
            left: ValidationPair {
                query_group: "q1".to_string(),
                engine: EngineKind::Sqlite,
            },
            right: ValidationPair {
                query_group: "q1".to_string(),
                engine: EngineKind::DuckDb,
            },
            identical: false,
            row_count_mismatch: None,
            diffs: vec![CellDiff {
                row: 4,
                col: 1,
                left: "51.3".to_string(),
                right: "52.1".to_string(),
            }],
            total_diffs: 3,
            tolerance: Tolerance::default(),
        };

        let text = format_validation_output(&[cmp]);
        assert!(text.contains("✗ q1/sqlite vs q1/duckdb"));
        assert!(text.contains("row 4 col 1"));
        assert!(text.contains("and 2 more differing cells"));
        assert!(text.contains("rtol 1e-5"));
        assert!(text.contains("1 differing"));
    }
}
