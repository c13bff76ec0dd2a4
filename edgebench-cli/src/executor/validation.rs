//! Validation Execution
//!
//! Fetches the full result set of every (query group, engine) pair once and
//! performs all pairwise comparisons within each query group. An engine
//! execution failure aborts the whole validation run with the captured error
//! - a query that does not run (syntax error, missing table) renders every
//! comparison meaningless. Engines that ran but disagree are never an error:
//! the mismatch is computed, retained and reported.

use edgebench_core::{CaptureMode, EngineKind, EngineProcess, EngineSpec, Experiment};
use edgebench_profile::result_payload;
use edgebench_validate::{
    compare_result_sets, parse_csv, PairComparison, Tolerance, ValidationPair,
};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Run every pair's query and compare all pairs within each query group.
///
/// Experiments sharing a query group form one validation set; groups with a
/// single engine have nothing to compare and contribute no comparisons.
pub fn execute_validation(
    experiments: &[Experiment],
    engines: &HashMap<EngineKind, EngineSpec>,
    timeout: Duration,
    tolerance: Tolerance,
    max_diffs: usize,
) -> anyhow::Result<Vec<PairComparison>> {
    // Group while preserving engine order within each group
    let mut groups: BTreeMap<&str, Vec<&Experiment>> = BTreeMap::new();
    for experiment in experiments {
        groups
            .entry(experiment.query_group.as_str())
            .or_default()
            .push(experiment);
    }

    let mut comparisons = Vec::new();

    for (group, members) in groups {
        if members.len() < 2 {
            tracing::info!(query_group = group, "single engine, nothing to compare");
            continue;
        }

        // Fetch every result set first; any execution failure aborts the run
        let mut fetched: Vec<(ValidationPair, Vec<Vec<String>>)> =
            Vec::with_capacity(members.len());
        for experiment in members {
            let rows = fetch_result_set(experiment, engines, timeout)?;
            fetched.push((
                ValidationPair {
                    query_group: experiment.query_group.clone(),
                    engine: experiment.engine,
                },
                rows,
            ));
        }

        // All pairwise comparisons; the relation is symmetric, so each
        // unordered pair is compared once
        for i in 0..fetched.len() {
            for j in (i + 1)..fetched.len() {
                let (left_pair, left_rows) = &fetched[i];
                let (right_pair, right_rows) = &fetched[j];
                comparisons.push(compare_result_sets(
                    (left_pair, left_rows),
                    (right_pair, right_rows),
                    tolerance,
                    max_diffs,
                ));
            }
        }
    }

    Ok(comparisons)
}

/// Execute one pair's query in validation capture mode and parse its rows
fn fetch_result_set(
    experiment: &Experiment,
    engines: &HashMap<EngineKind, EngineSpec>,
    timeout: Duration,
) -> anyhow::Result<Vec<Vec<String>>> {
    let spec = engines.get(&experiment.engine).ok_or_else(|| {
        anyhow::anyhow!(
            "validation aborted: engine {} is not configured",
            experiment.engine
        )
    })?;

    // No profiling directory: validation wants rows, not metrics
    let invocation = spec.invocation(&experiment.query_sql, CaptureMode::Validation, None);

    let process = EngineProcess::spawn(&invocation).map_err(|e| {
        anyhow::anyhow!("validation aborted: {} failed to start: {}", experiment.id, e)
    })?;
    let output = process.wait(timeout).map_err(|e| {
        anyhow::anyhow!("validation aborted: {} did not complete: {}", experiment.id, e)
    })?;

    output.check_status().map_err(|e| {
        anyhow::anyhow!("validation aborted: {} failed to execute: {}", experiment.id, e)
    })?;

    Ok(parse_csv(&result_payload(experiment.engine, &output)))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::PathBuf;

    /// Fake engines scripted via /bin/sh in the chDB argv shape
    fn sh_engine() -> HashMap<EngineKind, EngineSpec> {
        let mut engines = HashMap::new();
        engines.insert(
            EngineKind::Chdb,
            EngineSpec {
                kind: EngineKind::Chdb,
                binary: PathBuf::from("/bin/sh"),
                database: PathBuf::from("-c"),
                extra_args: vec![],
            },
        );
        engines
    }

    fn experiment(group: &str, script: &str) -> Experiment {
        Experiment::new(
            group,
            EngineKind::Chdb,
            PathBuf::from("q.sql"),
            script.to_string(),
        )
    }

    #[test]
    fn single_member_groups_produce_no_comparisons() {
        let experiments = vec![experiment("q1", "printf 'h\\n1\\n'")];
        let comparisons = execute_validation(
            &experiments,
            &sh_engine(),
            Duration::from_secs(5),
            Tolerance::default(),
            10,
        )
        .unwrap();

        assert!(comparisons.is_empty());
    }

    #[test]
    fn execution_failure_aborts_the_whole_run() {
        let experiments = vec![
            experiment("q1", "printf 'h\\n1\\n'"),
            experiment("q1", "echo 'Syntax error near SELECT' >&2; exit 1"),
        ];
        let err = execute_validation(
            &experiments,
            &sh_engine(),
            Duration::from_secs(5),
            Tolerance::default(),
            10,
        )
        .unwrap_err();

        assert!(err.to_string().contains("validation aborted"));
        assert!(err.to_string().contains("Syntax error"));
    }

    #[test]
    fn matching_outputs_compare_identical() {
        // Same group twice: both emit the same CSV
        let experiments = vec![
            experiment("q1", "printf 'device,hr\\nvs14,51.34146341463415\\n'"),
            experiment("q1", "printf 'device,hr\\nvs14,51.341463414634152\\n'"),
        ];
        let comparisons = execute_validation(
            &experiments,
            &sh_engine(),
            Duration::from_secs(5),
            Tolerance::default(),
            10,
        )
        .unwrap();

        assert_eq!(comparisons.len(), 1);
        assert!(comparisons[0].identical);
    }

    #[test]
    fn differing_outputs_are_reported_not_fatal() {
        let experiments = vec![
            experiment("q1", "printf 'h\\n1\\n2\\n'"),
            experiment("q1", "printf 'h\\n1\\n'"),
        ];
        let comparisons = execute_validation(
            &experiments,
            &sh_engine(),
            Duration::from_secs(5),
            Tolerance::default(),
            10,
        )
        .unwrap();

        assert_eq!(comparisons.len(), 1);
        assert!(!comparisons[0].identical);
        assert_eq!(comparisons[0].row_count_mismatch, Some((3, 2)));
    }
}
