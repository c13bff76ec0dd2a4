//! DuckDB Adapter
//!
//! DuckDB's JSON profiling writes one document per statement. The documents
//! are correlated to statement order by sorted filename; the measured query
//! is addressed by its statement index (clamped to the last document, since
//! setup pragmas may or may not emit their own files depending on engine
//! version).
//!
//! Elapsed time comes from the document's timing field. Rows processed is
//! the recursive sum of operator cardinalities over the operator tree, which
//! collapses the per-operator breakdown into the single rows-read figure the
//! canonical record carries.

use crate::ProfileError;
use edgebench_core::{EngineKind, QueryMetric};
use serde_json::Value;
use std::path::Path;

pub(crate) fn parse(
    dir: &Path,
    statement_index: usize,
    stdout: &str,
) -> Result<QueryMetric, ProfileError> {
    let mut documents: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    documents.sort();

    if documents.is_empty() {
        return Err(ProfileError::MissingProfile {
            dir: dir.display().to_string(),
        });
    }

    let path = &documents[statement_index.min(documents.len() - 1)];
    let text = std::fs::read_to_string(path)?;
    let doc: Value = serde_json::from_str(&text).map_err(|source| ProfileError::InvalidJson {
        path: path.display().to_string(),
        source,
    })?;

    let elapsed_s = timing_seconds(&doc).ok_or(ProfileError::MissingField {
        engine: EngineKind::DuckDb,
        field: "timing",
    })?;

    let rows_read = {
        let scanned = doc.get("rows_scanned").and_then(Value::as_u64);
        let cardinality_sum = sum_operator_cardinality(&doc);
        scanned.or(if cardinality_sum > 0 {
            Some(cardinality_sum)
        } else {
            None
        })
    };

    let bytes_read = doc.get("bytes_read").and_then(Value::as_u64);

    // Prefer the engine's own count; fall back to payload lines
    let output_rows = doc
        .get("rows_returned")
        .and_then(Value::as_u64)
        .unwrap_or_else(|| count_payload_rows(stdout));

    Ok(QueryMetric {
        elapsed_s,
        rows_read,
        bytes_read,
        peak_memory_bytes: None,
        output_rows,
    })
}

/// The timing field has moved between engine versions; accept both spellings.
fn timing_seconds(doc: &Value) -> Option<f64> {
    doc.get("timing")
        .or_else(|| doc.get("latency"))
        .and_then(Value::as_f64)
}

/// Recursive sum of `operator_cardinality` over the operator tree
fn sum_operator_cardinality(node: &Value) -> u64 {
    let own = node
        .get("operator_cardinality")
        .and_then(Value::as_u64)
        .unwrap_or(0);

    let children = node
        .get("children")
        .and_then(Value::as_array)
        .map(|children| children.iter().map(sum_operator_cardinality).sum())
        .unwrap_or(0);

    own + children
}

pub(crate) fn payload(stdout: &str) -> String {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn count_payload_rows(stdout: &str) -> u64 {
    let payload = payload(stdout);
    if payload.is_empty() {
        0
    } else {
        payload.lines().count() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str = r#"{
        "query": "SELECT device, avg(hr) FROM readings GROUP BY device",
        "timing": 0.0417,
        "rows_returned": 14,
        "bytes_read": 1048576,
        "children": [
            {
                "operator_name": "HASH_GROUP_BY",
                "operator_cardinality": 14,
                "children": [
                    {
                        "operator_name": "SEQ_SCAN",
                        "operator_cardinality": 86400,
                        "children": []
                    }
                ]
            }
        ]
    }"#;

    fn write_profiles(docs: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (i, doc) in docs.iter().enumerate() {
            std::fs::write(dir.path().join(format!("profile_{}.json", i)), doc).unwrap();
        }
        dir
    }

    #[test]
    fn parses_timing_and_sums_cardinalities() {
        let dir = write_profiles(&[PROFILE]);
        let metric = parse(dir.path(), 0, "").unwrap();

        assert_eq!(metric.elapsed_s, 0.0417);
        assert_eq!(metric.rows_read, Some(86414));
        assert_eq!(metric.bytes_read, Some(1048576));
        assert_eq!(metric.output_rows, 14);
    }

    #[test]
    fn explicit_rows_scanned_wins_over_cardinality_sum() {
        let doc = r#"{"timing": 0.5, "rows_scanned": 1000, "rows_returned": 1}"#;
        let dir = write_profiles(&[doc]);
        let metric = parse(dir.path(), 0, "").unwrap();

        assert_eq!(metric.rows_read, Some(1000));
    }

    #[test]
    fn statement_index_selects_sorted_document() {
        let setup = r#"{"timing": 0.001, "rows_returned": 0}"#;
        let query = r#"{"timing": 2.5, "rows_returned": 3}"#;
        let dir = write_profiles(&[setup, query]);

        let metric = parse(dir.path(), 1, "").unwrap();
        assert_eq!(metric.elapsed_s, 2.5);
    }

    #[test]
    fn index_past_end_clamps_to_last_document() {
        let dir = write_profiles(&[PROFILE]);
        let metric = parse(dir.path(), 7, "").unwrap();
        assert_eq!(metric.elapsed_s, 0.0417);
    }

    #[test]
    fn missing_optional_fields_stay_absent() {
        let doc = r#"{"timing": 0.25}"#;
        let dir = write_profiles(&[doc]);
        let metric = parse(dir.path(), 0, "r1\nr2\n").unwrap();

        assert_eq!(metric.rows_read, None);
        assert_eq!(metric.bytes_read, None);
        // Falls back to counting payload lines
        assert_eq!(metric.output_rows, 2);
    }

    #[test]
    fn empty_directory_is_missing_profile() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            parse(dir.path(), 0, ""),
            Err(ProfileError::MissingProfile { .. })
        ));
    }

    #[test]
    fn garbage_document_is_invalid_json() {
        let dir = write_profiles(&["not json at all"]);
        assert!(matches!(
            parse(dir.path(), 0, ""),
            Err(ProfileError::InvalidJson { .. })
        ));
    }

    #[test]
    fn latency_spelling_accepted() {
        let doc = r#"{"latency": 0.75, "rows_returned": 1}"#;
        let dir = write_profiles(&[doc]);
        let metric = parse(dir.path(), 0, "").unwrap();
        assert_eq!(metric.elapsed_s, 0.75);
    }
}
