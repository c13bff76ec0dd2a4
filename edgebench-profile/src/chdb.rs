//! chDB Shim Adapter
//!
//! The command-line shim prints a fixed statistics block, then the CSV
//! result payload (with header):
//!
//! ```text
//! Query statistics:
//!   Elapsed: 0.412 seconds
//!   Rows read: 86400
//!   Bytes read: 2211840 bytes
//! Peak memory: 96.5 MB
//! device,avg_hr
//! vs14,51.34146341463415
//! ```
//!
//! The block can land on stderr or stdout depending on how the shim was
//! built; stderr is checked first. Lines inside the block that don't match a
//! known key are skipped; a missing `Elapsed:` is fatal.

use crate::ProfileError;
use edgebench_core::{EngineKind, QueryMetric};

const PREAMBLE: &str = "Query statistics:";
const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Default)]
struct StatsBlock {
    elapsed_s: Option<f64>,
    rows_read: Option<u64>,
    bytes_read: Option<u64>,
    peak_memory_bytes: Option<u64>,
}

pub(crate) fn parse(stdout: &str, stderr: &str) -> Result<QueryMetric, ProfileError> {
    // Prefer stderr; fall back to stats interleaved on stdout
    let stats = if stderr.contains(PREAMBLE) {
        scan_stats(stderr)
    } else {
        scan_stats(stdout)
    };

    let elapsed_s = stats.elapsed_s.ok_or(ProfileError::MissingField {
        engine: EngineKind::Chdb,
        field: "Elapsed",
    })?;

    Ok(QueryMetric {
        elapsed_s,
        rows_read: stats.rows_read,
        bytes_read: stats.bytes_read,
        peak_memory_bytes: stats.peak_memory_bytes,
        output_rows: count_rows(stdout),
    })
}

fn scan_stats(text: &str) -> StatsBlock {
    let mut stats = StatsBlock::default();
    let mut in_block = false;

    for line in text.lines() {
        if line.trim() == PREAMBLE {
            in_block = true;
            continue;
        }

        if in_block && line.starts_with("  ") {
            let line = line.trim();
            if let Some(rest) = line.strip_prefix("Elapsed:") {
                stats.elapsed_s = rest.trim().strip_suffix("seconds").map(str::trim).and_then(
                    |v| v.parse::<f64>().ok(),
                );
            } else if let Some(rest) = line.strip_prefix("Rows read:") {
                stats.rows_read = rest.trim().parse::<u64>().ok();
            } else if let Some(rest) = line.strip_prefix("Bytes read:") {
                stats.bytes_read = rest
                    .trim()
                    .strip_suffix("bytes")
                    .map(str::trim)
                    .and_then(|v| v.parse::<u64>().ok());
            }
            // Unknown indented lines are skipped, not fatal
            continue;
        }

        in_block = false;
        if let Some(rest) = line.strip_prefix("Peak memory:") {
            stats.peak_memory_bytes = rest
                .trim()
                .strip_suffix("MB")
                .map(str::trim)
                .and_then(|v| v.parse::<f64>().ok())
                .map(|mib| (mib * BYTES_PER_MIB) as u64);
        }
    }

    stats
}

/// The CSV payload is everything outside the statistics block
pub(crate) fn payload(stdout: &str) -> String {
    let mut rows = Vec::new();
    let mut in_block = false;

    for line in stdout.lines() {
        if line.trim() == PREAMBLE {
            in_block = true;
            continue;
        }
        if in_block && line.starts_with("  ") {
            continue;
        }
        in_block = false;
        if line.starts_with("Peak memory:") || line.trim().is_empty() {
            continue;
        }
        rows.push(line);
    }

    rows.join("\n")
}

/// Payload is CSV with a header row; the header is not a result row
fn count_rows(stdout: &str) -> u64 {
    let payload = payload(stdout);
    if payload.is_empty() {
        0
    } else {
        (payload.lines().count() as u64).saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STDERR_STATS: &str = "\
Query statistics:
  Elapsed: 0.412 seconds
  Rows read: 86400
  Bytes read: 2211840 bytes
Peak memory: 96.5 MB
";

    const STDOUT_PAYLOAD: &str = "\
device,avg_hr
vs14,51.34146341463415
vs09,48.2
";

    #[test]
    fn parses_stats_from_stderr() {
        let metric = parse(STDOUT_PAYLOAD, STDERR_STATS).unwrap();

        assert_eq!(metric.elapsed_s, 0.412);
        assert_eq!(metric.rows_read, Some(86400));
        assert_eq!(metric.bytes_read, Some(2211840));
        assert_eq!(metric.peak_memory_bytes, Some((96.5 * 1048576.0) as u64));
        assert_eq!(metric.output_rows, 2);
    }

    #[test]
    fn parses_stats_interleaved_on_stdout() {
        let stdout = format!("{}{}", STDERR_STATS, STDOUT_PAYLOAD);
        let metric = parse(&stdout, "").unwrap();

        assert_eq!(metric.elapsed_s, 0.412);
        assert_eq!(metric.output_rows, 2);
    }

    #[test]
    fn payload_excludes_stats_block() {
        let stdout = format!("{}{}", STDERR_STATS, STDOUT_PAYLOAD);
        assert_eq!(
            payload(&stdout),
            "device,avg_hr\nvs14,51.34146341463415\nvs09,48.2"
        );
    }

    #[test]
    fn optional_fields_absent_without_failing() {
        let stderr = "Query statistics:\n  Elapsed: 1.5 seconds\n";
        let metric = parse("h\nr\n", stderr).unwrap();

        assert_eq!(metric.elapsed_s, 1.5);
        assert_eq!(metric.rows_read, None);
        assert_eq!(metric.bytes_read, None);
        assert_eq!(metric.peak_memory_bytes, None);
    }

    #[test]
    fn unknown_indented_lines_are_skipped() {
        let stderr = "\
Query statistics:
  Elapsed: 2.0 seconds
  Threads used: 4
";
        let metric = parse("h\n", stderr).unwrap();
        assert_eq!(metric.elapsed_s, 2.0);
    }

    #[test]
    fn missing_elapsed_is_fatal() {
        let stderr = "Query statistics:\n  Rows read: 5\n";
        assert!(matches!(
            parse("h\n", stderr),
            Err(ProfileError::MissingField { field: "Elapsed", .. })
        ));
    }

    #[test]
    fn header_only_payload_counts_zero_rows() {
        let stderr = "Query statistics:\n  Elapsed: 0.1 seconds\n";
        let metric = parse("device,avg_hr\n", stderr).unwrap();
        assert_eq!(metric.output_rows, 0);
    }
}
