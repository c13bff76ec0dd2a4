//! SQLite Adapter
//!
//! The SQLite CLI with `.timer on` prints one line per statement:
//!
//! ```text
//! Run Time: real 0.832 user 0.640000 sys 0.180000
//! ```
//!
//! Elapsed time comes from the timer line of the measured statement (the
//! last one in the script). Scan statistics (`nVisit=` counters) only exist
//! when the engine was compiled with statement scan-status support, so their
//! absence is tolerated: rows read stays `None`, and bytes read is never
//! reported by this engine.

use crate::ProfileError;
use edgebench_core::{EngineKind, QueryMetric};
use regex::Regex;
use std::sync::OnceLock;

fn timer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Run Time:\s+real\s+([0-9.]+)\s+user\s+([0-9.]+)\s+sys\s+([0-9.]+)").unwrap()
    })
}

fn scanstat_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"nVisit=(\d+)").unwrap())
}

pub(crate) fn parse(stdout: &str, stderr: &str) -> Result<QueryMetric, ProfileError> {
    // Timer lines can land on either stream depending on CLI build
    let combined = || stdout.lines().chain(stderr.lines());

    let elapsed_s = combined()
        .filter_map(|line| timer_re().captures(line))
        .filter_map(|caps| caps.get(1)?.as_str().parse::<f64>().ok())
        .last()
        .ok_or(ProfileError::MissingField {
            engine: EngineKind::Sqlite,
            field: "Run Time",
        })?;

    // Optional scan-statistics block: sum loop visit counters when present
    let visits: Vec<u64> = combined()
        .flat_map(|line| scanstat_re().captures_iter(line))
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u64>().ok())
        .collect();
    let rows_read = if visits.is_empty() {
        None
    } else {
        Some(visits.iter().sum())
    };

    Ok(QueryMetric {
        elapsed_s,
        rows_read,
        bytes_read: None,
        peak_memory_bytes: None,
        output_rows: count_rows(stdout),
    })
}

/// Result rows: stdout minus timer and scan-statistics lines
pub(crate) fn payload(stdout: &str) -> String {
    stdout
        .lines()
        .filter(|line| !timer_re().is_match(line) && !scanstat_re().is_match(line))
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn count_rows(stdout: &str) -> u64 {
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

    const TYPICAL: &str = "\
vs14|51.34146341463415
vs09|48.2
Run Time: real 0.832 user 0.640000 sys 0.180000
";

    #[test]
    fn parses_timer_line() {
        let metric = parse(TYPICAL, "").unwrap();
        assert_eq!(metric.elapsed_s, 0.832);
        assert_eq!(metric.rows_read, None);
        assert_eq!(metric.bytes_read, None);
        assert_eq!(metric.output_rows, 2);
    }

    #[test]
    fn takes_last_timer_line_for_multi_statement_scripts() {
        let stdout = "\
Run Time: real 0.010 user 0.005000 sys 0.001000
row1
Run Time: real 1.250 user 1.100000 sys 0.100000
";
        let metric = parse(stdout, "").unwrap();
        assert_eq!(metric.elapsed_s, 1.250);
    }

    #[test]
    fn timer_on_stderr_is_found() {
        let metric = parse("row\n", "Run Time: real 0.5 user 0.4 sys 0.1\n").unwrap();
        assert_eq!(metric.elapsed_s, 0.5);
    }

    #[test]
    fn scan_statistics_summed_when_present() {
        let stdout = "\
row
Run Time: real 0.2 user 0.1 sys 0.0
-- loop 0: nVisit=1440 est=1000
-- loop 1: nVisit=60 est=50
";
        let metric = parse(stdout, "").unwrap();
        assert_eq!(metric.rows_read, Some(1500));
    }

    #[test]
    fn missing_timer_is_fatal() {
        assert!(matches!(
            parse("just rows\n", ""),
            Err(ProfileError::MissingField { field: "Run Time", .. })
        ));
    }

    #[test]
    fn payload_strips_profiling_chatter() {
        let stdout = "\
a|1
Run Time: real 0.2 user 0.1 sys 0.0
-- loop 0: nVisit=3
b|2
";
        assert_eq!(payload(stdout), "a|1\nb|2");
    }

    #[test]
    fn empty_result_set_counts_zero_rows() {
        let metric = parse("Run Time: real 0.01 user 0.0 sys 0.0\n", "").unwrap();
        assert_eq!(metric.output_rows, 0);
    }
}
