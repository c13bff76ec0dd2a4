#![warn(missing_docs)]
//! Edgebench Report - Result Structures and Output
//!
//! Generates the two machine artifacts of a benchmark run:
//! - The full JSON report (metadata + every experiment outcome)
//! - The nested summary document (experiment -> engine -> metric -> summary)
//!   consumed by the out-of-tree visualization step
//!
//! Every configured experiment appears in the report, either with metric
//! summaries or with an explicit failure reason - silent omission is treated
//! as a defect.

mod json;
mod report;

pub use json::{generate_json_report, summary_document};
pub use report::{
    ExperimentRecord, ExperimentStatus, FailureInfo, Report, ReportConfig, ReportMeta,
    ReportSummary, SystemInfo,
};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON with full schema
    Json,
    /// Human-readable terminal output
    Human,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" | "text" => Ok(OutputFormat::Human),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}
