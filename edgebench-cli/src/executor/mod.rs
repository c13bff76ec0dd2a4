//! Task Executor
//!
//! Drives experiments through the two-stage measurement protocol and turns
//! the outcomes into the final report.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Experiment (from configuration)
//!       │
//!       ▼
//! ┌─────────────┐
//! │  execution  │  Pilot runs → derived interval → measured runs
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │ statistics  │  Per-metric summaries (parallel)
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │   report    │  Report with per-experiment outcomes
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │ formatting  │  Human-readable output
//! └─────────────┘
//! ```
//!
//! Validation is a separate path ([`validation`]) that reuses the engine
//! runner but compares full result sets instead of timing them.

mod execution;
mod formatting;
mod metadata;
mod report;
mod statistics;
mod validation;

pub use execution::{
    derive_interval, ExecutionConfig, Executor, ExperimentOutcome, FailureKind, MeasuredExperiment,
    RunFailure, RunResult, Stage,
};
pub use formatting::{format_human_output, format_validation_output};
pub use report::build_report;
pub use statistics::{compute_statistics, ExperimentStats};
pub use validation::execute_validation;
