#![warn(missing_docs)]
//! Edgebench Process Monitor
//!
//! Samples CPU and resident memory of one running engine process at a
//! configured interval, from a dedicated thread, until the process exits or
//! the orchestrator signals stop. The sampler never blocks on the process:
//! liveness is poll-based, so the last snapshot reflects state at or near
//! exit.

mod sampler;

pub use sampler::{MonitorReport, ResourceMonitor, Snapshot};
