//! System Metadata Collection
//!
//! Captures the context a report was produced in: git commit/branch, OS and
//! architecture, CPU model, core count and total memory. Resource numbers
//! from different hosts are not comparable, so the report must say which
//! host produced them. Linux-specific probes degrade to "Unknown"/0
//! elsewhere.

use super::execution::ExecutionConfig;
use chrono::Utc;
use edgebench_report::{ReportConfig, ReportMeta, SystemInfo};

/// Current report schema version
const SCHEMA_VERSION: u32 = 1;

/// Build report metadata including system info and git details
pub fn build_report_meta(config: &ExecutionConfig) -> ReportMeta {
    let git_commit = std::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string());

    let git_branch = std::process::Command::new("git")
        .args(["rev-parse", "--abbrev-ref", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string());

    let system = SystemInfo {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        cpu: get_cpu_model().unwrap_or_else(|| "Unknown".to_string()),
        cpu_cores: num_cpus(),
        memory_gb: get_memory_gb().unwrap_or(0.0),
    };

    ReportMeta {
        schema_version: SCHEMA_VERSION,
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        git_commit,
        git_branch,
        system,
        config: ReportConfig {
            repeat_pilot: config.repeat_pilot,
            std_repeat: config.std_repeat,
            sample_count: config.sample_count,
            pilot_interval_s: config.pilot_interval.as_secs_f64(),
            min_interval_s: config.min_interval.as_secs_f64(),
            timeout_s: config.timeout.as_secs_f64(),
        },
    }
}

/// Get CPU model name from /proc/cpuinfo (Linux only)
fn get_cpu_model() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/cpuinfo")
            .ok()
            .and_then(|content| {
                content
                    .lines()
                    .find(|l| l.starts_with("model name"))
                    .and_then(|l| l.split(':').nth(1))
                    .map(|s| s.trim().to_string())
            })
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

/// Get number of available CPU cores
fn num_cpus() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1)
}

/// Get total system memory in GB (Linux only)
fn get_memory_gb() -> Option<f64> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/meminfo")
            .ok()
            .and_then(|content| {
                content
                    .lines()
                    .find(|l| l.starts_with("MemTotal"))
                    .and_then(|l| {
                        l.split_whitespace()
                            .nth(1)
                            .and_then(|s| s.parse::<u64>().ok())
                    })
                    .map(|kb| kb as f64 / 1024.0 / 1024.0)
            })
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_captures_protocol_settings() {
        let meta = build_report_meta(&ExecutionConfig::default());

        assert_eq!(meta.schema_version, 1);
        assert_eq!(meta.config.repeat_pilot, 3);
        assert_eq!(meta.config.std_repeat, 5);
        assert!((meta.config.pilot_interval_s - 10.0).abs() < f64::EPSILON);
        assert!(meta.system.cpu_cores >= 1);
    }
}
