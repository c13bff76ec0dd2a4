//! Resource Sampler
//!
//! One sampling thread per monitored run. Each tick refreshes exactly the
//! target process (not the whole system) and records a snapshot; the loop
//! ends when the process disappears or the stop flag is raised, taking one
//! final sample first so the series covers the moment of exit.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// One point-in-time observation of the monitored process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Offset from monitoring start
    pub offset: Duration,
    /// CPU usage percent (may exceed 100 on multi-core)
    pub cpu_percent: f32,
    /// Resident set size in bytes
    pub rss_bytes: u64,
}

/// Complete sample series for one run, with its reductions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorReport {
    /// Ordered snapshot series; a single-sample series is valid for a very
    /// fast process, and empty means the process exited before the first tick
    pub snapshots: Vec<Snapshot>,
    /// Peak CPU percent
    pub cpu_peak: f32,
    /// Mean CPU percent
    pub cpu_mean: f32,
    /// Peak resident memory in bytes
    pub rss_peak: u64,
    /// Mean resident memory in bytes
    pub rss_mean: u64,
}

impl MonitorReport {
    fn from_snapshots(snapshots: Vec<Snapshot>) -> Self {
        if snapshots.is_empty() {
            return Self::default();
        }

        let n = snapshots.len() as f64;
        let cpu_peak = snapshots.iter().map(|s| s.cpu_percent).fold(0.0, f32::max);
        let cpu_mean =
            (snapshots.iter().map(|s| s.cpu_percent as f64).sum::<f64>() / n) as f32;
        let rss_peak = snapshots.iter().map(|s| s.rss_bytes).max().unwrap_or(0);
        let rss_mean = (snapshots.iter().map(|s| s.rss_bytes as f64).sum::<f64>() / n) as u64;

        Self {
            snapshots,
            cpu_peak,
            cpu_mean,
            rss_peak,
            rss_mean,
        }
    }
}

/// Handle to the sampling thread for one monitored process
pub struct ResourceMonitor {
    handle: JoinHandle<MonitorReport>,
    stop: Arc<AtomicBool>,
}

impl ResourceMonitor {
    /// Start sampling `pid` every `interval`. Call immediately after the
    /// target is spawned; the startup race is accepted as sampling noise.
    ///
    /// If a tick costs more than `interval`, sampling degrades to
    /// as-fast-as-possible instead of erroring.
    pub fn spawn(pid: u32, interval: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = std::thread::spawn(move || sample_loop(pid, interval, &stop_flag));

        Self { handle, stop }
    }

    /// Signal the sampler to take one last sample and finish, then collect
    /// the report. Call after the process has been observed to exit so the
    /// final sample lands at or immediately after exit.
    pub fn stop(self) -> MonitorReport {
        self.stop.store(true, Ordering::Relaxed);
        self.handle.join().unwrap_or_else(|_| {
            tracing::warn!("resource sampler thread panicked; reporting empty series");
            MonitorReport::default()
        })
    }
}

fn sample_loop(pid: u32, interval: Duration, stop: &AtomicBool) -> MonitorReport {
    let pid = Pid::from_u32(pid);
    let refresh = ProcessRefreshKind::nothing().with_cpu().with_memory();
    let mut sys = System::new();
    let started = Instant::now();
    let mut snapshots = Vec::new();

    loop {
        let tick_started = Instant::now();

        // Refresh only the target process, not the whole system
        sys.refresh_processes_specifics(ProcessesToUpdate::Some(&[pid]), true, refresh);

        match sys.process(pid) {
            Some(process) => {
                snapshots.push(Snapshot {
                    offset: started.elapsed(),
                    cpu_percent: process.cpu_usage(),
                    rss_bytes: process.memory(),
                });
            }
            // Process gone: the previous snapshot is the exit-adjacent one
            None => break,
        }

        // Stop is checked after sampling so the raised flag still yields one
        // final observation
        if stop.load(Ordering::Relaxed) {
            break;
        }

        let tick_cost = tick_started.elapsed();
        if tick_cost < interval {
            std::thread::sleep(interval - tick_cost);
        }
    }

    MonitorReport::from_snapshots(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_series_reduces_to_zeroes() {
        let report = MonitorReport::from_snapshots(vec![]);
        assert!(report.snapshots.is_empty());
        assert_eq!(report.rss_peak, 0);
        assert_eq!(report.cpu_peak, 0.0);
    }

    #[test]
    fn single_sample_peak_equals_observation() {
        let report = MonitorReport::from_snapshots(vec![Snapshot {
            offset: Duration::from_millis(5),
            cpu_percent: 37.5,
            rss_bytes: 4096,
        }]);

        assert_eq!(report.cpu_peak, 37.5);
        assert_eq!(report.cpu_mean, 37.5);
        assert_eq!(report.rss_peak, 4096);
        assert_eq!(report.rss_mean, 4096);
    }

    #[test]
    fn reductions_over_series() {
        let snapshots = vec![
            Snapshot {
                offset: Duration::from_millis(0),
                cpu_percent: 10.0,
                rss_bytes: 1000,
            },
            Snapshot {
                offset: Duration::from_millis(10),
                cpu_percent: 30.0,
                rss_bytes: 3000,
            },
            Snapshot {
                offset: Duration::from_millis(20),
                cpu_percent: 20.0,
                rss_bytes: 2000,
            },
        ];
        let report = MonitorReport::from_snapshots(snapshots);

        assert_eq!(report.cpu_peak, 30.0);
        assert_eq!(report.rss_peak, 3000);
        assert_eq!(report.rss_mean, 2000);
        assert!((report.cpu_mean - 20.0).abs() < 0.01);
    }

    #[cfg(unix)]
    #[test]
    fn monitors_a_live_process_until_exit() {
        let mut child = std::process::Command::new("/bin/sleep")
            .arg("0.4")
            .spawn()
            .unwrap();

        let monitor = ResourceMonitor::spawn(child.id(), Duration::from_millis(50));
        child.wait().unwrap();
        let report = monitor.stop();

        assert!(!report.snapshots.is_empty());
        // Offsets are ordered
        for pair in report.snapshots.windows(2) {
            assert!(pair[0].offset <= pair[1].offset);
        }
        assert!(report.rss_peak >= report.rss_mean);
    }

    #[cfg(unix)]
    #[test]
    fn stop_before_exit_still_reports() {
        let mut child = std::process::Command::new("/bin/sleep")
            .arg("5")
            .spawn()
            .unwrap();

        let monitor = ResourceMonitor::spawn(child.id(), Duration::from_millis(20));
        std::thread::sleep(Duration::from_millis(100));
        let report = monitor.stop();

        child.kill().ok();
        child.wait().ok();

        assert!(!report.snapshots.is_empty());
    }
}
