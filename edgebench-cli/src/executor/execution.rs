//! Experiment Execution
//!
//! The two-stage measurement protocol:
//!
//! **Stage 1 (calibration)** runs the experiment a few times under a coarse
//! monitoring interval and averages the wall-clock times. A fixed interval
//! either over-samples fast queries (sampling overhead distorts the
//! measurement) or under-samples slow ones (too few points for percentiles);
//! deriving the Stage 2 interval as `t_avg / sample_count` keeps the
//! per-run snapshot count roughly constant across wildly different query
//! costs.
//!
//! **Stage 2 (measurement)** runs the experiment at the derived interval and
//! hands every run to the aggregator.
//!
//! Experiments run strictly sequentially, and run k+1 never starts before
//! run k's process has exited and its artifacts are parsed; the only
//! concurrency during a run is the engine process plus its resource sampler.
//! The first failed run halts that experiment's remaining repeats - a
//! summary silently averaged over fewer runs would not be comparable.

use edgebench_core::{
    CaptureMode, EngineKind, EngineProcess, EngineSpec, Experiment, QueryMetric, RawArtifact,
    RunnerError,
};
use edgebench_monitor::{MonitorReport, ResourceMonitor};
use edgebench_profile::parse_artifact;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// In a DuckDB script the profiling pragmas precede the measured query, so
/// its profile document is the last one when sorted by statement order.
const DUCKDB_QUERY_STATEMENT: usize = 2;

/// Resolved measurement protocol settings
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    /// Calibration runs per experiment
    pub repeat_pilot: usize,
    /// Measured runs per experiment
    pub std_repeat: usize,
    /// Target snapshots per measured run
    pub sample_count: u32,
    /// Coarse monitoring interval for calibration runs
    pub pilot_interval: Duration,
    /// Floor under the derived interval, so monitor overhead never dominates
    /// very fast queries
    pub min_interval: Duration,
    /// Mandatory per-run timeout
    pub timeout: Duration,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            repeat_pilot: 3,
            std_repeat: 5,
            sample_count: 10,
            pilot_interval: Duration::from_secs(10),
            min_interval: Duration::from_millis(1),
            timeout: Duration::from_secs(300),
        }
    }
}

/// Derive the Stage 2 monitoring interval from observed pilot times.
///
/// `interval = t_avg / sample_count`, clamped below by `floor`. The result
/// is strictly positive for any non-negative pilot timings.
pub fn derive_interval(pilot_times_s: &[f64], sample_count: u32, floor: Duration) -> Duration {
    if pilot_times_s.is_empty() || sample_count == 0 {
        return floor;
    }

    let t_avg = pilot_times_s.iter().sum::<f64>() / pilot_times_s.len() as f64;
    let interval = Duration::from_secs_f64((t_avg / sample_count as f64).max(0.0));

    interval.max(floor)
}

/// Which protocol stage a run belonged to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Calibration run; its timing only sizes the interval
    Pilot,
    /// Measured run; feeds the final statistics
    Measurement,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Pilot => f.write_str("pilot"),
            Stage::Measurement => f.write_str("measurement"),
        }
    }
}

/// Error class of a failed run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Engine failed to start or exited non-zero
    Invocation,
    /// Engine succeeded but its profiling artifact was unreadable
    Parse,
    /// Engine exceeded the per-run timeout and was killed
    Timeout,
}

impl FailureKind {
    /// Stable lowercase name used in reports
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Invocation => "invocation",
            FailureKind::Parse => "parse",
            FailureKind::Timeout => "timeout",
        }
    }
}

/// Why one experiment stopped
#[derive(Debug, Clone)]
pub struct RunFailure {
    /// Stage of the failing run
    pub stage: Stage,
    /// Zero-based run index within its stage
    pub run: usize,
    /// Error class
    pub kind: FailureKind,
    /// Captured error text
    pub message: String,
}

/// One successful execution of an experiment
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Wall-clock time from spawn to exit
    pub wall_time: Duration,
    /// Normalized engine-reported metrics
    pub metric: QueryMetric,
    /// Resource sample series recorded while the process was alive
    pub resources: MonitorReport,
}

/// All data from one fully measured experiment
#[derive(Debug, Clone)]
pub struct MeasuredExperiment {
    /// Pilot wall-clock times in seconds; never part of final statistics
    pub pilot_times_s: Vec<f64>,
    /// The interval Stage 2 sampled at
    pub interval: Duration,
    /// The measured runs, in order
    pub runs: Vec<RunResult>,
}

/// Per-experiment outcome: measurements or the first failure
pub struct ExperimentOutcome {
    /// The experiment this outcome belongs to
    pub experiment: Experiment,
    /// Measurements, or why the experiment halted
    pub result: Result<MeasuredExperiment, RunFailure>,
}

/// Drives experiments through both stages, strictly sequentially
pub struct Executor {
    config: ExecutionConfig,
    engines: HashMap<EngineKind, EngineSpec>,
    /// Root for transient per-run profiling directories
    profile_root: PathBuf,
    run_counter: u64,
}

impl Executor {
    /// Create an executor over the resolved engine specs
    pub fn new(
        config: ExecutionConfig,
        engines: HashMap<EngineKind, EngineSpec>,
        profile_root: PathBuf,
    ) -> Self {
        Self {
            config,
            engines,
            profile_root,
            run_counter: 0,
        }
    }

    /// Execute all experiments. One experiment's failure never halts the
    /// others; every experiment yields an outcome.
    pub fn execute(&mut self, experiments: &[Experiment]) -> Vec<ExperimentOutcome> {
        let pb = ProgressBar::new(experiments.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        let mut outcomes = Vec::with_capacity(experiments.len());
        for experiment in experiments {
            pb.set_message(experiment.id.clone());
            let result = self.execute_single(experiment);
            if let Err(failure) = &result {
                tracing::warn!(
                    experiment = %experiment.id,
                    stage = %failure.stage,
                    run = failure.run,
                    kind = failure.kind.as_str(),
                    "experiment failed: {}",
                    failure.message
                );
            }
            outcomes.push(ExperimentOutcome {
                experiment: experiment.clone(),
                result,
            });
            pb.inc(1);
        }

        pb.finish_with_message("Complete");
        outcomes
    }

    /// Run both stages for one experiment
    fn execute_single(&mut self, experiment: &Experiment) -> Result<MeasuredExperiment, RunFailure> {
        // Stage 1: calibration under the coarse interval
        let mut pilot_times_s = Vec::with_capacity(self.config.repeat_pilot);
        for run in 0..self.config.repeat_pilot {
            let result = self
                .run_once(experiment, self.config.pilot_interval)
                .map_err(|(kind, message)| RunFailure {
                    stage: Stage::Pilot,
                    run,
                    kind,
                    message,
                })?;
            pilot_times_s.push(result.wall_time.as_secs_f64());
        }

        let interval = derive_interval(
            &pilot_times_s,
            self.config.sample_count,
            self.config.min_interval,
        );
        tracing::debug!(
            experiment = %experiment.id,
            interval_ms = interval.as_secs_f64() * 1000.0,
            "derived monitoring interval"
        );

        // Stage 2: measurement at the derived interval
        let mut runs = Vec::with_capacity(self.config.std_repeat);
        for run in 0..self.config.std_repeat {
            let result = self
                .run_once(experiment, interval)
                .map_err(|(kind, message)| RunFailure {
                    stage: Stage::Measurement,
                    run,
                    kind,
                    message,
                })?;
            runs.push(result);
        }

        Ok(MeasuredExperiment {
            pilot_times_s,
            interval,
            runs,
        })
    }

    /// One engine run: spawn, sample, wait, parse. The monitor is started
    /// immediately after spawn and stopped once exit is observed, so its
    /// last snapshot lands at or near exit.
    fn run_once(
        &mut self,
        experiment: &Experiment,
        interval: Duration,
    ) -> Result<RunResult, (FailureKind, String)> {
        let spec = self
            .engines
            .get(&experiment.engine)
            .ok_or_else(|| {
                (
                    FailureKind::Invocation,
                    format!("engine {} is not configured", experiment.engine),
                )
            })?
            .clone();

        let profile_dir = self.prepare_profile_dir(experiment.engine)?;
        let invocation = spec.invocation(
            &experiment.query_sql,
            CaptureMode::Benchmark,
            profile_dir.as_deref(),
        );

        let process = EngineProcess::spawn(&invocation)
            .map_err(|e| (FailureKind::Invocation, e.to_string()))?;
        let monitor = ResourceMonitor::spawn(process.pid(), interval);

        let output = match process.wait(self.config.timeout) {
            Ok(output) => output,
            Err(e @ RunnerError::Timeout { .. }) => {
                // The child is already killed; the sampler stops on its own
                // once it observes the process gone
                monitor.stop();
                self.cleanup_profile_dir(profile_dir);
                return Err((FailureKind::Timeout, e.to_string()));
            }
            Err(e) => {
                monitor.stop();
                self.cleanup_profile_dir(profile_dir);
                return Err((FailureKind::Invocation, e.to_string()));
            }
        };

        let resources = monitor.stop();

        if let Err(e) = output.check_status() {
            self.cleanup_profile_dir(profile_dir);
            return Err((FailureKind::Invocation, e.to_string()));
        }

        let artifact = match (&profile_dir, experiment.engine) {
            (Some(dir), EngineKind::DuckDb) => RawArtifact::ProfileDir {
                dir: dir.clone(),
                statement_index: DUCKDB_QUERY_STATEMENT,
                stdout: output.stdout.clone(),
            },
            _ => RawArtifact::Text {
                stdout: output.stdout.clone(),
                stderr: output.stderr.clone(),
            },
        };

        let metric = parse_artifact(experiment.engine, &artifact);
        self.cleanup_profile_dir(profile_dir);
        let metric = metric.map_err(|e| (FailureKind::Parse, e.to_string()))?;

        Ok(RunResult {
            wall_time: output.wall_time,
            metric,
            resources,
        })
    }

    /// Engines that profile to disk get a fresh directory per run, so
    /// artifacts can never bleed between runs
    fn prepare_profile_dir(
        &mut self,
        engine: EngineKind,
    ) -> Result<Option<PathBuf>, (FailureKind, String)> {
        if engine != EngineKind::DuckDb {
            return Ok(None);
        }

        self.run_counter += 1;
        let dir = self
            .profile_root
            .join(format!("run_{}_{}", std::process::id(), self.run_counter));
        std::fs::create_dir_all(&dir).map_err(|e| {
            (
                FailureKind::Invocation,
                format!("cannot create profile directory {}: {}", dir.display(), e),
            )
        })?;
        Ok(Some(dir))
    }

    fn cleanup_profile_dir(&self, dir: Option<PathBuf>) {
        if let Some(dir) = dir {
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                tracing::debug!("leaving profile directory {}: {}", dir.display(), e);
            }
        }
    }
}
