#![warn(missing_docs)]
//! Edgebench CLI Library
//!
//! Command-line driver for the benchmark pipeline: discovers configuration,
//! derives the experiment plan, runs the two-stage measurement protocol (or
//! the validation path) and emits reports.

mod config;
mod executor;
mod planner;

pub use config::*;
pub use executor::{
    build_report, compute_statistics, derive_interval, execute_validation, format_human_output,
    format_validation_output, ExecutionConfig, Executor, ExperimentOutcome, ExperimentStats,
    FailureKind, MeasuredExperiment, RunFailure, RunResult, Stage,
};
pub use planner::{build_plan, ExperimentPlan};

use clap::{Parser, Subcommand};
use edgebench_core::{EngineKind, EngineSpec};
use edgebench_report::{generate_json_report, summary_document, OutputFormat};
use edgebench_validate::Tolerance;
use regex::Regex;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

/// Edgebench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "edgebench")]
#[command(author, version, about = "Edgebench - query engine benchmarking for edge hosts")]
pub struct Cli {
    /// Optional subcommand (list, run, validate); defaults to run
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Filter experiments by regex pattern on their id
    #[arg(default_value = ".*")]
    pub filter: String,

    /// Run only this engine (sqlite, duckdb, chdb)
    #[arg(long)]
    pub engine: Option<EngineKind>,

    /// Explicit configuration file (default: discover edgebench.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: json, human
    #[arg(long, default_value = "human")]
    pub format: String,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Calibration runs per experiment (overrides config)
    #[arg(long)]
    pub repeat_pilot: Option<usize>,

    /// Measured runs per experiment (overrides config)
    #[arg(long)]
    pub std_repeat: Option<usize>,

    /// Target resource snapshots per measured run (overrides config)
    #[arg(long)]
    pub sample_count: Option<u32>,

    /// Per-run timeout in seconds (overrides config)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Dry run - list experiments without executing
    #[arg(long)]
    pub dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all planned experiments
    List,
    /// Run benchmarks (default)
    Run,
    /// Validate cross-engine result equivalence
    Validate,
    /// Write a reference edgebench.toml to the current directory
    Init,
}

/// Run the Edgebench CLI. This is the entry point for the binary.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the Edgebench CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("edgebench=debug")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("edgebench=info")
            .init();
    }

    // Load configuration: explicit path wins, then discovery, then defaults
    let config = match &cli.config {
        Some(path) => EdgebenchConfig::load(path)?,
        None => EdgebenchConfig::discover().unwrap_or_default(),
    };

    let format: OutputFormat = cli
        .format
        .parse()
        .unwrap_or(OutputFormat::Human);

    match cli.command {
        Some(Commands::Init) => init_config(),
        Some(Commands::List) => list_experiments(&cli, &config),
        Some(Commands::Validate) => run_validation(&cli, &config, format),
        Some(Commands::Run) => run_benchmarks(&cli, &config, format),
        None => {
            if cli.dry_run {
                list_experiments(&cli, &config)
            } else {
                run_benchmarks(&cli, &config, format)
            }
        }
    }
}

/// Build the filter regex from the CLI pattern
fn filter_regex(cli: &Cli) -> anyhow::Result<Regex> {
    Regex::new(&cli.filter)
        .map_err(|e| anyhow::anyhow!("Invalid filter pattern '{}': {}", cli.filter, e))
}

/// Resolve the engine spec map for every enabled engine
fn resolve_engines(config: &EdgebenchConfig) -> HashMap<EngineKind, EngineSpec> {
    config
        .engines
        .enabled()
        .into_iter()
        .filter_map(|kind| config.engines.get(kind).map(|e| (kind, e.spec(kind))))
        .collect()
}

/// Build the ExecutionConfig by layering: edgebench.toml -> CLI overrides
fn build_execution_config(cli: &Cli, config: &EdgebenchConfig) -> anyhow::Result<ExecutionConfig> {
    let defaults = ExecutionConfig::default();

    let pilot_interval = EdgebenchConfig::duration_field(&config.runner.pilot_interval)
        .unwrap_or(defaults.pilot_interval);
    let min_interval = EdgebenchConfig::duration_field(&config.runner.min_interval)
        .unwrap_or(defaults.min_interval);
    let timeout = match cli.timeout {
        Some(secs) => std::time::Duration::from_secs(secs),
        None => EdgebenchConfig::duration_field(&config.runner.timeout).unwrap_or(defaults.timeout),
    };

    let exec = ExecutionConfig {
        repeat_pilot: cli.repeat_pilot.unwrap_or(config.runner.repeat_pilot),
        std_repeat: cli.std_repeat.unwrap_or(config.runner.std_repeat),
        sample_count: cli.sample_count.unwrap_or(config.runner.sample_count),
        pilot_interval,
        min_interval,
        timeout,
    };

    if exec.repeat_pilot == 0 || exec.std_repeat == 0 {
        return Err(anyhow::anyhow!(
            "repeat_pilot and std_repeat must both be at least 1"
        ));
    }
    if exec.sample_count == 0 {
        return Err(anyhow::anyhow!("sample_count must be at least 1"));
    }

    Ok(exec)
}

fn init_config() -> anyhow::Result<()> {
    let path = PathBuf::from("edgebench.toml");
    if path.exists() {
        return Err(anyhow::anyhow!("edgebench.toml already exists"));
    }
    std::fs::write(&path, EdgebenchConfig::default_toml())?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn list_experiments(cli: &Cli, config: &EdgebenchConfig) -> anyhow::Result<()> {
    let re = filter_regex(cli)?;
    let plan = build_plan(config, Some(&re), cli.engine)?;

    println!("Edgebench Plan:");

    let mut groups: std::collections::BTreeMap<&str, Vec<&str>> =
        std::collections::BTreeMap::new();
    for experiment in &plan.experiments {
        groups
            .entry(&experiment.query_group)
            .or_default()
            .push(experiment.engine.as_str());
    }

    for (group, engines) in &groups {
        println!("├── query group: {}", group);
        for engine in engines {
            println!("│   ├── {}", engine);
        }
    }
    println!("{} experiments planned.", plan.experiments.len());

    Ok(())
}

fn run_benchmarks(
    cli: &Cli,
    config: &EdgebenchConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let re = filter_regex(cli)?;
    let plan = build_plan(config, Some(&re), cli.engine)?;

    if plan.experiments.is_empty() {
        println!("No experiments found.");
        return Ok(());
    }

    let exec_config = build_execution_config(cli, config)?;
    let engines = resolve_engines(config);

    println!(
        "Running {} experiments ({} pilot + {} measured runs each)...\n",
        plan.experiments.len(),
        exec_config.repeat_pilot,
        exec_config.std_repeat
    );

    let start_time = Instant::now();

    let output_dir = PathBuf::from(&config.output.directory);
    let profile_root = output_dir.join("profiles");
    let mut executor = Executor::new(exec_config.clone(), engines, profile_root);
    let outcomes = executor.execute(&plan.experiments);

    // Summaries are computed from materialized runs, in parallel
    let stats = compute_statistics(&outcomes);

    let total_duration_ms = start_time.elapsed().as_secs_f64() * 1000.0;
    let report = build_report(&outcomes, &stats, &exec_config, total_duration_ms);

    let output = match format {
        OutputFormat::Json => generate_json_report(&report)?,
        OutputFormat::Human => format_human_output(&report),
    };

    if let Some(ref path) = cli.output {
        let mut file = std::fs::File::create(path)?;
        file.write_all(output.as_bytes())?;
        println!("Report written to: {}", path.display());
    } else {
        print!("{}", output);
    }

    // The summary document is what the visualization step consumes
    std::fs::create_dir_all(&output_dir)?;
    let summary_path = output_dir.join("summary.json");
    std::fs::write(
        &summary_path,
        serde_json::to_string_pretty(&summary_document(&report))?,
    )?;
    tracing::info!("summary document written to {}", summary_path.display());

    if report.summary.failed > 0 {
        eprintln!("\n{} experiment(s) failed", report.summary.failed);
        std::process::exit(1);
    }

    Ok(())
}

fn run_validation(
    cli: &Cli,
    config: &EdgebenchConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let re = filter_regex(cli)?;
    let plan = build_plan(config, Some(&re), cli.engine)?;

    if plan.experiments.is_empty() {
        println!("No experiments found.");
        return Ok(());
    }

    let exec_config = build_execution_config(cli, config)?;
    let engines = resolve_engines(config);
    let tolerance = Tolerance {
        rtol: config.validation.rtol,
        atol: config.validation.atol,
    };

    let comparisons = execute_validation(
        &plan.experiments,
        &engines,
        exec_config.timeout,
        tolerance,
        config.validation.max_diffs,
    )?;

    let output = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&comparisons)?,
        OutputFormat::Human => format_validation_output(&comparisons),
    };

    if let Some(ref path) = cli.output {
        let mut file = std::fs::File::create(path)?;
        file.write_all(output.as_bytes())?;
        println!("Validation report written to: {}", path.display());
    } else {
        print!("{}", output);
    }

    let mismatches = comparisons.iter().filter(|c| !c.identical).count();
    if mismatches > 0 {
        eprintln!("\n{} pairwise comparison(s) differ", mismatches);
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn cli_overrides_win_over_config() {
        let cli = parse_cli(&[
            "edgebench",
            "--repeat-pilot",
            "5",
            "--std-repeat",
            "9",
            "--timeout",
            "42",
        ]);
        let config = EdgebenchConfig::default();
        let exec = build_execution_config(&cli, &config).unwrap();

        assert_eq!(exec.repeat_pilot, 5);
        assert_eq!(exec.std_repeat, 9);
        assert_eq!(exec.timeout, std::time::Duration::from_secs(42));
        // Untouched fields come from config defaults
        assert_eq!(exec.sample_count, 10);
        assert_eq!(exec.pilot_interval, std::time::Duration::from_secs(10));
    }

    #[test]
    fn config_durations_are_parsed() {
        let cli = parse_cli(&["edgebench"]);
        let mut config = EdgebenchConfig::default();
        config.runner.pilot_interval = "2s".to_string();
        config.runner.min_interval = "5ms".to_string();

        let exec = build_execution_config(&cli, &config).unwrap();
        assert_eq!(exec.pilot_interval, std::time::Duration::from_secs(2));
        assert_eq!(exec.min_interval, std::time::Duration::from_millis(5));
    }

    #[test]
    fn zero_repeats_are_rejected() {
        let cli = parse_cli(&["edgebench", "--std-repeat", "0"]);
        let config = EdgebenchConfig::default();
        assert!(build_execution_config(&cli, &config).is_err());
    }

    #[test]
    fn engine_argument_parses() {
        let cli = parse_cli(&["edgebench", "--engine", "duckdb"]);
        assert_eq!(cli.engine, Some(EngineKind::DuckDb));
    }
}
