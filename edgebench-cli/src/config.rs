//! Configuration loading from edgebench.toml
//!
//! All engine paths, dataset locations and protocol knobs live in one
//! `edgebench.toml`, discovered by walking up from the current directory.
//! The resolved configuration object is constructed once and passed into the
//! executor and validator; nothing reads configuration ambiently.

use edgebench_core::{EngineKind, EngineSpec};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Edgebench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EdgebenchConfig {
    /// Measurement protocol settings
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Dataset and query locations
    #[serde(default)]
    pub data: DataConfig,
    /// Per-engine invocation settings; an absent engine is simply not
    /// benchmarked
    #[serde(default)]
    pub engines: EnginesConfig,
    /// Result-equivalence tolerances
    #[serde(default)]
    pub validation: ValidationConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Measurement protocol settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Calibration runs per experiment (sizes the monitoring interval)
    #[serde(default = "default_repeat_pilot")]
    pub repeat_pilot: usize,
    /// Measured runs per experiment
    #[serde(default = "default_std_repeat")]
    pub std_repeat: usize,
    /// Target resource snapshots per measured run
    #[serde(default = "default_sample_count")]
    pub sample_count: u32,
    /// Coarse monitoring interval during calibration (e.g. "10s")
    #[serde(default = "default_pilot_interval")]
    pub pilot_interval: String,
    /// Floor under the derived monitoring interval (e.g. "1ms")
    #[serde(default = "default_min_interval")]
    pub min_interval: String,
    /// Per-run timeout (e.g. "300s"); a wedged engine is killed at this point
    #[serde(default = "default_timeout")]
    pub timeout: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            repeat_pilot: default_repeat_pilot(),
            std_repeat: default_std_repeat(),
            sample_count: default_sample_count(),
            pilot_interval: default_pilot_interval(),
            min_interval: default_min_interval(),
            timeout: default_timeout(),
        }
    }
}

fn default_repeat_pilot() -> usize {
    3
}
fn default_std_repeat() -> usize {
    5
}
fn default_sample_count() -> u32 {
    10
}
fn default_pilot_interval() -> String {
    "10s".to_string()
}
fn default_min_interval() -> String {
    "1ms".to_string()
}
fn default_timeout() -> String {
    "300s".to_string()
}

/// Dataset and query locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory of `.sql` files; each file stem is a query group
    #[serde(default = "default_queries_dir")]
    pub queries: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            queries: default_queries_dir(),
        }
    }
}

fn default_queries_dir() -> PathBuf {
    PathBuf::from("queries")
}

/// Per-engine invocation settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EnginesConfig {
    /// SQLite CLI settings
    #[serde(default)]
    pub sqlite: Option<EngineConfig>,
    /// DuckDB CLI settings
    #[serde(default)]
    pub duckdb: Option<EngineConfig>,
    /// chDB shim settings
    #[serde(default)]
    pub chdb: Option<EngineConfig>,
}

impl EnginesConfig {
    /// Settings for one engine, if configured
    pub fn get(&self, kind: EngineKind) -> Option<&EngineConfig> {
        match kind {
            EngineKind::Sqlite => self.sqlite.as_ref(),
            EngineKind::DuckDb => self.duckdb.as_ref(),
            EngineKind::Chdb => self.chdb.as_ref(),
        }
    }

    /// Engines present in the configuration, in deterministic order
    pub fn enabled(&self) -> Vec<EngineKind> {
        EngineKind::ALL
            .into_iter()
            .filter(|kind| self.get(*kind).is_some())
            .collect()
    }
}

/// Invocation settings for one engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Path to the engine executable (or shim)
    pub binary: PathBuf,
    /// Database file or directory handed to the engine
    pub database: PathBuf,
    /// Extra flags appended to every invocation
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl EngineConfig {
    /// Resolve into the runner's invocation spec
    pub fn spec(&self, kind: EngineKind) -> EngineSpec {
        EngineSpec {
            kind,
            binary: self.binary.clone(),
            database: self.database.clone(),
            extra_args: self.extra_args.clone(),
        }
    }
}

/// Result-equivalence tolerances
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Relative tolerance for numeric cells
    #[serde(default = "default_rtol")]
    pub rtol: f64,
    /// Absolute tolerance for numeric cells
    #[serde(default = "default_atol")]
    pub atol: f64,
    /// How many differing cells to retain per pair
    #[serde(default = "default_max_diffs")]
    pub max_diffs: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            rtol: default_rtol(),
            atol: default_atol(),
            max_diffs: default_max_diffs(),
        }
    }
}

fn default_rtol() -> f64 {
    1e-5
}
fn default_atol() -> f64 {
    1e-8
}
fn default_max_diffs() -> usize {
    10
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output format: "human" or "json"
    #[serde(default = "default_format")]
    pub format: String,
    /// Directory for reports, summaries and transient profiling artifacts
    #[serde(default = "default_output_dir")]
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            directory: default_output_dir(),
        }
    }
}

fn default_format() -> String {
    "human".to_string()
}
fn default_output_dir() -> String {
    "target/edgebench".to_string()
}

impl EdgebenchConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from the current
    /// directory
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join("edgebench.toml");
            if config_path.exists() {
                return Self::load(&config_path).ok();
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Generate a reference configuration as a TOML string
    pub fn default_toml() -> String {
        r#"# Edgebench Configuration

[runner]
# Calibration runs per experiment (size the monitoring interval)
repeat_pilot = 3
# Measured runs per experiment
std_repeat = 5
# Target resource snapshots per measured run
sample_count = 10
# Coarse monitoring interval during calibration
pilot_interval = "10s"
# Floor under the derived monitoring interval
min_interval = "1ms"
# Per-run timeout; a wedged engine is killed at this point
timeout = "300s"

[data]
# Directory of .sql files; each file stem is a query group
queries = "queries"

# Engines are benchmarked only when configured. Each engine opens its own
# rendition of the dataset.
[engines.sqlite]
binary = "/usr/bin/sqlite3"
database = "data/sensors.sqlite"

[engines.duckdb]
binary = "/usr/local/bin/duckdb"
database = "data/sensors.duckdb"

[engines.chdb]
binary = "tools/chdb_shim"
database = "data/sensors_chdb"
# extra_args = ["--threads", "1"]

[validation]
# Numeric cell tolerance: |a-b| <= atol + rtol*|b|
rtol = 1e-5
atol = 1e-8
# Differing cells retained per comparison
max_diffs = 10

[output]
# Default output format: human or json
format = "human"
# Directory for reports, summaries and transient profiling artifacts
directory = "target/edgebench"
"#
        .to_string()
    }

    /// Parse duration string (e.g. "10s", "1ms", "2m") to nanoseconds
    pub fn parse_duration(s: &str) -> anyhow::Result<u64> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("Empty duration string"));
        }

        // Find where the number ends and unit begins
        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;

        let multiplier: u64 = match unit_part.to_lowercase().as_str() {
            "ns" => 1,
            "us" => 1_000,
            "ms" => 1_000_000,
            "s" | "" => 1_000_000_000,
            "m" | "min" => 60_000_000_000,
            _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
        };

        Ok((value * multiplier as f64) as u64)
    }

    /// Parse a duration field into a [`Duration`]
    pub fn duration_field(s: &str) -> anyhow::Result<Duration> {
        Ok(Duration::from_nanos(Self::parse_duration(s)?))
    }
}
