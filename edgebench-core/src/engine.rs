//! Engine Definitions
//!
//! The engines under comparison form a closed set of tagged variants. Each
//! variant knows how to shape its own command line and input script; the
//! orchestrator stays engine-agnostic. Adding a fourth engine means adding a
//! variant here plus one profile adapter, nothing else.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// One of the interchangeable query engines under comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// SQLite CLI: timer line on stdout, optional scan statistics
    Sqlite,
    /// DuckDB CLI: JSON profiling document per statement
    DuckDb,
    /// chDB via a command-line shim: key-value statistics ahead of a CSV payload
    Chdb,
}

impl EngineKind {
    /// All engine variants, in deterministic order
    pub const ALL: [EngineKind; 3] = [EngineKind::Sqlite, EngineKind::DuckDb, EngineKind::Chdb];

    /// Stable lowercase identifier used in experiment ids, config and reports
    pub fn as_str(self) -> &'static str {
        match self {
            EngineKind::Sqlite => "sqlite",
            EngineKind::DuckDb => "duckdb",
            EngineKind::Chdb => "chdb",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(EngineKind::Sqlite),
            "duckdb" => Ok(EngineKind::DuckDb),
            "chdb" => Ok(EngineKind::Chdb),
            other => Err(format!("Unknown engine: {}", other)),
        }
    }
}

/// Resolved invocation settings for one engine, from configuration
#[derive(Debug, Clone)]
pub struct EngineSpec {
    /// Which engine this spec invokes
    pub kind: EngineKind,
    /// Path to the engine executable (or shim)
    pub binary: PathBuf,
    /// Database file or directory handed to the engine
    pub database: PathBuf,
    /// Extra flags appended verbatim to every invocation
    pub extra_args: Vec<String>,
}

/// Whether row output is retained for comparison or only counted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Benchmarking: rows are counted, payload formatting kept minimal
    Benchmark,
    /// Validation: full payload retained in a comparable CSV form
    Validation,
}

/// A fully shaped engine invocation, ready to spawn
#[derive(Debug, Clone)]
pub struct EngineInvocation {
    /// Executable to spawn
    pub program: PathBuf,
    /// Command-line arguments
    pub args: Vec<String>,
    /// Script fed to the child's stdin, if the engine reads commands there
    pub stdin_script: Option<String>,
}

impl EngineSpec {
    /// Shape the invocation for one query.
    ///
    /// `profile_dir` is only consulted by engines that write profiling
    /// artifacts to disk (DuckDB); the caller owns creation and cleanup of
    /// that directory per run so artifacts never leak across runs.
    pub fn invocation(
        &self,
        sql: &str,
        mode: CaptureMode,
        profile_dir: Option<&Path>,
    ) -> EngineInvocation {
        match self.kind {
            EngineKind::Sqlite => self.sqlite_invocation(sql, mode),
            EngineKind::DuckDb => self.duckdb_invocation(sql, mode, profile_dir),
            EngineKind::Chdb => self.chdb_invocation(sql, mode),
        }
    }

    /// SQLite reads a dot-command script on stdin. `.timer on` makes the CLI
    /// print the `Run Time: real ... user ... sys ...` line after each
    /// statement; validation adds CSV mode with headers.
    fn sqlite_invocation(&self, sql: &str, mode: CaptureMode) -> EngineInvocation {
        let mut script = String::from(".timer on\n");
        if mode == CaptureMode::Validation {
            script.push_str(".mode csv\n.headers on\n");
        }
        script.push_str(sql.trim());
        if !sql.trim_end().ends_with(';') {
            script.push(';');
        }
        script.push('\n');

        let mut args = vec![self.database.display().to_string()];
        args.extend(self.extra_args.iter().cloned());

        EngineInvocation {
            program: self.binary.clone(),
            args,
            stdin_script: Some(script),
        }
    }

    /// DuckDB also reads commands on stdin. Profiling pragmas point the
    /// per-statement JSON documents at `profile_dir`; the benchmark query is
    /// the final statement of the script.
    fn duckdb_invocation(
        &self,
        sql: &str,
        mode: CaptureMode,
        profile_dir: Option<&Path>,
    ) -> EngineInvocation {
        let mut script = String::new();
        if let Some(dir) = profile_dir {
            script.push_str("PRAGMA enable_profiling='json';\n");
            script.push_str(&format!(
                "PRAGMA profiling_output='{}';\n",
                dir.join("profile_0.json").display()
            ));
        }
        if mode == CaptureMode::Validation {
            script.push_str(".mode csv\n.headers on\n");
        }
        script.push_str(sql.trim());
        if !sql.trim_end().ends_with(';') {
            script.push(';');
        }
        script.push('\n');

        let mut args = vec![self.database.display().to_string()];
        args.extend(self.extra_args.iter().cloned());

        EngineInvocation {
            program: self.binary.clone(),
            args,
            stdin_script: Some(script),
        }
    }

    /// The chDB shim takes the database location and the query as argv and
    /// prints its statistics block itself; there is no capture-mode switch
    /// because its payload is always CSV with a header.
    fn chdb_invocation(&self, sql: &str, _mode: CaptureMode) -> EngineInvocation {
        let mut args = vec![
            self.database.display().to_string(),
            sql.trim().to_string(),
        ];
        args.extend(self.extra_args.iter().cloned());

        EngineInvocation {
            program: self.binary.clone(),
            args,
            stdin_script: None,
        }
    }
}
