#![warn(missing_docs)]
//! Edgebench Profile Parser
//!
//! One adapter per engine, all behind the same seam: a captured
//! [`RawArtifact`] goes in, a canonical [`QueryMetric`] comes out. Unknown
//! or malformed lines inside an artifact are skipped; a completely empty or
//! unparseable artifact is a fatal parse error for that run, kept distinct
//! from invocation errors so operators can tell "query failed" from "query
//! succeeded but its profile was unreadable".

mod chdb;
mod duckdb;
mod sqlite;

use edgebench_core::{EngineKind, QueryMetric, RawArtifact, RunOutput};
use thiserror::Error;

/// Errors from normalizing an engine's profiling artifact
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Artifact contained nothing parseable at all
    #[error("{engine} produced no parseable profiling output")]
    EmptyArtifact {
        /// Engine whose artifact was empty
        engine: EngineKind,
    },

    /// A required field never appeared in the artifact
    #[error("{engine} profile is missing required field `{field}`")]
    MissingField {
        /// Engine whose artifact was incomplete
        engine: EngineKind,
        /// The absent field
        field: &'static str,
    },

    /// Expected profile document was not on disk
    #[error("No profile document found under {dir}")]
    MissingProfile {
        /// Directory that was searched
        dir: String,
    },

    /// Profile document existed but was not valid JSON
    #[error("Invalid JSON profile {path}: {source}")]
    InvalidJson {
        /// Offending document path
        path: String,
        /// Underlying serde error
        #[source]
        source: serde_json::Error,
    },

    /// Filesystem failure while reading profile documents
    #[error("I/O error reading profile artifact: {0}")]
    Io(#[from] std::io::Error),
}

/// Normalize a raw artifact into the canonical metric record.
///
/// The artifact variant must match the engine: SQLite and chDB profile via
/// their output streams, DuckDB via on-disk JSON documents.
pub fn parse_artifact(engine: EngineKind, artifact: &RawArtifact) -> Result<QueryMetric, ProfileError> {
    match (engine, artifact) {
        (EngineKind::Sqlite, RawArtifact::Text { stdout, stderr }) => {
            sqlite::parse(stdout, stderr)
        }
        (EngineKind::Chdb, RawArtifact::Text { stdout, stderr }) => chdb::parse(stdout, stderr),
        (
            EngineKind::DuckDb,
            RawArtifact::ProfileDir {
                dir,
                statement_index,
                stdout,
            },
        ) => duckdb::parse(dir, *statement_index, stdout),
        (engine, _) => Err(ProfileError::EmptyArtifact { engine }),
    }
}

/// Extract the result payload (rows only) from a run's captured output,
/// with the engine's profiling chatter stripped. This is what the
/// correctness validator parses as CSV.
pub fn result_payload(engine: EngineKind, output: &RunOutput) -> String {
    match engine {
        EngineKind::Sqlite => sqlite::payload(&output.stdout),
        EngineKind::DuckDb => duckdb::payload(&output.stdout),
        EngineKind::Chdb => chdb::payload(&output.stdout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_variant_mismatch_is_empty_artifact() {
        let artifact = RawArtifact::Text {
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(matches!(
            parse_artifact(EngineKind::DuckDb, &artifact),
            Err(ProfileError::EmptyArtifact {
                engine: EngineKind::DuckDb
            })
        ));
    }
}
