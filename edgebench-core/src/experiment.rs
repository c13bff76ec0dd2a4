//! Experiment Identity
//!
//! An `Experiment` names one (query group, engine, dataset) triple to
//! benchmark. It is constructed once from configuration and never mutated;
//! every run of the tool derives the full product of query groups and
//! enabled engines.

use crate::engine::EngineKind;
use std::path::PathBuf;

/// One (query group, engine, dataset) combination to measure
#[derive(Debug, Clone)]
pub struct Experiment {
    /// Unique identifier, `<query_group>/<engine>`
    pub id: String,
    /// Query group name (the query file's stem)
    pub query_group: String,
    /// Engine this experiment targets
    pub engine: EngineKind,
    /// Path the query text was loaded from
    pub query_path: PathBuf,
    /// The SQL text itself
    pub query_sql: String,
}

impl Experiment {
    /// Construct an experiment; the id is derived, not chosen.
    pub fn new(
        query_group: impl Into<String>,
        engine: EngineKind,
        query_path: PathBuf,
        query_sql: String,
    ) -> Self {
        let query_group = query_group.into();
        Self {
            id: format!("{}/{}", query_group, engine),
            query_group,
            engine,
            query_path,
            query_sql,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_group_slash_engine() {
        let e = Experiment::new(
            "q1_avg_heartrate",
            EngineKind::DuckDb,
            PathBuf::from("queries/q1_avg_heartrate.sql"),
            "SELECT 1".to_string(),
        );
        assert_eq!(e.id, "q1_avg_heartrate/duckdb");
    }
}
