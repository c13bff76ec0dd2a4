//! Experiment Planner
//!
//! Derives the experiment list from configuration: every `.sql` file in the
//! query directory crossed with every enabled engine, filtered by the CLI's
//! regex and engine options, sorted by id for deterministic execution order.

use crate::config::EdgebenchConfig;
use edgebench_core::{EngineKind, Experiment};
use std::path::Path;

/// Execution plan for experiments
pub struct ExperimentPlan {
    /// Ordered list of experiments to run
    pub experiments: Vec<Experiment>,
}

/// Build the experiment plan from configuration and CLI filters
pub fn build_plan(
    config: &EdgebenchConfig,
    filter: Option<&regex::Regex>,
    engine: Option<EngineKind>,
) -> anyhow::Result<ExperimentPlan> {
    let engines: Vec<EngineKind> = config
        .engines
        .enabled()
        .into_iter()
        .filter(|kind| engine.map(|wanted| wanted == *kind).unwrap_or(true))
        .collect();

    let query_files = discover_queries(&config.data.queries)?;

    let mut experiments = Vec::new();
    for path in &query_files {
        let group = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| anyhow::anyhow!("Unreadable query file name: {}", path.display()))?
            .to_string();
        let sql = std::fs::read_to_string(path)?;

        for kind in &engines {
            let experiment = Experiment::new(group.clone(), *kind, path.clone(), sql.clone());
            if let Some(re) = filter {
                if !re.is_match(&experiment.id) {
                    continue;
                }
            }
            experiments.push(experiment);
        }
    }

    // Sort by id for deterministic execution order
    experiments.sort_by(|a, b| a.id.cmp(&b.id));

    Ok(ExperimentPlan { experiments })
}

fn discover_queries(dir: &Path) -> anyhow::Result<Vec<std::path::PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| anyhow::anyhow!("Cannot read query directory {}: {}", dir.display(), e))?;

    let mut files: Vec<_> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "sql"))
        .collect();
    files.sort();

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use std::path::PathBuf;

    fn config_with_queries(dir: &Path) -> EdgebenchConfig {
        let mut config = EdgebenchConfig::default();
        config.data.queries = dir.to_path_buf();
        config.engines.sqlite = Some(EngineConfig {
            binary: PathBuf::from("/usr/bin/sqlite3"),
            database: PathBuf::from("db.sqlite"),
            extra_args: vec![],
        });
        config.engines.duckdb = Some(EngineConfig {
            binary: PathBuf::from("/usr/bin/duckdb"),
            database: PathBuf::from("db.duckdb"),
            extra_args: vec![],
        });
        config
    }

    #[test]
    fn plan_is_query_by_engine_product_in_id_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("q2_window.sql"), "SELECT 2").unwrap();
        std::fs::write(dir.path().join("q1_avg.sql"), "SELECT 1").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a query").unwrap();

        let config = config_with_queries(dir.path());
        let plan = build_plan(&config, None, None).unwrap();

        let ids: Vec<_> = plan.experiments.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "q1_avg/duckdb",
                "q1_avg/sqlite",
                "q2_window/duckdb",
                "q2_window/sqlite"
            ]
        );
        assert_eq!(plan.experiments[0].query_sql, "SELECT 1");
    }

    #[test]
    fn regex_filter_narrows_plan() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("q1_avg.sql"), "SELECT 1").unwrap();
        std::fs::write(dir.path().join("q2_window.sql"), "SELECT 2").unwrap();

        let config = config_with_queries(dir.path());
        let re = regex::Regex::new("^q1_").unwrap();
        let plan = build_plan(&config, Some(&re), None).unwrap();

        assert_eq!(plan.experiments.len(), 2);
        assert!(plan.experiments.iter().all(|e| e.query_group == "q1_avg"));
    }

    #[test]
    fn engine_filter_narrows_plan() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("q1_avg.sql"), "SELECT 1").unwrap();

        let config = config_with_queries(dir.path());
        let plan = build_plan(&config, None, Some(EngineKind::Sqlite)).unwrap();

        assert_eq!(plan.experiments.len(), 1);
        assert_eq!(plan.experiments[0].engine, EngineKind::Sqlite);
    }

    #[test]
    fn missing_query_directory_is_an_error() {
        let config = config_with_queries(Path::new("/nonexistent/queries"));
        assert!(build_plan(&config, None, None).is_err());
    }
}
