//! Build orchestration.
//!
//! A build is a [`BuildGraph`] evaluated wave by wave: clean runs alone in
//! the first wave, then the transform tasks fan out across the rayon pool.
//! Failures stay local to their step. Dependents of a failed step are
//! skipped, siblings keep running, and the report carries every outcome.

pub mod clean;
pub mod graph;

use std::collections::HashSet;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::config::PipelineConfig;
use crate::core::is_shutdown;
use crate::log;
use crate::paths::{AssetCategory, PathTable};
use crate::task;
use crate::utils::fmt::plural_count;

pub use graph::{BuildGraph, BuildStep, CycleError};

/// Terminal state of one step in a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Completed,
    Failed(String),
    /// A prerequisite failed, so the step never ran
    Skipped,
}

/// Aggregated outcome of one graph evaluation.
#[derive(Debug)]
pub struct BuildReport {
    results: Vec<(BuildStep, StepStatus)>,
    elapsed: Duration,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.results
            .iter()
            .all(|(_, status)| *status == StepStatus::Completed)
    }

    /// Names of the steps that failed outright.
    pub fn failed_steps(&self) -> Vec<String> {
        self.results
            .iter()
            .filter_map(|(step, status)| match status {
                StepStatus::Failed(_) => Some(step.to_string()),
                _ => None,
            })
            .collect()
    }

    pub fn statuses(&self) -> &[(BuildStep, StepStatus)] {
        &self.results
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Run the full clean-then-transform build.
pub fn run_build(config: &PipelineConfig, table: &PathTable) -> Result<BuildReport, CycleError> {
    run_graph(&BuildGraph::full_build(), config, table)
}

/// Run one category's task in isolation, without cleaning.
pub fn run_single(
    category: AssetCategory,
    config: &PipelineConfig,
    table: &PathTable,
) -> Result<BuildReport, CycleError> {
    run_graph(&BuildGraph::single(category), config, table)
}

/// Evaluate a graph wave by wave on the rayon pool.
pub fn run_graph(
    graph: &BuildGraph,
    config: &PipelineConfig,
    table: &PathTable,
) -> Result<BuildReport, CycleError> {
    let start = Instant::now();
    let waves = graph.waves()?;

    let mut blocked: HashSet<BuildStep> = HashSet::new();
    let mut results = Vec::new();

    for wave in waves {
        let (skipped, runnable): (Vec<_>, Vec<_>) = wave
            .into_iter()
            .partition(|step| graph.predecessors(*step).any(|p| blocked.contains(&p)));

        for step in skipped {
            blocked.insert(step);
            results.push((step, StepStatus::Skipped));
        }

        let mut wave_results: Vec<(BuildStep, StepStatus)> = runnable
            .into_par_iter()
            .map(|step| {
                if is_shutdown() {
                    return (step, StepStatus::Failed("interrupted".into()));
                }
                match execute(step, config, table) {
                    Ok(()) => (step, StepStatus::Completed),
                    Err(message) => {
                        log!("error"; "{step}: {message}");
                        (step, StepStatus::Failed(message))
                    }
                }
            })
            .collect();

        for (step, status) in &wave_results {
            if *status != StepStatus::Completed {
                blocked.insert(*step);
            }
        }
        results.append(&mut wave_results);
    }

    let report = BuildReport {
        results,
        elapsed: start.elapsed(),
    };
    log_report(&report);
    Ok(report)
}

fn execute(step: BuildStep, config: &PipelineConfig, table: &PathTable) -> Result<(), String> {
    match step {
        BuildStep::Clean => clean::remove_dist(config).map_err(|e| e.to_string()),
        BuildStep::Task(category) => task::run(category, config, table)
            .map(|_| ())
            .map_err(|e| e.to_string()),
    }
}

fn log_report(report: &BuildReport) {
    let failed = report.failed_steps();
    if failed.is_empty() {
        log!("build"; "done in {:.2?}", report.elapsed());
    } else {
        log!(
            "error";
            "{} failed: {}", plural_count(failed.len(), "step"), failed.join(", ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn project_config(root: &Path) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.root = root.to_path_buf();
        config.paths.source = root.join("src");
        config.paths.dist = root.join("dist");
        config
    }

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_full_build_end_to_end() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("src");
        let dist = tmp.path().join("dist");
        write(&src.join("index.html"), "<h1>home</h1>");
        write(&src.join("contact.php"), "<?php echo 'hi'; ?>");
        write(&src.join("scss/style.scss"), "body { margin: 0; a { color: red; } }");
        write(&src.join("js/script.js"), "const doubled = 2 ** 5;\nconsole.log(doubled);\n");
        write(
            &src.join("img/logo.svg"),
            "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 8 8\"><rect width=\"8\" height=\"8\"/></svg>",
        );
        write(
            &src.join("img/svg/star.svg"),
            "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 4 4\"><path d=\"M0 0h4\"/></svg>",
        );
        write(&src.join("fonts/body.woff2"), "fake-font-bytes");
        // Stale output from an earlier run must not survive the clean
        write(&dist.join("stale.txt"), "old");

        let config = project_config(tmp.path());
        let table = PathTable::new(&config);
        let report = run_build(&config, &table).unwrap();

        assert!(report.is_success(), "failed: {:?}", report.failed_steps());
        assert!(!dist.join("stale.txt").exists());
        assert!(dist.join("index.html").exists());
        assert!(dist.join("contact.php").exists());
        assert!(dist.join("css/style.css").exists());
        assert!(dist.join("css/style.min.css").exists());
        assert!(dist.join("js/script.js").exists());
        assert!(dist.join("js/script.min.js").exists());
        assert!(dist.join("img/logo.svg").exists());
        assert!(dist.join("img/svg/star.svg").exists());
        assert!(dist.join("sprite.svg").exists());
        assert!(dist.join("fonts/body.woff2").exists());
    }

    #[test]
    fn test_failed_step_blocks_dependents_only() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("src");
        write(&src.join("index.html"), "<h1>home</h1>");
        write(&src.join("scss/style.scss"), "body { color: }");
        write(&src.join("contact.php"), "<?php ?>");

        let config = project_config(tmp.path());
        let table = PathTable::new(&config);

        // Markup is made to wait on styles, server pages stay independent
        let mut graph = BuildGraph::new();
        graph.add_edge(
            BuildStep::Task(AssetCategory::Styles),
            BuildStep::Task(AssetCategory::Markup),
        );
        graph.add_step(BuildStep::Task(AssetCategory::ServerPages));

        let report = run_graph(&graph, &config, &table).unwrap();

        assert!(!report.is_success());
        assert_eq!(report.failed_steps(), vec!["css".to_string()]);
        let markup_status = report
            .statuses()
            .iter()
            .find(|(step, _)| *step == BuildStep::Task(AssetCategory::Markup))
            .map(|(_, status)| status.clone())
            .unwrap();
        assert_eq!(markup_status, StepStatus::Skipped);
        assert!(!tmp.path().join("dist/index.html").exists());
        // The independent sibling still ran
        assert!(tmp.path().join("dist/contact.php").exists());
    }
}
