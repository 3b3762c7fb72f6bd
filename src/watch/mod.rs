//! Watch composite: filesystem events debounced into task re-runs.
//!
//! Three stages, each on its own thread, wired by channels:
//!
//! ```text
//! notify callback → raw events → debounce loop → invocations → task runner
//! ```
//!
//! Completed tasks that affect the page are forwarded as [`TaskDone`]
//! events; the dev server's reload hub subscribes to that channel.

pub mod bindings;
pub(crate) mod debounce;

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use crossbeam::channel::{self, RecvTimeoutError, Sender};
use notify::{RecursiveMode, Watcher};
use rustc_hash::FxHashMap;

use crate::config::PipelineConfig;
use crate::core::is_shutdown;
use crate::paths::{AssetCategory, PathTable};
use crate::utils::fmt::plural_count;
use crate::{log, logger, task};

use bindings::WatchBindings;
use debounce::{ChangeKind, Debouncer};

/// Announcement that a category finished rebuilding after a change.
#[derive(Debug, Clone, Copy)]
pub struct TaskDone {
    pub category: AssetCategory,
}

/// One debounced change batch resolved to the tasks it re-runs.
struct Invocation {
    categories: Vec<AssetCategory>,
    summary: String,
}

/// Start the watcher threads. Returns once watching is registered; the
/// threads run until the process shuts down.
pub fn spawn(
    config: Arc<PipelineConfig>,
    table: Arc<PathTable>,
    done_tx: Sender<TaskDone>,
) -> Result<()> {
    let bindings = WatchBindings::new(&table)?;
    let source = config.source_dir().to_path_buf();

    let (raw_tx, raw_rx) = channel::unbounded::<notify::Event>();
    let mut watcher =
        notify::recommended_watcher(move |result: notify::Result<notify::Event>| match result {
            Ok(event) => {
                let _ = raw_tx.send(event);
            }
            Err(e) => log!("watch"; "notify error: {e}"),
        })
        .context("failed to create filesystem watcher")?;
    watcher
        .watch(&source, RecursiveMode::Recursive)
        .with_context(|| format!("failed to watch {}", source.display()))?;

    let (invoke_tx, invoke_rx) = channel::unbounded::<Invocation>();

    thread::Builder::new()
        .name("watch-debounce".into())
        .spawn(move || {
            // The watcher stops when dropped, park it here for the thread's life
            let _watcher = watcher;
            debounce_loop(&raw_rx, &invoke_tx, &bindings);
        })
        .context("failed to spawn debounce thread")?;

    thread::Builder::new()
        .name("watch-runner".into())
        .spawn(move || runner_loop(&invoke_rx, &config, &table, &done_tx))
        .context("failed to spawn rebuild thread")?;

    log!("watch"; "watching {} for changes", source.display());
    Ok(())
}

fn debounce_loop(
    raw_rx: &channel::Receiver<notify::Event>,
    invoke_tx: &Sender<Invocation>,
    bindings: &WatchBindings,
) {
    let mut debouncer = Debouncer::new();
    loop {
        match raw_rx.recv_timeout(debouncer.sleep_duration()) {
            Ok(event) => debouncer.add_event(&event),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        if is_shutdown() {
            break;
        }
        if let Some(batch) = debouncer.take_if_ready()
            && let Some(invocation) = route(&batch, bindings)
            && invoke_tx.send(invocation).is_err()
        {
            break;
        }
    }
}

/// Resolve a change batch to the categories it re-runs.
fn route(batch: &FxHashMap<PathBuf, ChangeKind>, bindings: &WatchBindings) -> Option<Invocation> {
    let mut categories: Vec<AssetCategory> = batch
        .keys()
        .flat_map(|path| bindings.categories_for(path))
        .collect();
    categories.sort();
    categories.dedup();
    if categories.is_empty() {
        return None;
    }

    let summary = if batch.len() == 1 {
        batch
            .keys()
            .next()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "1 file".to_owned())
    } else {
        plural_count(batch.len(), "file")
    };

    Some(Invocation {
        categories,
        summary,
    })
}

fn runner_loop(
    invoke_rx: &channel::Receiver<Invocation>,
    config: &PipelineConfig,
    table: &PathTable,
    done_tx: &Sender<TaskDone>,
) {
    for invocation in invoke_rx.iter() {
        if is_shutdown() {
            break;
        }
        logger::status_clear();
        for category in invocation.categories {
            match task::run(category, config, table) {
                Ok(_) => {
                    logger::status_success(&format!(
                        "{} rebuilt ({})",
                        category.label(),
                        invocation.summary
                    ));
                    if category.notifies_reload() && done_tx.send(TaskDone { category }).is_err() {
                        return;
                    }
                }
                Err(e) => {
                    logger::status_error(
                        &format!("{} failed ({})", category.label(), invocation.summary),
                        &e.to_string(),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(paths: &[&str]) -> FxHashMap<PathBuf, ChangeKind> {
        paths
            .iter()
            .map(|p| (PathBuf::from(p), ChangeKind::Modified))
            .collect()
    }

    fn test_bindings() -> WatchBindings {
        let mut config = PipelineConfig::default();
        config.root = PathBuf::from("/project");
        config.paths.source = PathBuf::from("/project/#src");
        config.paths.dist = PathBuf::from("/project/dist");
        WatchBindings::new(&PathTable::new(&config)).unwrap()
    }

    #[test]
    fn test_route_unions_and_orders_categories() {
        let bindings = test_bindings();
        let invocation = route(
            &batch(&[
                "/project/#src/index.html",
                "/project/#src/img/svg/arrow.svg",
            ]),
            &bindings,
        )
        .unwrap();

        assert_eq!(
            invocation.categories,
            vec![
                AssetCategory::Markup,
                AssetCategory::Images,
                AssetCategory::VectorIcons,
            ]
        );
        assert_eq!(invocation.summary, "2 files");
    }

    #[test]
    fn test_route_single_file_names_it() {
        let bindings = test_bindings();
        let invocation = route(&batch(&["/project/#src/scss/style.scss"]), &bindings).unwrap();
        assert_eq!(invocation.summary, "style.scss");
    }

    #[test]
    fn test_route_irrelevant_paths_drop_out() {
        let bindings = test_bindings();
        assert!(route(&batch(&["/project/#src/notes.txt"]), &bindings).is_none());
        assert!(route(&FxHashMap::default(), &bindings).is_none());
    }

    #[test]
    fn test_route_summary_prefers_file_name() {
        let bindings = test_bindings();
        let invocation = route(&batch(&["/project/#src/parts/_nav.html"]), &bindings).unwrap();
        assert_eq!(invocation.summary, "_nav.html");
        assert_eq!(invocation.categories, vec![AssetCategory::Markup]);
    }

    #[test]
    fn test_image_work_precedes_sprite_assembly() {
        assert!(AssetCategory::Images < AssetCategory::VectorIcons);
    }
}
