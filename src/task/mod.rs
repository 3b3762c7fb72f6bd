//! Transform tasks: one per asset category.
//!
//! Every task follows the same contract: match sources through the path
//! table, write transformed outputs under the mapping's destination, and
//! report counts. An empty match set is a logged no-op, never an error.

pub mod include;

mod copy;
mod images;
mod markup;
mod scripts;
mod sprite;
mod styles;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::PipelineConfig;
use crate::log;
use crate::paths::{AssetCategory, PathMapping, PathTable};

// ============================================================================
// Outcome and errors
// ============================================================================

/// What a completed task reports back to the scheduler.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskOutcome {
    /// Sources the globs matched
    pub matched: usize,
    /// Files written under the destination
    pub written: usize,
}

/// Errors a single task run can fail with.
///
/// A task failure never aborts sibling tasks; the scheduler collects these
/// and reports them together.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("no path mapping configured for `{0}`")]
    MissingMapping(AssetCategory),

    #[error("invalid source pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {message}", path.display())]
    Transform { path: PathBuf, message: String },

    #[error(transparent)]
    Include(#[from] include::IncludeError),
}

impl TaskError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn transform(path: &Path, message: impl Into<String>) -> Self {
        Self::Transform {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Run one task against the path table.
pub fn run(
    category: AssetCategory,
    config: &PipelineConfig,
    table: &PathTable,
) -> Result<TaskOutcome, TaskError> {
    let mapping = table
        .mapping(category)
        .ok_or(TaskError::MissingMapping(category))?;

    match category {
        AssetCategory::Markup => markup::run(mapping),
        AssetCategory::ServerPages | AssetCategory::Fonts => copy::run(mapping),
        AssetCategory::Styles => styles::run(config, mapping),
        AssetCategory::Scripts => scripts::run(config, mapping),
        AssetCategory::Images => images::run(config, mapping),
        AssetCategory::VectorIcons => sprite::run(mapping),
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Expand the mapping's source globs into a sorted, deduplicated file list.
///
/// Only files come back; directories a `*` happens to match are dropped.
pub(crate) fn matched_sources(mapping: &PathMapping) -> Result<Vec<PathBuf>, TaskError> {
    let mut files = Vec::new();
    for pattern in &mapping.sources {
        let paths = glob::glob(pattern).map_err(|source| TaskError::Pattern {
            pattern: pattern.clone(),
            source,
        })?;
        for entry in paths {
            match entry {
                Ok(path) if path.is_file() => files.push(path),
                Ok(_) => {}
                Err(e) => {
                    let path = e.path().to_path_buf();
                    return Err(TaskError::Io {
                        path,
                        source: e.into_error(),
                    });
                }
            }
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Destination path for a source file, preserving structure below the
/// mapping's base directory.
pub(crate) fn dest_for(mapping: &PathMapping, source: &Path) -> PathBuf {
    match source.strip_prefix(&mapping.base) {
        Ok(rel) => mapping.dest.join(rel),
        Err(_) => mapping.dest.join(source.file_name().unwrap_or_default()),
    }
}

/// Write an output file, creating its parent directories first.
pub(crate) fn write_output(path: &Path, contents: impl AsRef<[u8]>) -> Result<(), TaskError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| TaskError::io(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| TaskError::io(path, e))
}

/// Log the empty-match no-op so a silent task is distinguishable from a
/// forgotten one.
pub(crate) fn log_empty(category: AssetCategory) {
    log!(category.label(); "no sources matched, nothing to do");
}

// ============================================================================
// tests
// ============================================================================
