//! `@@include('partial.html')` directive expansion.
//!
//! Directives resolve relative to the file that contains them, and included
//! partials may include further partials. A depth cap guards against include
//! cycles. The parameterized form `@@include('a.html', {...})` is not
//! interpreted; it passes through untouched so the output makes the problem
//! visible instead of silently dropping content.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use thiserror::Error;

/// Includes nested deeper than this are treated as a cycle.
const MAX_DEPTH: usize = 16;

// Single-argument form only. Quote style may be single or double, but the
// regex crate has no backreferences, so each style gets its own branch.
static INCLUDE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@@include\(\s*(?:'([^']*)'|"([^"]*)")\s*\)"#).expect("include pattern")
});

#[derive(Debug, Error)]
pub enum IncludeError {
    #[error("{}: included file `{}` not found", from.display(), target.display())]
    Missing { from: PathBuf, target: PathBuf },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: includes nested deeper than {MAX_DEPTH} levels (include cycle?)", path.display())]
    TooDeep { path: PathBuf },
}

/// Expand every include directive in `source`, recursively.
///
/// `from` is the file the text was read from; relative include targets
/// resolve against its parent directory.
pub fn expand(source: &str, from: &Path) -> Result<String, IncludeError> {
    expand_at(source, from, 0)
}

fn expand_at(source: &str, from: &Path, depth: usize) -> Result<String, IncludeError> {
    if depth > MAX_DEPTH {
        return Err(IncludeError::TooDeep {
            path: from.to_path_buf(),
        });
    }
    // Most files have no directives at all; skip the rebuild entirely.
    if !INCLUDE_RE.is_match(source) {
        return Ok(source.to_owned());
    }

    let base = from.parent().unwrap_or_else(|| Path::new("."));
    let mut failure = None;
    let expanded = INCLUDE_RE.replace_all(source, |caps: &Captures| {
        if failure.is_some() {
            return String::new();
        }
        let target = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();
        let path = base.join(target);
        match read_partial(&path, from) {
            Ok(text) => match expand_at(&text, &path, depth + 1) {
                Ok(nested) => nested,
                Err(e) => {
                    failure = Some(e);
                    String::new()
                }
            },
            Err(e) => {
                failure = Some(e);
                String::new()
            }
        }
    });

    match failure {
        Some(e) => Err(e),
        None => Ok(expanded.into_owned()),
    }
}

fn read_partial(path: &Path, from: &Path) -> Result<String, IncludeError> {
    if !path.is_file() {
        return Err(IncludeError::Missing {
            from: from.to_path_buf(),
            target: path.to_path_buf(),
        });
    }
    fs::read_to_string(path).map_err(|source| IncludeError::Io {
        path: path.to_path_buf(),
        source,
    })
}
