//! HTML pages: expand include directives, emit one output per page.
//!
//! Files whose stem starts with `_` are partials. They feed `@@include`
//! but never become pages of their own.

use std::fs;
use std::path::Path;

use super::{TaskError, TaskOutcome, dest_for, include, log_empty, matched_sources, write_output};
use crate::log;
use crate::paths::PathMapping;
use crate::utils::fmt::plural_count;

pub(super) fn run(mapping: &PathMapping) -> Result<TaskOutcome, TaskError> {
    let pages: Vec<_> = matched_sources(mapping)?
        .into_iter()
        .filter(|p| !is_partial(p))
        .collect();
    if pages.is_empty() {
        log_empty(mapping.category);
        return Ok(TaskOutcome::default());
    }

    let mut written = 0;
    for page in &pages {
        let text = fs::read_to_string(page).map_err(|e| TaskError::io(page, e))?;
        let expanded = include::expand(&text, page)?;
        write_output(&dest_for(mapping, page), expanded)?;
        written += 1;
    }

    log!(mapping.category.label(); "compiled {}", plural_count(written, "page"));
    Ok(TaskOutcome {
        matched: pages.len(),
        written,
    })
}

fn is_partial(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.starts_with('_'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::AssetCategory;
    use tempfile::tempdir;

    fn html_mapping(src: &Path, dist: &Path) -> PathMapping {
        PathMapping {
            category: AssetCategory::Markup,
            base: src.to_path_buf(),
            sources: vec![format!("{}/*.html", src.display())],
            dest: dist.to_path_buf(),
            watch: None,
        }
    }

    #[test]
    fn test_pages_expand_and_partials_stay_home() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("src");
        let dist = tmp.path().join("dist");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("index.html"), "<body>@@include('_nav.html')</body>").unwrap();
        fs::write(src.join("_nav.html"), "<nav/>").unwrap();

        let outcome = run(&html_mapping(&src, &dist)).unwrap();

        assert_eq!(outcome.written, 1);
        assert_eq!(
            fs::read_to_string(dist.join("index.html")).unwrap(),
            "<body><nav/></body>"
        );
        assert!(!dist.join("_nav.html").exists());
    }

    #[test]
    fn test_no_pages_is_a_noop() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("src");
        let dist = tmp.path().join("dist");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("_only_partial.html"), "x").unwrap();

        let outcome = run(&html_mapping(&src, &dist)).unwrap();

        assert_eq!(outcome.written, 0);
        assert!(!dist.exists());
    }

    #[test]
    fn test_missing_partial_fails_the_page() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("src");
        let dist = tmp.path().join("dist");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("index.html"), "@@include('_gone.html')").unwrap();

        assert!(run(&html_mapping(&src, &dist)).is_err());
    }
}
