//! Pass-through task: copy matched sources to the destination unchanged.

use std::fs;

use super::{TaskError, TaskOutcome, dest_for, log_empty, matched_sources};
use crate::log;
use crate::paths::PathMapping;
use crate::utils::fmt::plural_count;

pub(super) fn run(mapping: &PathMapping) -> Result<TaskOutcome, TaskError> {
    let files = matched_sources(mapping)?;
    if files.is_empty() {
        log_empty(mapping.category);
        return Ok(TaskOutcome::default());
    }

    let mut written = 0;
    for file in &files {
        let dest = dest_for(mapping, file);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| TaskError::io(parent, e))?;
        }
        fs::copy(file, &dest).map_err(|e| TaskError::io(file, e))?;
        written += 1;
    }

    log!(mapping.category.label(); "copied {}", plural_count(written, "file"));
    Ok(TaskOutcome {
        matched: files.len(),
        written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::AssetCategory;
    use std::path::Path;
    use tempfile::tempdir;

    fn font_mapping(src: &Path, dist: &Path) -> PathMapping {
        PathMapping {
            category: AssetCategory::Fonts,
            base: src.to_path_buf(),
            sources: vec![
                format!("{}/*.woff", src.display()),
                format!("{}/*.woff2", src.display()),
            ],
            dest: dist.to_path_buf(),
            watch: None,
        }
    }

    #[test]
    fn test_copies_matching_files_only() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("fonts");
        let dist = tmp.path().join("dist/fonts");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("a.woff"), b"wf").unwrap();
        fs::write(src.join("b.woff2"), b"wf2").unwrap();
        fs::write(src.join("readme.txt"), b"not a font").unwrap();

        let outcome = run(&font_mapping(&src, &dist)).unwrap();

        assert_eq!(outcome.written, 2);
        assert_eq!(fs::read(dist.join("a.woff")).unwrap(), b"wf");
        assert_eq!(fs::read(dist.join("b.woff2")).unwrap(), b"wf2");
        assert!(!dist.join("readme.txt").exists());
    }

    #[test]
    fn test_empty_source_is_a_noop() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("fonts");
        let dist = tmp.path().join("dist/fonts");
        fs::create_dir(&src).unwrap();

        let outcome = run(&font_mapping(&src, &dist)).unwrap();

        assert_eq!(outcome.matched, 0);
        assert!(!dist.exists());
    }
}
