//! Stylesheet task: compile the SCSS entry, prefix for the configured
//! browsers, and emit expanded plus minified CSS side by side.

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};

use super::{TaskError, TaskOutcome, log_empty, matched_sources, write_output};
use crate::config::PipelineConfig;
use crate::log;
use crate::paths::PathMapping;
use crate::utils::path::min_variant;

pub(super) fn run(
    config: &PipelineConfig,
    mapping: &PathMapping,
) -> Result<TaskOutcome, TaskError> {
    let sources = matched_sources(mapping)?;
    let Some(entry) = sources.first() else {
        log_empty(mapping.category);
        return Ok(TaskOutcome::default());
    };

    let css = grass::from_path(
        entry,
        &grass::Options::default().style(grass::OutputStyle::Expanded),
    )
    .map_err(|e| TaskError::transform(entry, e.to_string()))?;

    let browsers = Browsers::from_browserslist(config.styles.browsers.iter().map(String::as_str))
        .map_err(|e| TaskError::transform(entry, format!("invalid browser list: {e}")))?;
    let targets = Targets {
        browsers,
        ..Targets::default()
    };

    let mut stylesheet = StyleSheet::parse(&css, ParserOptions::default())
        .map_err(|e| TaskError::transform(entry, e.to_string()))?;
    // Prefixing happens here; both printers below see the prefixed tree.
    stylesheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|e| TaskError::transform(entry, e.to_string()))?;

    let expanded = stylesheet
        .to_css(PrinterOptions {
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| TaskError::transform(entry, e.to_string()))?
        .code;
    let minified = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| TaskError::transform(entry, e.to_string()))?
        .code;

    let stem = entry.file_stem().unwrap_or_default().to_string_lossy();
    let css_path = mapping.dest.join(format!("{stem}.css"));
    let min_path = min_variant(&css_path);
    write_output(&css_path, expanded)?;
    write_output(&min_path, minified)?;

    log!(
        mapping.category.label();
        "compiled {} into {}.css and {}.min.css", entry.file_name().unwrap_or_default().to_string_lossy(), stem, stem
    );
    Ok(TaskOutcome {
        matched: 1,
        written: 2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::AssetCategory;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn scss_mapping(entry: &Path, dist: &Path) -> PathMapping {
        PathMapping {
            category: AssetCategory::Styles,
            base: entry.parent().unwrap().to_path_buf(),
            sources: vec![entry.display().to_string()],
            dest: dist.to_path_buf(),
            watch: None,
        }
    }

    #[test]
    fn test_compiles_both_variants() {
        let tmp = tempdir().unwrap();
        let entry = tmp.path().join("style.scss");
        let dist = tmp.path().join("dist/css");
        fs::write(
            &entry,
            "$accent: #336699;\nbody {\n  color: $accent;\n  a { color: red; }\n}\n",
        )
        .unwrap();

        let config = PipelineConfig::default();
        let outcome = run(&config, &scss_mapping(&entry, &dist)).unwrap();

        assert_eq!(outcome.written, 2);
        let expanded = fs::read_to_string(dist.join("style.css")).unwrap();
        let minified = fs::read_to_string(dist.join("style.min.css")).unwrap();
        // Nesting resolved by the compiler, not passed through
        assert!(expanded.contains("body"));
        assert!(!expanded.contains("$accent"));
        assert!(minified.len() < expanded.len());
    }

    #[test]
    fn test_missing_entry_is_a_noop() {
        let tmp = tempdir().unwrap();
        let entry = tmp.path().join("style.scss");
        let dist = tmp.path().join("dist/css");

        let config = PipelineConfig::default();
        let outcome = run(&config, &scss_mapping(&entry, &dist)).unwrap();

        assert_eq!(outcome.matched, 0);
        assert!(!dist.exists());
    }

    #[test]
    fn test_invalid_scss_reports_transform_error() {
        let tmp = tempdir().unwrap();
        let entry = tmp.path().join("style.scss");
        let dist = tmp.path().join("dist/css");
        fs::write(&entry, "body { color: }").unwrap();

        let config = PipelineConfig::default();
        let err = run(&config, &scss_mapping(&entry, &dist)).unwrap_err();
        assert!(matches!(err, TaskError::Transform { .. }));
    }
}
