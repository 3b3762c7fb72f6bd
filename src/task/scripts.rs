//! Script task: expand include directives in the JS entry, lower the syntax
//! to the configured target, then emit readable and minified bundles.

use std::fs;
use std::path::Path;

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::semantic::SemanticBuilder;
use oxc::span::SourceType;
use oxc::transformer::{TransformOptions, Transformer};

use super::{TaskError, TaskOutcome, include, log_empty, matched_sources, write_output};
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

    let text = fs::read_to_string(entry).map_err(|e| TaskError::io(entry, e))?;
    let bundled = include::expand(&text, entry)?;
    let (lowered, minified) = compile(&bundled, entry, &config.scripts.target)
        .map_err(|message| TaskError::transform(entry, message))?;

    let stem = entry.file_stem().unwrap_or_default().to_string_lossy();
    let js_path = mapping.dest.join(format!("{stem}.js"));
    let min_path = min_variant(&js_path);
    write_output(&js_path, lowered)?;
    write_output(&min_path, minified)?;

    log!(
        mapping.category.label();
        "compiled {} into {}.js and {}.min.js", entry.file_name().unwrap_or_default().to_string_lossy(), stem, stem
    );
    Ok(TaskOutcome {
        matched: 1,
        written: 2,
    })
}

/// Parse once, lower in place, then print before and after minification.
fn compile(source: &str, path: &Path, target: &str) -> Result<(String, String), String> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, source, SourceType::mjs()).parse();
    if let Some(error) = parsed.errors.first() {
        return Err(error.to_string());
    }
    let mut program = parsed.program;

    let scoping = SemanticBuilder::new()
        .build(&program)
        .semantic
        .into_scoping();
    let options = TransformOptions::from_target(target)
        .map_err(|e| format!("unsupported script target `{target}`: {e}"))?;
    let transformed =
        Transformer::new(&allocator, path, &options).build_with_scoping(scoping, &mut program);
    if let Some(error) = transformed.errors.first() {
        return Err(error.to_string());
    }

    let lowered = Codegen::new().build(&program).code;

    let minifier_return = Minifier::new(MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    })
    .minify(&allocator, &mut program);
    let minified = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(minifier_return.scoping)
        .build(&program)
        .code;

    Ok((lowered, minified))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::AssetCategory;
    use tempfile::tempdir;

    fn js_mapping(entry: &Path, dist: &Path) -> PathMapping {
        PathMapping {
            category: AssetCategory::Scripts,
            base: entry.parent().unwrap().to_path_buf(),
            sources: vec![entry.display().to_string()],
            dest: dist.to_path_buf(),
            watch: None,
        }
    }

    #[test]
    fn test_lowers_and_minifies() {
        let tmp = tempdir().unwrap();
        let entry = tmp.path().join("script.js");
        let dist = tmp.path().join("dist/js");
        fs::write(
            &entry,
            "// squared\nconst base = 3;\nconst squared = base ** 2;\nconsole.log(squared);\n",
        )
        .unwrap();

        let config = PipelineConfig::default();
        let outcome = run(&config, &js_mapping(&entry, &dist)).unwrap();

        assert_eq!(outcome.written, 2);
        let lowered = fs::read_to_string(dist.join("script.js")).unwrap();
        let minified = fs::read_to_string(dist.join("script.min.js")).unwrap();
        // `**` is past the es2015 target, so it must be rewritten
        assert!(lowered.contains("Math.pow"));
        assert!(minified.len() < lowered.len());
        assert!(!minified.contains("// squared"));
    }

    #[test]
    fn test_entry_pulls_in_partials() {
        let tmp = tempdir().unwrap();
        let entry = tmp.path().join("script.js");
        let dist = tmp.path().join("dist/js");
        fs::write(tmp.path().join("_helpers.js"), "console.log(\"from-partial\");\n").unwrap();
        fs::write(&entry, "@@include('_helpers.js')\nconsole.log(\"main\");\n").unwrap();

        let config = PipelineConfig::default();
        run(&config, &js_mapping(&entry, &dist)).unwrap();

        let lowered = fs::read_to_string(dist.join("script.js")).unwrap();
        assert!(lowered.contains("from-partial"));
        assert!(lowered.contains("main"));
    }

    #[test]
    fn test_missing_entry_is_a_noop() {
        let tmp = tempdir().unwrap();
        let entry = tmp.path().join("script.js");
        let dist = tmp.path().join("dist/js");

        let config = PipelineConfig::default();
        let outcome = run(&config, &js_mapping(&entry, &dist)).unwrap();

        assert_eq!(outcome.matched, 0);
        assert!(!dist.exists());
    }

    #[test]
    fn test_syntax_error_reports_transform_error() {
        let tmp = tempdir().unwrap();
        let entry = tmp.path().join("script.js");
        let dist = tmp.path().join("dist/js");
        fs::write(&entry, "function (").unwrap();

        let config = PipelineConfig::default();
        let err = run(&config, &js_mapping(&entry, &dist)).unwrap_err();
        assert!(matches!(err, TaskError::Transform { .. }));
    }
}
