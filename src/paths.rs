//! The path table: where each asset category reads from, writes to, and
//! which changes re-trigger it.
//!
//! Built once from the finalized configuration and passed around by
//! reference. All patterns and directories in it are absolute.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::PipelineConfig;

/// Raster and vector formats the images task picks up.
pub const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "svg", "ico", "gif", "webp"];

/// Web font formats the fonts task copies.
pub const FONT_EXTENSIONS: [&str; 2] = ["woff", "woff2"];

/// File name of the stacked icon sprite.
pub const SPRITE_FILE_NAME: &str = "sprite.svg";

// ============================================================================
// AssetCategory
// ============================================================================

/// The seven kinds of assets the pipeline moves.
///
/// Declaration order is the stable order used for scheduling and for
/// deduplicated watch invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetCategory {
    /// Top-level HTML pages with `@@include` expansion
    Markup,
    /// Top-level PHP files, copied verbatim
    ServerPages,
    /// SCSS entry compiled to css + min.css
    Styles,
    /// JS entry bundled to js + min.js
    Scripts,
    /// Raster/vector images, re-encoded per codec
    Images,
    /// SVG icons stacked into one sprite
    VectorIcons,
    /// Web fonts, copied verbatim
    Fonts,
}

impl AssetCategory {
    /// Every category, in stable order.
    pub const ALL: [Self; 7] = [
        Self::Markup,
        Self::ServerPages,
        Self::Styles,
        Self::Scripts,
        Self::Images,
        Self::VectorIcons,
        Self::Fonts,
    ];

    /// Short label used in log prefixes.
    pub fn label(self) -> &'static str {
        match self {
            Self::Markup => "html",
            Self::ServerPages => "php",
            Self::Styles => "css",
            Self::Scripts => "js",
            Self::Images => "img",
            Self::VectorIcons => "sprite",
            Self::Fonts => "fonts",
        }
    }

    /// Whether a completed run of this category should refresh connected
    /// browsers in watch mode.
    pub fn notifies_reload(self) -> bool {
        matches!(
            self,
            Self::Markup | Self::Styles | Self::Scripts | Self::Images
        )
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// PathMapping
// ============================================================================

/// Source selection and destination for one asset category.
#[derive(Debug, Clone)]
pub struct PathMapping {
    pub category: AssetCategory,

    /// Directory the source patterns are rooted at. Relative structure
    /// below it is preserved under `dest`.
    pub base: PathBuf,

    /// Glob patterns selecting the sources. Brace alternation is not part
    /// of the pattern language, so `*.{jpg,png}` becomes one entry per
    /// extension. Entry-file categories carry the literal file path.
    pub sources: Vec<String>,

    /// Directory outputs are written under.
    pub dest: PathBuf,

    /// Glob patterns whose changes re-run this category in watch mode.
    /// `None` = not watched.
    pub watch: Option<Vec<String>>,
}

// ============================================================================
// PathTable
// ============================================================================

/// Immutable table with one [`PathMapping`] per category.
#[derive(Debug, Clone)]
pub struct PathTable {
    mappings: Vec<PathMapping>,
}

impl PathTable {
    /// Derive the full table from the finalized configuration.
    pub fn new(config: &PipelineConfig) -> Self {
        let src = config.source_dir();
        let dist = config.dist_dir();

        let images_sources: Vec<String> = IMAGE_EXTENSIONS
            .iter()
            .map(|ext| pattern(src, &format!("img/**/*.{ext}")))
            .collect();
        // A change anywhere under img/ re-runs both the images task and the
        // sprite task, so the sprite stays in sync with icon edits.
        let images_watch = Some(images_sources.clone());

        let styles_entry = src.join(&config.styles.entry);
        let scripts_entry = src.join(&config.scripts.entry);

        let mappings = vec![
            PathMapping {
                category: AssetCategory::Markup,
                base: src.to_path_buf(),
                sources: vec![pattern(src, "*.html")],
                dest: dist.to_path_buf(),
                watch: Some(vec![pattern(src, "**/*.html")]),
            },
            PathMapping {
                category: AssetCategory::ServerPages,
                base: src.to_path_buf(),
                sources: vec![pattern(src, "*.php")],
                dest: dist.to_path_buf(),
                watch: Some(vec![pattern(src, "**/*.php")]),
            },
            PathMapping {
                category: AssetCategory::Styles,
                base: styles_entry
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| src.to_path_buf()),
                sources: vec![styles_entry.display().to_string()],
                dest: dist.join("css"),
                watch: Some(vec![entry_watch(src, &config.styles.entry, "scss")]),
            },
            PathMapping {
                category: AssetCategory::Scripts,
                base: scripts_entry
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| src.to_path_buf()),
                sources: vec![scripts_entry.display().to_string()],
                dest: dist.join("js"),
                watch: Some(vec![entry_watch(src, &config.scripts.entry, "js")]),
            },
            PathMapping {
                category: AssetCategory::Images,
                base: src.join("img"),
                sources: images_sources,
                dest: dist.join("img"),
                watch: images_watch.clone(),
            },
            PathMapping {
                category: AssetCategory::VectorIcons,
                base: src.join("img/svg"),
                sources: vec![pattern(src, "img/svg/**/*.svg")],
                dest: dist.join("img"),
                watch: images_watch,
            },
            PathMapping {
                category: AssetCategory::Fonts,
                base: src.join("fonts"),
                sources: FONT_EXTENSIONS
                    .iter()
                    .map(|ext| pattern(src, &format!("fonts/*.{ext}")))
                    .collect(),
                dest: dist.join("fonts"),
                watch: None,
            },
        ];

        Self { mappings }
    }

    /// Mapping for a category. `None` cannot happen for a table built by
    /// [`PathTable::new`], callers treat it as a configuration defect.
    pub fn mapping(&self, category: AssetCategory) -> Option<&PathMapping> {
        self.mappings.iter().find(|m| m.category == category)
    }

    /// All mappings in stable category order.
    pub fn mappings(&self) -> &[PathMapping] {
        &self.mappings
    }
}

/// Join a glob pattern onto a directory.
fn pattern(dir: &Path, tail: &str) -> String {
    format!("{}/{}", dir.display(), tail)
}

/// Watch pattern for an entry-file category: every file with the entry's
/// extension under the entry's directory (or the whole source tree when
/// the entry sits at the root).
fn entry_watch(src: &Path, entry: &Path, default_ext: &str) -> String {
    let ext = entry
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or(default_ext);
    match entry.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            pattern(&src.join(parent), &format!("**/*.{ext}"))
        }
        _ => pattern(src, &format!("**/*.{ext}")),
    }
}

// ============================================================================
// tests
// ============================================================================
