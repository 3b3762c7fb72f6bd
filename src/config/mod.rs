//! Pipeline configuration management for `lathe.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── paths      # [paths]
//! │   ├── styles     # [styles]
//! │   ├── scripts    # [scripts]
//! │   ├── images     # [images]
//! │   └── serve      # [serve]
//! ├── error          # ConfigError, ConfigDiagnostics
//! └── mod.rs         # PipelineConfig (this file)
//! ```
//!
//! The config file is optional: when no `lathe.toml` is found by upward
//! search, every section falls back to its defaults and the working
//! directory becomes the project root.

pub mod section;

mod error;

pub use error::{ConfigDiagnostics, ConfigError};
pub use section::{ImagesConfig, PathsConfig, ScriptsConfig, ServeConfig, StylesConfig};

use crate::cli::{Cli, Commands};
use crate::log;
use crate::utils::path::normalize_path;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default config file name, used when `--config` is not given.
pub const DEFAULT_CONFIG_NAME: &str = "lathe.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing lathe.toml.
///
/// Loaded once at startup, finalized (CLI overrides + path normalization),
/// then passed around by shared reference. Nothing mutates it afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Absolute path to the config file, if one was found (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Project root directory - parent of config file, or cwd (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Source and output roots
    #[serde(default)]
    pub paths: PathsConfig,

    /// Stylesheet settings
    #[serde(default)]
    pub styles: StylesConfig,

    /// Script settings
    #[serde(default)]
    pub scripts: ScriptsConfig,

    /// Image optimization settings
    #[serde(default)]
    pub images: ImagesConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            config_path: None,
            root: PathBuf::new(),
            paths: PathsConfig::default(),
            styles: StylesConfig::default(),
            scripts: ScriptsConfig::default(),
            images: ImagesConfig::default(),
            serve: ServeConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file. A missing file is fine
    /// unless the user named one explicitly with `--config`. The project
    /// root is the config file's parent directory (cwd without a file).
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.root = path.parent().map(Path::to_path_buf).unwrap_or_default();
                config.config_path = Some(path);
                config
            }
            None if cli.config.as_os_str() != DEFAULT_CONFIG_NAME => {
                bail!(
                    "config file `{}` not found (searched upward from the working directory)",
                    cli.config.display()
                );
            }
            None => {
                let mut config = Self::default();
                config.root =
                    std::env::current_dir().context("failed to get current working directory")?;
                config
            }
        };

        config.finalize(cli);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields and keep going.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {field}");
        }
    }

    // ========================================================================
    // finalization
    // ========================================================================

    /// Apply CLI overrides and normalize all paths against the root.
    fn finalize(&mut self, cli: &Cli) {
        Self::update_option(&mut self.paths.source, cli.source.as_ref());
        Self::update_option(&mut self.paths.dist, cli.dist.as_ref());
        self.apply_command_options(cli);

        let root = normalize_path(&self.root);
        self.root = root.clone();
        self.paths.source = normalize_path(&root.join(&self.paths.source));
        self.paths.dist = normalize_path(&root.join(&self.paths.dist));
    }

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        if let Some(Commands::Watch {
            interface,
            port,
            watch,
        }) = &cli.command
        {
            Self::update_option(&mut self.serve.interface, interface.as_ref());
            Self::update_option(&mut self.serve.port, port.as_ref());
            Self::update_option(&mut self.serve.watch, watch.as_ref());
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate the finalized configuration.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        if !self.paths.source.is_dir() {
            diag.error_with_hint(
                "paths.source",
                format!("source directory not found: {}", self.paths.source.display()),
                "create it or point --source at the asset tree",
            );
        }

        // Clean removes the dist tree; refuse layouts where that would
        // touch the sources, or where build outputs would feed the watcher.
        if self.paths.source.starts_with(&self.paths.dist) {
            diag.error(
                "paths.dist",
                "output directory contains the source directory",
            );
        } else if self.paths.dist.starts_with(&self.paths.source) {
            diag.error(
                "paths.dist",
                "output directory is inside the source directory",
            );
        }

        if self.images.level > 7 {
            diag.error_with_hint(
                "images.level",
                format!("level {} out of range", self.images.level),
                "valid levels are 0 (fastest) through 7 (smallest)",
            );
        }

        if self.styles.entry.as_os_str().is_empty() || self.styles.entry.is_absolute() {
            diag.error("styles.entry", "entry must be a relative path");
        }
        if self.scripts.entry.as_os_str().is_empty() || self.scripts.entry.is_absolute() {
            diag.error("scripts.entry", "entry must be a relative path");
        }

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }

    // ========================================================================
    // accessors
    // ========================================================================

    /// Absolute source root.
    pub fn source_dir(&self) -> &Path {
        &self.paths.source
    }

    /// Absolute output root.
    pub fn dist_dir(&self) -> &Path {
        &self.paths.dist
    }
}

/// Find config file by searching upward from current directory
///
/// Starts from cwd and walks up parent directories until finding `config_name`
/// Returns the absolute path to the config file if found
fn find_config_file(config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let cwd = std::env::current_dir().ok()?;
    let mut current = cwd.as_path();
    loop {
        let candidate = current.join(config_name);
        if candidate.exists() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => return None, // Reached filesystem root
        }
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_parse_config`)
// ============================================================================

/// Parse config from a TOML snippet.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> PipelineConfig {
    let (parsed, ignored) = PipelineConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn validated_config(tmp: &tempfile::TempDir) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.root = tmp.path().to_path_buf();
        config.paths.source = tmp.path().join("#src");
        config.paths.dist = tmp.path().join("dist");
        fs::create_dir_all(&config.paths.source).unwrap();
        config
    }

    #[test]
    fn test_from_str_invalid_toml() {
        let result: Result<PipelineConfig, _> = toml::from_str("[paths\nsource = \"#src\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_defaults() {
        let config = PipelineConfig::default();

        assert!(config.config_path.is_none());
        assert_eq!(config.paths.source, PathBuf::from("#src"));
        assert_eq!(config.paths.dist, PathBuf::from("dist"));
        assert_eq!(config.serve.port, 3000);
        assert_eq!(config.images.level, 4);
        assert_eq!(config.scripts.target, "es2015");
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[paths]\nsource = \"#src\"\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = PipelineConfig::parse_with_ignored(content).unwrap();

        assert_eq!(config.paths.source, PathBuf::from("#src"));
        assert!(!ignored.is_empty());
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_no_unknown_fields() {
        let content = "[serve]\nport = 8080";
        let (_, ignored) = PipelineConfig::parse_with_ignored(content).unwrap();
        assert!(ignored.is_empty());
    }

    #[test]
    fn test_validate_accepts_sane_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let config = validated_config(&tmp);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_source() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = validated_config(&tmp);
        config.paths.source = tmp.path().join("nope");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_dist_inside_source() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = validated_config(&tmp);
        config.paths.dist = config.paths.source.join("dist");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_dist_over_source() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = validated_config(&tmp);
        // dist at the tree root would clean the sources away with it
        config.paths.dist = tmp.path().to_path_buf();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_image_level_out_of_range() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = validated_config(&tmp);
        config.images.level = 8;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("images.level"));
    }
}
