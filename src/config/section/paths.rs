//! `[paths]` section configuration.
//!
//! The two directory roots everything else hangs off.
//!
//! # Example
//!
//! ```toml
//! [paths]
//! source = "#src"   # where the authored assets live
//! dist = "dist"     # where the built site is written
//! ```
//!
//! Both are resolved relative to the config file's directory (or the
//! working directory when no config file exists).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Source and output roots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory the source globs are rooted at.
    pub source: PathBuf,

    /// Directory the built assets are written to. Removed by the clean step.
    pub dist: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("#src"),
            dist: PathBuf::from("dist"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;
    use std::path::Path;

    #[test]
    fn test_paths_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.paths.source, Path::new("#src"));
        assert_eq!(config.paths.dist, Path::new("dist"));
    }

    #[test]
    fn test_paths_override() {
        let config = test_parse_config("[paths]\nsource = \"site\"\ndist = \"public\"");
        assert_eq!(config.paths.source, Path::new("site"));
        assert_eq!(config.paths.dist, Path::new("public"));
    }
}
