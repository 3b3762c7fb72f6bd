//! `[styles]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [styles]
//! entry = "scss/style.scss"        # compiled entry point, relative to source root
//! browsers = ["last 5 versions"]   # browserslist range for vendor prefixes
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Stylesheet compilation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StylesConfig {
    /// SCSS entry file, relative to the source root. Partials it imports
    /// are resolved by the compiler from the entry's directory.
    pub entry: PathBuf,

    /// Browserslist queries driving vendor prefixing for both outputs.
    pub browsers: Vec<String>,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            entry: PathBuf::from("scss/style.scss"),
            browsers: vec!["last 5 versions".into()],
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;
    use std::path::Path;

    #[test]
    fn test_styles_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.styles.entry, Path::new("scss/style.scss"));
        assert_eq!(config.styles.browsers, vec!["last 5 versions"]);
    }

    #[test]
    fn test_styles_browsers_list() {
        let config =
            test_parse_config("[styles]\nbrowsers = [\"defaults\", \"not ie 11\"]");
        assert_eq!(config.styles.browsers, vec!["defaults", "not ie 11"]);
    }
}
