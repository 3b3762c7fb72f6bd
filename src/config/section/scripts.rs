//! `[scripts]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [scripts]
//! entry = "js/script.js"   # entry point, relative to source root
//! target = "es2015"        # syntax floor for the emitted bundle
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Script bundling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptsConfig {
    /// JS entry file, relative to the source root. `@@include` directives
    /// inside it are resolved before compilation.
    pub entry: PathBuf,

    /// ECMAScript target the emitted code is lowered to (e.g. "es2015",
    /// "es2018", "es2020").
    pub target: String,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            entry: PathBuf::from("js/script.js"),
            target: "es2015".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;
    use std::path::Path;

    #[test]
    fn test_scripts_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.scripts.entry, Path::new("js/script.js"));
        assert_eq!(config.scripts.target, "es2015");
    }

    #[test]
    fn test_scripts_target_override() {
        let config = test_parse_config("[scripts]\ntarget = \"es2020\"");
        assert_eq!(config.scripts.target, "es2020");
    }
}
