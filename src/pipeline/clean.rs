//! Destination tree removal.

use std::fs;
use std::io;

use crate::config::PipelineConfig;
use crate::debug;

/// Remove the destination tree. Idempotent: an absent tree is success, so
/// repeated cleans and first runs behave the same.
pub fn remove_dist(config: &PipelineConfig) -> io::Result<()> {
    let dist = config.dist_dir();
    match fs::remove_dir_all(dist) {
        Ok(()) => {
            debug!("clean"; "removed {}", dist.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;

    fn config_with_dist(root: &Path) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.root = root.to_path_buf();
        config.paths.dist = root.join("dist");
        config
    }

    #[test]
    fn test_clean_is_idempotent() {
        let tmp = tempdir().unwrap();
        let config = config_with_dist(tmp.path());
        fs::create_dir_all(tmp.path().join("dist/css")).unwrap();
        fs::write(tmp.path().join("dist/css/stale.css"), "x").unwrap();

        remove_dist(&config).unwrap();
        assert!(!tmp.path().join("dist").exists());

        // Second invocation finds nothing and still succeeds
        remove_dist(&config).unwrap();
        assert!(!tmp.path().join("dist").exists());
    }
}
