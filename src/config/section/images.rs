//! `[images]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [images]
//! level = 4            # optimization effort, 0 (fastest) to 7 (smallest)
//! progressive = true   # emit progressive JPEGs
//! ```

use serde::{Deserialize, Serialize};

/// Image optimization settings.
///
/// `level` trades encode time for output size: it maps to JPEG quality
/// (higher level, lower quality floor) and PNG compression effort.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    /// Optimization effort, valid range 0..=7.
    pub level: u8,

    /// Emit progressive (multi-scan) JPEGs instead of baseline.
    pub progressive: bool,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            level: 4,
            progressive: true,
        }
    }
}

impl ImagesConfig {
    /// JPEG quality for the configured level: level 0 keeps quality 95,
    /// each step trades five points for smaller files (floor 60).
    pub fn jpeg_quality(&self) -> u8 {
        95u8.saturating_sub(self.level * 5).max(60)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_images_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.images.level, 4);
        assert!(config.images.progressive);
    }

    #[test]
    fn test_jpeg_quality_mapping() {
        let mut config = test_parse_config("[images]\nlevel = 0");
        assert_eq!(config.images.jpeg_quality(), 95);

        config.images.level = 4;
        assert_eq!(config.images.jpeg_quality(), 75);

        config.images.level = 7;
        assert_eq!(config.images.jpeg_quality(), 60);
    }
}
