//! Watch bindings: compiled glob patterns routing changed paths to tasks.

use std::path::Path;

use crate::paths::{AssetCategory, PathTable};
use crate::task::TaskError;

/// Lookup table from watch patterns to the categories they re-run.
pub struct WatchBindings {
    bindings: Vec<(AssetCategory, Vec<glob::Pattern>)>,
}

impl WatchBindings {
    pub fn new(table: &PathTable) -> Result<Self, TaskError> {
        let mut bindings = Vec::new();
        for mapping in table.mappings() {
            let Some(patterns) = &mapping.watch else {
                continue;
            };
            let compiled = patterns
                .iter()
                .map(|pattern| {
                    glob::Pattern::new(pattern).map_err(|source| TaskError::Pattern {
                        pattern: pattern.clone(),
                        source,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            bindings.push((mapping.category, compiled));
        }
        Ok(Self { bindings })
    }

    /// Every category whose watch pattern matches the path, in stable
    /// category order. Overlapping patterns yield several categories, one
    /// icon edit re-runs both the image and the sprite task.
    pub fn categories_for(&self, path: &Path) -> Vec<AssetCategory> {
        self.bindings
            .iter()
            .filter(|(_, patterns)| patterns.iter().any(|p| p.matches_path(path)))
            .map(|(category, _)| *category)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use std::path::PathBuf;

    fn bindings() -> WatchBindings {
        let mut config = PipelineConfig::default();
        config.root = PathBuf::from("/project");
        config.paths.source = PathBuf::from("/project/#src");
        config.paths.dist = PathBuf::from("/project/dist");
        WatchBindings::new(&PathTable::new(&config)).unwrap()
    }

    #[test]
    fn test_markup_partial_routes_to_markup() {
        let bindings = bindings();
        assert_eq!(
            bindings.categories_for(Path::new("/project/#src/parts/_nav.html")),
            vec![AssetCategory::Markup]
        );
    }

    #[test]
    fn test_scss_partial_routes_to_styles() {
        let bindings = bindings();
        assert_eq!(
            bindings.categories_for(Path::new("/project/#src/scss/components/_button.scss")),
            vec![AssetCategory::Styles]
        );
    }

    #[test]
    fn test_icon_routes_to_images_and_sprite() {
        let bindings = bindings();
        assert_eq!(
            bindings.categories_for(Path::new("/project/#src/img/svg/arrow.svg")),
            vec![AssetCategory::Images, AssetCategory::VectorIcons]
        );
    }

    #[test]
    fn test_plain_image_routes_to_images_only() {
        let bindings = bindings();
        assert_eq!(
            bindings.categories_for(Path::new("/project/#src/img/hero.png")),
            vec![AssetCategory::Images]
        );
    }

    #[test]
    fn test_fonts_and_outputs_route_nowhere() {
        let bindings = bindings();
        assert!(
            bindings
                .categories_for(Path::new("/project/#src/fonts/body.woff2"))
                .is_empty()
        );
        assert!(
            bindings
                .categories_for(Path::new("/project/dist/css/style.css"))
                .is_empty()
        );
    }
}
