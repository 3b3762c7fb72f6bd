//! Image task: per-codec optimization, directory structure preserved.
//!
//! JPEGs are re-encoded (optionally progressive) at a quality derived from
//! the optimization level, PNGs are re-compressed with adaptive filtering,
//! SVGs are parsed and re-serialized without indentation. Formats without
//! an optimizer here (gif, ico, webp) are copied through unchanged.

use std::fs;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use jpeg_encoder::{ColorType, Encoder};
use rayon::prelude::*;

use super::{TaskError, TaskOutcome, dest_for, log_empty, matched_sources};
use crate::config::{ImagesConfig, PipelineConfig};
use crate::{debug, log};
use crate::paths::PathMapping;
use crate::utils::fmt::plural_count;

pub(super) fn run(
    config: &PipelineConfig,
    mapping: &PathMapping,
) -> Result<TaskOutcome, TaskError> {
    let files = matched_sources(mapping)?;
    if files.is_empty() {
        log_empty(mapping.category);
        return Ok(TaskOutcome::default());
    }

    // Encoders dominate the wall time here, so files run in parallel.
    files.par_iter().try_for_each(|file| -> Result<(), TaskError> {
        let dest = dest_for(mapping, file);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| TaskError::io(parent, e))?;
        }
        optimize(file, &dest, &config.images)?;
        debug!(mapping.category.label(); "optimized {}", dest.display());
        Ok(())
    })?;

    log!(mapping.category.label(); "optimized {}", plural_count(files.len(), "image"));
    Ok(TaskOutcome {
        matched: files.len(),
        written: files.len(),
    })
}

fn optimize(source: &Path, dest: &Path, config: &ImagesConfig) -> Result<(), TaskError> {
    let ext = source
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => encode_jpeg(source, dest, config),
        "png" => encode_png(source, dest, config.level),
        "svg" => rewrite_svg(source, dest),
        _ => {
            fs::copy(source, dest).map_err(|e| TaskError::io(source, e))?;
            Ok(())
        }
    }
}

fn encode_jpeg(source: &Path, dest: &Path, config: &ImagesConfig) -> Result<(), TaskError> {
    let img = image::open(source).map_err(|e| TaskError::transform(source, e.to_string()))?;
    let rgb = img.to_rgb8();
    let width = u16::try_from(rgb.width())
        .map_err(|_| TaskError::transform(source, "image wider than 65535 pixels"))?;
    let height = u16::try_from(rgb.height())
        .map_err(|_| TaskError::transform(source, "image taller than 65535 pixels"))?;

    let mut encoder = Encoder::new_file(dest, config.jpeg_quality())
        .map_err(|e| TaskError::transform(dest, e.to_string()))?;
    encoder.set_progressive(config.progressive);
    encoder
        .encode(rgb.as_raw(), width, height, ColorType::Rgb)
        .map_err(|e| TaskError::transform(source, e.to_string()))
}

fn encode_png(source: &Path, dest: &Path, level: u8) -> Result<(), TaskError> {
    let img = image::open(source).map_err(|e| TaskError::transform(source, e.to_string()))?;
    let file = File::create(dest).map_err(|e| TaskError::io(dest, e))?;
    let encoder = PngEncoder::new_with_quality(
        BufWriter::new(file),
        png_compression(level),
        FilterType::Adaptive,
    );
    img.write_with_encoder(encoder)
        .map_err(|e| TaskError::transform(source, e.to_string()))
}

fn png_compression(level: u8) -> CompressionType {
    match level {
        0..=1 => CompressionType::Fast,
        2..=3 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}

/// Parse and re-serialize, dropping indentation and editor metadata.
/// The writer re-emits the viewBox.
fn rewrite_svg(source: &Path, dest: &Path) -> Result<(), TaskError> {
    let data = fs::read(source).map_err(|e| TaskError::io(source, e))?;
    let tree = usvg::Tree::from_data(&data, &usvg::Options::default())
        .map_err(|e| TaskError::transform(source, e.to_string()))?;
    let compact = tree.to_string(&usvg::WriteOptions {
        indent: usvg::Indent::None,
        ..usvg::WriteOptions::default()
    });
    fs::write(dest, compact).map_err(|e| TaskError::io(dest, e))
}
