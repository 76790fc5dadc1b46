//! Single-image preview.
//!
//! The preview shows what the batch will produce, on the first source image,
//! shrunk to fit a display box. The watermark is sized relative to the shrunk
//! image with the same compositor the batch uses, so proportions, margin and
//! corner match the exported files.

use crate::imaging::{
    BackendError, ImageBackend, RustBackend, WatermarkConfig, calculate_fit_dimensions, composite,
};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum PreviewError {
    #[error("No source images to preview")]
    NoSources,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Render a preview with the production backend.
pub fn render_preview(
    sources: &[PathBuf],
    watermark: &Path,
    config: &WatermarkConfig,
    max_size: (u32, u32),
) -> Result<DynamicImage, PreviewError> {
    render_preview_with_backend(&RustBackend::new(), sources, watermark, config, max_size)
}

/// Render a preview using a specific backend (allows testing with mock).
pub fn render_preview_with_backend(
    backend: &impl ImageBackend,
    sources: &[PathBuf],
    watermark: &Path,
    config: &WatermarkConfig,
    max_size: (u32, u32),
) -> Result<DynamicImage, PreviewError> {
    let first = sources.first().ok_or(PreviewError::NoSources)?;
    let watermark = backend.load(watermark)?;
    let base = fit_to_box(backend.load(first)?, max_size);
    debug!(
        source = %first.display(),
        width = base.width(),
        height = base.height(),
        "rendering preview"
    );
    Ok(composite(&base, &watermark, config))
}

/// Shrink (never enlarge) to fit `max_size` with Lanczos3.
fn fit_to_box(image: DynamicImage, max_size: (u32, u32)) -> DynamicImage {
    let current = image.dimensions();
    let (w, h) = calculate_fit_dimensions(current, max_size);
    if (w, h) == current {
        image
    } else {
        image.resize_exact(w, h, FilterType::Lanczos3)
    }
}
