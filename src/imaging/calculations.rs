//! Pure calculation functions for watermark geometry.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::{Corner, MARGIN_FRACTION, WatermarkConfig};

/// Calculate the resized watermark dimensions.
///
/// The width is `round(base_width × scale)`, never less than 1. The height
/// follows the watermark's own aspect ratio, independent of the base image.
///
/// # Examples
/// ```
/// # use batch_watermark::imaging::calculate_watermark_size;
/// // 20% of a 1000px base, 400x200 watermark → 200x100
/// assert_eq!(calculate_watermark_size(1000, (400, 200), 0.2), (200, 100));
/// ```
pub fn calculate_watermark_size(base_width: u32, watermark: (u32, u32), scale: f64) -> (u32, u32) {
    let (wm_w, wm_h) = watermark;
    let width = ((base_width as f64 * scale).round() as u32).max(1);
    let height = (wm_h as f64 * (width as f64 / wm_w.max(1) as f64)).round() as u32;
    (width, height.max(1))
}

/// Margin between the anchor corner and the watermark, in pixels.
///
/// Derived from the base width only, and applied to both axes.
pub fn calculate_margin(base_width: u32) -> u32 {
    (base_width as f64 * MARGIN_FRACTION).round() as u32
}

/// Top-left offset of the watermark for the given corner.
///
/// Offsets are signed: a watermark larger than the base yields a negative
/// coordinate on the right/bottom anchors, and the overhang is clipped.
pub fn calculate_offset(
    base: (u32, u32),
    watermark: (u32, u32),
    margin: u32,
    corner: Corner,
) -> (i64, i64) {
    let (base_w, base_h) = (base.0 as i64, base.1 as i64);
    let (wm_w, wm_h) = (watermark.0 as i64, watermark.1 as i64);
    let m = margin as i64;

    let right = base_w - wm_w - m;
    let bottom = base_h - wm_h - m;

    match corner {
        Corner::TopLeft => (m, m),
        Corner::TopRight => (right, m),
        Corner::BottomLeft => (m, bottom),
        Corner::BottomRight => (right, bottom),
    }
}

/// Where and how large the watermark lands on a particular base image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
    pub margin: u32,
    pub base_width: u32,
    pub base_height: u32,
}

impl Layout {
    /// True when part of the watermark falls outside the base image.
    ///
    /// Not an error: callers use this to warn that the output is cropped.
    pub fn is_clipped(&self) -> bool {
        self.x < 0
            || self.y < 0
            || self.x + self.width as i64 > self.base_width as i64
            || self.y + self.height as i64 > self.base_height as i64
    }
}

/// Combine size, margin and corner offset into a [`Layout`].
pub fn calculate_layout(
    base: (u32, u32),
    watermark: (u32, u32),
    config: &WatermarkConfig,
) -> Layout {
    let (width, height) = calculate_watermark_size(base.0, watermark, config.scale());
    let margin = calculate_margin(base.0);
    let (x, y) = calculate_offset(base, (width, height), margin, config.corner());
    Layout {
        x,
        y,
        width,
        height,
        margin,
        base_width: base.0,
        base_height: base.1,
    }
}

/// Shrink `source` to fit inside `bounds`, preserving aspect ratio.
///
/// Images already inside the bounds are returned unchanged (never enlarged).
pub fn calculate_fit_dimensions(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bounds;

    if src_w <= max_w && src_h <= max_h {
        return source;
    }

    let ratio = (max_w as f64 / src_w as f64).min(max_h as f64 / src_h as f64);
    let w = ((src_w as f64 * ratio).round() as u32).clamp(1, max_w.max(1));
    let h = ((src_h as f64 * ratio).round() as u32).clamp(1, max_h.max(1));
    (w, h)
}
