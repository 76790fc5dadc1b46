//! Watermark compositing.
//!
//! [`composite`] is a pure function: it borrows the base and the watermark,
//! never mutates either, and returns a new image with the base's dimensions
//! and color type. The same routine serves the preview and every batch item,
//! so a watermark loaded once can be shared read-only across a whole batch.
//!
//! ## Steps
//!
//! 1. Size the watermark from the base width ([`calculate_layout`])
//! 2. Resize it with Lanczos3 into a fresh RGBA buffer, with color
//!    premultiplied by alpha so transparent pixels don't bleed into the edges
//! 3. Scale its alpha by `opacity / 255` (truncating)
//! 4. Blend it onto an RGBA copy of the base at the corner offset, clipping
//!    whatever falls outside
//! 5. Convert back to the base's original color type

use super::calculations::{Layout, calculate_layout};
use super::params::WatermarkConfig;
use image::imageops::{self, FilterType};
use image::{ColorType, DynamicImage, GenericImageView, Rgba32FImage, RgbaImage};
use tracing::{debug, warn};

/// Composite `watermark` onto `base` according to `config`.
pub fn composite(
    base: &DynamicImage,
    watermark: &DynamicImage,
    config: &WatermarkConfig,
) -> DynamicImage {
    composite_with_layout(base, watermark, config).0
}

/// Like [`composite`], also returning the computed [`Layout`].
///
/// Callers inspect [`Layout::is_clipped`] to tell the user the watermark
/// did not fit.
pub fn composite_with_layout(
    base: &DynamicImage,
    watermark: &DynamicImage,
    config: &WatermarkConfig,
) -> (DynamicImage, Layout) {
    let layout = calculate_layout(base.dimensions(), watermark.dimensions(), config);
    debug!(
        width = layout.width,
        height = layout.height,
        x = layout.x,
        y = layout.y,
        corner = %config.corner(),
        "watermark layout"
    );
    if layout.is_clipped() {
        warn!(
            base_width = layout.base_width,
            base_height = layout.base_height,
            width = layout.width,
            height = layout.height,
            "watermark exceeds base image bounds; output will be clipped"
        );
    }

    let overlay = prepare_watermark(watermark, &layout, config.opacity());

    let mut canvas = base.to_rgba8();
    blend_onto(&mut canvas, &overlay, layout.x, layout.y);

    (restore_color_type(canvas, base.color()), layout)
}

/// Resize into a new RGBA buffer and apply opacity. The source is untouched.
///
/// Watermarks without an alpha channel come out of `to_rgba32f` fully opaque.
fn prepare_watermark(watermark: &DynamicImage, layout: &Layout, opacity: u8) -> RgbaImage {
    let mut resized = resize_premultiplied(watermark, layout.width, layout.height);
    if opacity < u8::MAX {
        apply_opacity(&mut resized, opacity);
    }
    resized
}

/// Lanczos3 resize in premultiplied float space.
///
/// Resampling straight RGBA mixes the color of fully transparent pixels into
/// their visible neighbours, which shows up as a dark fringe around a logo.
fn resize_premultiplied(watermark: &DynamicImage, width: u32, height: u32) -> RgbaImage {
    let mut premultiplied: Rgba32FImage = watermark.to_rgba32f();
    for pixel in premultiplied.pixels_mut() {
        let alpha = pixel[3];
        for c in 0..3 {
            pixel[c] *= alpha;
        }
    }

    let mut resized = imageops::resize(&premultiplied, width, height, FilterType::Lanczos3);
    for pixel in resized.pixels_mut() {
        let alpha = pixel[3].clamp(0.0, 1.0);
        pixel[3] = alpha;
        for c in 0..3 {
            pixel[c] = if alpha > 0.0 {
                (pixel[c] / alpha).clamp(0.0, 1.0)
            } else {
                0.0
            };
        }
    }
    DynamicImage::ImageRgba32F(resized).to_rgba8()
}

/// Multiply every alpha sample by `opacity / 255`, truncating.
pub fn apply_opacity(image: &mut RgbaImage, opacity: u8) {
    let factor = opacity as u32;
    for pixel in image.pixels_mut() {
        pixel[3] = (pixel[3] as u32 * factor / 255) as u8;
    }
}

/// Alpha-blend `overlay` onto `canvas` with its top-left corner at `(x, y)`.
///
/// The overlay's alpha is the blend mask. Color channels are mixed as
/// `(fg·a + bg·(255−a)) / 255`, rounded; the canvas alpha is composited
/// "over". A zero-alpha pixel leaves the canvas byte-for-byte unchanged,
/// a full-alpha pixel replaces it. Overlay pixels outside the canvas are
/// skipped.
pub fn blend_onto(canvas: &mut RgbaImage, overlay: &RgbaImage, x: i64, y: i64) {
    let (canvas_w, canvas_h) = (canvas.width() as i64, canvas.height() as i64);
    let (overlay_w, overlay_h) = (overlay.width() as i64, overlay.height() as i64);

    // Visible range in overlay coordinates
    let start_x = (-x).clamp(0, overlay_w);
    let start_y = (-y).clamp(0, overlay_h);
    let end_x = (canvas_w - x).clamp(0, overlay_w);
    let end_y = (canvas_h - y).clamp(0, overlay_h);

    for oy in start_y..end_y {
        for ox in start_x..end_x {
            let fg = overlay.get_pixel(ox as u32, oy as u32);
            let alpha = fg[3] as u32;
            if alpha == 0 {
                continue;
            }
            let bg = canvas.get_pixel_mut((x + ox) as u32, (y + oy) as u32);
            let inverse = 255 - alpha;
            for c in 0..3 {
                bg[c] = ((fg[c] as u32 * alpha + bg[c] as u32 * inverse + 127) / 255) as u8;
            }
            bg[3] = (alpha + (bg[3] as u32 * inverse + 127) / 255) as u8;
        }
    }
}

/// Convert the RGBA working canvas back to the base's color type.
///
/// Bases without alpha lose the blending channel here; 16-bit and float
/// bases are widened back from the 8-bit canvas.
fn restore_color_type(canvas: RgbaImage, color: ColorType) -> DynamicImage {
    let rgba = DynamicImage::ImageRgba8(canvas);
    match color {
        ColorType::L8 => DynamicImage::ImageLuma8(rgba.to_luma8()),
        ColorType::La8 => DynamicImage::ImageLumaA8(rgba.to_luma_alpha8()),
        ColorType::Rgb8 => DynamicImage::ImageRgb8(rgba.to_rgb8()),
        ColorType::L16 => DynamicImage::ImageLuma16(rgba.to_luma16()),
        ColorType::La16 => DynamicImage::ImageLumaA16(rgba.to_luma_alpha16()),
        ColorType::Rgb16 => DynamicImage::ImageRgb16(rgba.to_rgb16()),
        ColorType::Rgba16 => DynamicImage::ImageRgba16(rgba.to_rgba16()),
        ColorType::Rgb32F => DynamicImage::ImageRgb32F(rgba.to_rgb32f()),
        ColorType::Rgba32F => DynamicImage::ImageRgba32F(rgba.to_rgba32f()),
        _ => rgba,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::Corner;
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba};

    fn gradient_base(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 90])
        }))
    }

    fn solid_watermark(width: u32, height: u32, color: Rgba<u8>) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, color))
    }

    fn differing_pixels(a: &DynamicImage, b: &DynamicImage) -> Vec<(u32, u32)> {
        let (a, b) = (a.to_rgba8(), b.to_rgba8());
        a.enumerate_pixels()
            .filter(|(x, y, p)| b.get_pixel(*x, *y) != *p)
            .map(|(x, y, _)| (x, y))
            .collect()
    }

    // =========================================================================
    // Output shape
    // =========================================================================

    #[test]
    fn output_keeps_base_dimensions_and_color_type() {
        let base = gradient_base(320, 200);
        let wm = solid_watermark(50, 25, Rgba([255, 0, 0, 200]));
        let out = composite(&base, &wm, &WatermarkConfig::default());
        assert_eq!(out.dimensions(), (320, 200));
        assert_eq!(out.color(), ColorType::Rgb8);
    }

    #[test]
    fn rgba_base_keeps_alpha_channel() {
        let base = DynamicImage::ImageRgba8(RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 0])));
        let wm = solid_watermark(10, 10, Rgba([255, 255, 255, 255]));
        let config = WatermarkConfig::new(0.2, 255, Corner::TopLeft);
        let out = composite(&base, &wm, &config);
        assert_eq!(out.color(), ColorType::Rgba8);
        let rgba = out.to_rgba8();
        // Outside the watermark stays fully transparent
        assert_eq!(rgba.get_pixel(99, 99), &Rgba([0, 0, 0, 0]));
        // Inside is opaque white
        assert_eq!(rgba.get_pixel(5, 5), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn grayscale_base_stays_grayscale() {
        let base = DynamicImage::ImageLuma8(GrayImage::from_pixel(200, 100, Luma([40])));
        let wm = solid_watermark(10, 10, Rgba([255, 255, 255, 255]));
        let out = composite(&base, &wm, &WatermarkConfig::default());
        assert_eq!(out.color(), ColorType::L8);
        assert_eq!(out.dimensions(), (200, 100));
    }

    #[test]
    fn composited_watermark_width_matches_scale() {
        // Opaque white watermark on a black base: count white columns in one row
        let base = DynamicImage::ImageRgb8(RgbImage::from_pixel(1000, 800, Rgb([0, 0, 0])));
        let wm = solid_watermark(200, 100, Rgba([255, 255, 255, 255]));
        for scale in [0.1, 0.25, 0.37] {
            let config = WatermarkConfig::new(scale, 255, Corner::TopLeft);
            let (out, layout) = composite_with_layout(&base, &wm, &config);
            let row = layout.y as u32 + layout.height / 2;
            let rgb = out.to_rgb8();
            let covered = (0..1000)
                .filter(|&x| rgb.get_pixel(x, row)[0] > 127)
                .count() as i64;
            let expected = (1000.0 * scale).round() as i64;
            assert!(
                (covered - expected).abs() <= 1,
                "scale {scale}: covered {covered}, expected {expected}"
            );
        }
    }

    // =========================================================================
    // Opacity
    // =========================================================================

    #[test]
    fn zero_opacity_is_pixel_identical_to_base() {
        let base = gradient_base(300, 200);
        let wm = solid_watermark(40, 40, Rgba([255, 0, 0, 255]));
        let config = WatermarkConfig::new(0.3, 0, Corner::BottomRight);
        let out = composite(&base, &wm, &config);
        assert_eq!(out.to_rgb8(), base.to_rgb8());
    }

    #[test]
    fn full_opacity_matches_alpha_masked_paste() {
        // A watermark already at target size: left half opaque red, right half transparent
        let wm = DynamicImage::ImageRgba8(RgbaImage::from_fn(20, 10, |x, _| {
            if x < 10 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 0])
            }
        }));
        let base = gradient_base(200, 100);
        let config = WatermarkConfig::new(0.1, 255, Corner::TopLeft);
        let (out, layout) = composite_with_layout(&base, &wm, &config);
        assert_eq!((layout.width, layout.height), (20, 10));

        let (out, base) = (out.to_rgb8(), base.to_rgb8());
        let m = layout.margin;
        for y in m..m + 10 {
            for x in m..m + 20 {
                if x < m + 10 {
                    assert_eq!(out.get_pixel(x, y), &Rgb([255, 0, 0]), "({x}, {y})");
                } else {
                    assert_eq!(out.get_pixel(x, y), base.get_pixel(x, y), "({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn full_opacity_keeps_partial_source_alpha() {
        let base = DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 100, Rgb([0, 0, 200])));
        let wm = solid_watermark(10, 10, Rgba([255, 100, 0, 100]));
        let config = WatermarkConfig::new(0.1, 255, Corner::TopLeft);
        let out = composite(&base, &wm, &config).to_rgb8();
        // r: (255*100 + 0*155 + 127) / 255 = 100
        // g: (100*100 + 0*155 + 127) / 255 = 39
        // b: (0*100 + 200*155 + 127) / 255 = 122
        assert_eq!(out.get_pixel(5, 5), &Rgb([100, 39, 122]));
    }

    #[test]
    fn half_opacity_blends_halfway() {
        let base = DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 100, Rgb([0, 0, 0])));
        let wm = solid_watermark(10, 10, Rgba([255, 255, 255, 255]));
        let config = WatermarkConfig::new(0.2, 128, Corner::TopLeft);
        let out = composite(&base, &wm, &config).to_rgb8();
        // alpha 255 * 128 / 255 = 128 → 255 * 128 / 255 = 128
        assert_eq!(out.get_pixel(5, 5), &Rgb([128, 128, 128]));
    }

    #[test]
    fn downscaled_watermark_has_no_dark_fringe() {
        // White logo next to a transparent black area, shrunk 20x
        let wm = DynamicImage::ImageRgba8(RgbaImage::from_fn(100, 10, |x, _| {
            if x < 50 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        }));
        let base = DynamicImage::ImageRgb8(RgbImage::from_pixel(200, 100, Rgb([255, 255, 255])));
        for opacity in [255, 128] {
            let config = WatermarkConfig::new(0.05, opacity, Corner::TopLeft);
            let out = composite(&base, &wm, &config).to_rgb8();
            assert!(
                out.pixels().all(|p| p == &Rgb([255, 255, 255])),
                "opacity {opacity}"
            );
        }
    }

    #[test]
    fn resize_premultiplied_keeps_color_of_partial_pixels() {
        let wm = DynamicImage::ImageRgba8(RgbaImage::from_fn(40, 4, |x, _| {
            if x < 20 {
                Rgba([200, 40, 10, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        }));
        let resized = resize_premultiplied(&wm, 10, 1);
        // Edge pixels fade through alpha only; color never darkens toward black
        let edge: Vec<_> = resized.pixels().filter(|p| p[3] > 0 && p[3] < 255).collect();
        assert!(!edge.is_empty());
        for p in resized.pixels().filter(|p| p[3] > 0) {
            assert!(p[0] >= 199 && p[1] >= 39 && p[2] >= 9, "{p:?}");
        }
    }

    #[test]
    fn apply_opacity_truncates() {
        let mut img = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 200]));
        apply_opacity(&mut img, 100);
        // 200 * 100 / 255 = 78.43 → 78
        assert_eq!(img.get_pixel(0, 0)[3], 78);
    }

    #[test]
    fn opaque_watermark_without_alpha_is_treated_as_opaque() {
        let base = DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 100, Rgb([0, 0, 0])));
        let wm = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb([255, 255, 255])));
        let config = WatermarkConfig::new(0.2, 255, Corner::TopLeft);
        let out = composite(&base, &wm, &config).to_rgb8();
        assert_eq!(out.get_pixel(5, 5), &Rgb([255, 255, 255]));
    }

    // =========================================================================
    // Placement and clipping
    // =========================================================================

    #[test]
    fn bottom_right_placement_reference_case() {
        let base = DynamicImage::ImageRgb8(RgbImage::from_pixel(1000, 800, Rgb([0, 0, 0])));
        let wm = solid_watermark(500, 400, Rgba([255, 255, 255, 255]));
        let config = WatermarkConfig::new(0.1, 255, Corner::BottomRight);
        let (out, layout) = composite_with_layout(&base, &wm, &config);
        assert_eq!((layout.x, layout.y), (880, 700));

        let rgb = out.to_rgb8();
        assert_eq!(rgb.get_pixel(880, 700), &Rgb([255, 255, 255]));
        assert_eq!(rgb.get_pixel(979, 779), &Rgb([255, 255, 255]));
        assert_eq!(rgb.get_pixel(879, 700), &Rgb([0, 0, 0]));
        assert_eq!(rgb.get_pixel(980, 780), &Rgb([0, 0, 0]));
    }

    #[test]
    fn oversized_watermark_is_clipped_without_panicking() {
        let base = gradient_base(60, 20);
        let wm = solid_watermark(10, 10, Rgba([0, 255, 0, 255]));
        for corner in Corner::ALL {
            let config = WatermarkConfig::new(1.0, 255, corner);
            let (out, layout) = composite_with_layout(&base, &wm, &config);
            assert!(layout.is_clipped());
            assert_eq!(out.dimensions(), (60, 20));
        }
    }

    #[test]
    fn blend_onto_fully_outside_is_noop() {
        let mut canvas = RgbaImage::from_pixel(10, 10, Rgba([1, 2, 3, 255]));
        let before = canvas.clone();
        let overlay = RgbaImage::from_pixel(5, 5, Rgba([255, 255, 255, 255]));
        blend_onto(&mut canvas, &overlay, 20, -30);
        blend_onto(&mut canvas, &overlay, -5, 0);
        assert_eq!(canvas, before);
    }

    #[test]
    fn blend_onto_partial_overlap_clips() {
        let mut canvas = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
        let overlay = RgbaImage::from_pixel(5, 5, Rgba([255, 255, 255, 255]));
        blend_onto(&mut canvas, &overlay, -2, 8);
        let white: Vec<_> = canvas
            .enumerate_pixels()
            .filter(|(_, _, p)| p[0] == 255)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert_eq!(white, vec![(0, 8), (1, 8), (2, 8), (0, 9), (1, 9), (2, 9)]);
    }

    // =========================================================================
    // Purity and non-idempotence
    // =========================================================================

    #[test]
    fn inputs_are_not_mutated() {
        let base = gradient_base(100, 80);
        let wm = solid_watermark(30, 30, Rgba([10, 20, 30, 200]));
        let (base_before, wm_before) = (base.clone(), wm.clone());
        let config = WatermarkConfig::new(0.5, 60, Corner::TopRight);
        let _ = composite(&base, &wm, &config);
        let _ = composite(&base, &wm, &config);
        assert_eq!(base, base_before);
        assert_eq!(wm, wm_before);
    }

    #[test]
    fn repeated_calls_with_shared_watermark_are_identical() {
        let base = gradient_base(120, 90);
        let wm = solid_watermark(30, 30, Rgba([200, 10, 10, 255]));
        let config = WatermarkConfig::new(0.4, 90, Corner::BottomLeft);
        let first = composite(&base, &wm, &config);
        let second = composite(&base, &wm, &config);
        assert_eq!(first, second);
    }

    #[test]
    fn compositing_twice_is_not_idempotent() {
        let base = DynamicImage::ImageRgb8(RgbImage::from_pixel(200, 200, Rgb([0, 0, 0])));
        let wm = solid_watermark(20, 20, Rgba([255, 255, 255, 255]));
        let config = WatermarkConfig::new(0.2, 128, Corner::BottomRight);
        let once = composite(&base, &wm, &config);
        let twice = composite(&once, &wm, &config);

        let diff = differing_pixels(&once, &twice);
        assert!(!diff.is_empty());
        // Every difference is inside the watermark region
        let layout = calculate_layout((200, 200), (20, 20), &config);
        assert!(diff.iter().all(|&(x, y)| {
            (x as i64) >= layout.x
                && (x as i64) < layout.x + layout.width as i64
                && (y as i64) >= layout.y
                && (y as i64) < layout.y + layout.height as i64
        }));
    }
}
