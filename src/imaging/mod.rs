//! Image processing in pure Rust, built on the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (PNG, JPEG, BMP, GIF) |
//! | **Resize watermark** | `image::imageops::resize` with `Lanczos3` |
//! | **Opacity + blend** | integer alpha math in [`compositor`] |
//! | **Encode** | JPEG with quality, PNG best compression, BMP/GIF as-is |
//!
//! The module is split into:
//! - **Parameters**: [`WatermarkConfig`], [`Corner`], [`Quality`] and the [`validate`] boundary
//! - **Calculations**: Pure functions for watermark geometry (unit testable)
//! - **Compositor**: The pure compositing routine shared by preview and batch
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
pub mod compositor;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::{
    Layout, calculate_fit_dimensions, calculate_layout, calculate_margin, calculate_offset,
    calculate_watermark_size,
};
pub use compositor::{composite, composite_with_layout};
pub use params::{
    Corner, MARGIN_FRACTION, MIN_SCALE, ParamError, Quality, WatermarkConfig, validate,
};
pub use rust_backend::{RustBackend, SUPPORTED_EXTENSIONS, has_supported_extension};
