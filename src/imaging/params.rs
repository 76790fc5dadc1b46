//! Parameter types and validation for watermark compositing.
//!
//! These structs describe *what* to composite, not *how*. Raw values from a
//! UI slider, a config file or the command line go through [`validate`],
//! which is the single boundary where they are normalized:
//!
//! - **scale** is clamped into `(0, 1]` (fraction of the base image width)
//! - **opacity** is clamped into `[0, 255]`
//! - **corner** must be one of four tokens; anything else is an error
//!
//! ## Types
//!
//! - [`Corner`]: Closed set of anchor corners.
//! - [`WatermarkConfig`]: Immutable, already-normalized compositing parameters.
//! - [`Quality`]: Lossy encoding quality (1–100, default 95). Clamped on construction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Distance from the anchor corner to the watermark, as a fraction of the base width.
///
/// Both axes use the width so margins look the same on portrait and landscape images.
pub const MARGIN_FRACTION: f64 = 0.02;

/// Smallest scale a non-positive or NaN input is clamped to.
pub const MIN_SCALE: f64 = 0.001;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error(
        "Unknown corner '{0}': expected one of top-left, top-right, bottom-left, bottom-right"
    )]
    UnknownCorner(String),
}

/// Corner of the base image the watermark is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Corner::TopLeft => "top-left",
            Corner::TopRight => "top-right",
            Corner::BottomLeft => "bottom-left",
            Corner::BottomRight => "bottom-right",
        }
    }
}

impl fmt::Display for Corner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Corner {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Corner::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(token))
            .ok_or_else(|| ParamError::UnknownCorner(s.to_string()))
    }
}

/// Normalized watermark placement parameters.
///
/// Fields are private so every instance has passed through clamping.
/// The value is `Copy` and never mutated by the compositor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WatermarkConfig {
    scale: f64,
    opacity: u8,
    corner: Corner,
}

impl WatermarkConfig {
    /// Build a config, clamping `scale` into `(0, 1]`.
    pub fn new(scale: f64, opacity: u8, corner: Corner) -> Self {
        Self {
            scale: clamp_scale(scale),
            opacity,
            corner,
        }
    }

    /// Fraction of the base image width the watermark occupies.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// 255 leaves the watermark alpha untouched, 0 makes it invisible.
    pub fn opacity(&self) -> u8 {
        self.opacity
    }

    pub fn corner(&self) -> Corner {
        self.corner
    }

    pub fn margin_fraction(&self) -> f64 {
        MARGIN_FRACTION
    }
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self::new(0.15, 128, Corner::BottomRight)
    }
}

fn clamp_scale(raw: f64) -> f64 {
    if raw.is_nan() || raw <= 0.0 {
        MIN_SCALE
    } else {
        raw.min(1.0).max(MIN_SCALE)
    }
}

/// Normalize raw parameters into a [`WatermarkConfig`].
///
/// Scale and opacity are clamped rather than rejected; an unrecognized corner
/// is a [`ParamError::UnknownCorner`] and never falls back to a default.
pub fn validate(
    raw_scale: f64,
    raw_opacity: i64,
    raw_corner: &str,
) -> Result<WatermarkConfig, ParamError> {
    let corner: Corner = raw_corner.parse()?;
    let opacity = raw_opacity.clamp(0, 255) as u8;
    Ok(WatermarkConfig::new(raw_scale, opacity, corner))
}

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(95)
    }
}
