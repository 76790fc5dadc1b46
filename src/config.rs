//! Settings loaded from `config.toml`.
//!
//! Every key is optional; missing keys fall back to the defaults below, and
//! command-line flags override whatever the file says.
//!
//! ## Configuration Options
//!
//! ```toml
//! [watermark]
//! scale = 0.15              # Watermark width as a fraction of image width
//! opacity = 128             # 0 (invisible) - 255 (as drawn)
//! corner = "bottom-right"   # top-left | top-right | bottom-left | bottom-right
//!
//! [output]
//! quality = 95              # JPEG quality (1-100), ignored by lossless formats
//!
//! [preview]
//! max_width = 680           # Preview is shrunk to fit this box
//! max_height = 500
//! ```
//!
//! Unknown keys are rejected to catch typos early. The watermark values are
//! kept raw here and go through [`imaging::validate`](crate::imaging::validate)
//! when a [`WatermarkConfig`] is requested, so a bad corner is reported the
//! same way whether it came from the file or the command line.

use crate::imaging::{ParamError, Quality, WatermarkConfig, validate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid watermark parameters: {0}")]
    Param(#[from] ParamError),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub watermark: WatermarkSection,
    pub output: OutputSection,
    pub preview: PreviewSection,
}

/// Raw watermark parameters, as written by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatermarkSection {
    pub scale: f64,
    pub opacity: i64,
    pub corner: String,
}

impl Default for WatermarkSection {
    fn default() -> Self {
        Self {
            scale: 0.15,
            opacity: 128,
            corner: "bottom-right".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    pub quality: u32,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self { quality: 95 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewSection {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for PreviewSection {
    fn default() -> Self {
        Self {
            max_width: 680,
            max_height: 500,
        }
    }
}

/// Values given on the command line. `None` keeps the file/default value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub scale: Option<f64>,
    pub opacity: Option<i64>,
    pub corner: Option<String>,
    pub quality: Option<u32>,
}

impl Settings {
    /// Validate values that are rejected rather than clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        if self.preview.max_width == 0 || self.preview.max_height == 0 {
            return Err(ConfigError::Validation(
                "preview.max_width and preview.max_height must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Apply command-line overrides on top of these settings.
    pub fn with_overrides(mut self, overrides: &Overrides) -> Self {
        if let Some(scale) = overrides.scale {
            self.watermark.scale = scale;
        }
        if let Some(opacity) = overrides.opacity {
            self.watermark.opacity = opacity;
        }
        if let Some(corner) = &overrides.corner {
            self.watermark.corner = corner.clone();
        }
        if let Some(quality) = overrides.quality {
            self.output.quality = quality;
        }
        self
    }

    /// Normalize the watermark section through the parameter validator.
    pub fn watermark_config(&self) -> Result<WatermarkConfig, ConfigError> {
        let w = &self.watermark;
        Ok(validate(w.scale, w.opacity, &w.corner)?)
    }

    pub fn quality(&self) -> Quality {
        Quality::new(self.output.quality)
    }

    pub fn preview_size(&self) -> (u32, u32) {
        (self.preview.max_width, self.preview.max_height)
    }
}

/// Load settings from a TOML file, or defaults when `path` is `None`.
///
/// The file may be sparse: unspecified keys keep their defaults.
pub fn load_config(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let settings = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => Settings::default(),
    };
    settings.validate()?;
    Ok(settings)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Batch Watermark Configuration
# =============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Command-line flags override them.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Watermark placement
# ---------------------------------------------------------------------------
[watermark]
# Watermark width as a fraction of each image's width, in (0, 1].
# Height follows the watermark's own aspect ratio.
scale = 0.15

# Opacity from 0 (invisible) to 255 (as drawn, original alpha kept).
opacity = 128

# Anchor corner: top-left, top-right, bottom-left or bottom-right.
# The gap to the edges is 2% of the image width on both axes.
corner = "bottom-right"

# ---------------------------------------------------------------------------
# Output encoding
# ---------------------------------------------------------------------------
[output]
# JPEG quality (1 = worst, 100 = best). PNG, BMP and GIF ignore it.
quality = 95

# ---------------------------------------------------------------------------
# Preview
# ---------------------------------------------------------------------------
[preview]
# The preview image is shrunk (never enlarged) to fit this box.
max_width = 680
max_height = 500
"##
}
