//! Image I/O backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the pipeline needs
//! from the outside world: decode an image from a path and encode one to a
//! path. Compositing itself is pure and never goes through the backend.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Tests use the
//! `MockBackend` below to simulate missing files and failing writes.

use super::params::Quality;
use image::DynamicImage;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    /// Missing, unreadable, or undecodable input.
    #[error("{path}: {reason}")]
    Load { path: String, reason: String },
    /// Output could not be created or encoded.
    #[error("{path}: {reason}")]
    Write { path: String, reason: String },
    /// Output extension has no encoder.
    #[error("{path}: unsupported output format '{ext}'")]
    UnsupportedFormat { path: String, ext: String },
}

impl BackendError {
    pub fn load(path: &Path, reason: impl ToString) -> Self {
        Self::Load {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn write(path: &Path, reason: impl ToString) -> Self {
        Self::Write {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Trait for image I/O backends.
///
/// `Send + Sync` so a backend can be moved onto the batch worker thread.
pub trait ImageBackend: Send + Sync {
    /// Decode the image at `path`.
    fn load(&self, path: &Path) -> Result<DynamicImage, BackendError>;

    /// Encode `image` to `path`, choosing the format from the extension.
    ///
    /// `quality` applies to lossy formats and is ignored elsewhere.
    fn save(&self, image: &DynamicImage, path: &Path, quality: Quality)
    -> Result<(), BackendError>;
}
