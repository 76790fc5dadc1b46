//! # Batch Watermark
//!
//! Stamps one watermark image onto many photos. The watermark is scaled
//! relative to each photo's width, faded to an opacity and anchored in a
//! corner. Each result is written to an output directory as
//! `<stem>_watermarked.<ext>`.
//!
//! # Architecture
//!
//! ```text
//! inputs ──scan──▶ sources ──export (worker thread)──▶ out/*_watermarked.*
//!                     │                    │
//!                     │                    └─▶ ProgressEvent per item ─▶ output
//!                     └──preview──▶ first source, shrunk, watermarked
//! ```
//!
//! All pixel work goes through [`imaging::composite`], a pure function. The
//! batch runs it once per image at full resolution and the preview runs it on
//! a shrunk copy, so both produce the same placement and proportions.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Parameter validation, placement geometry, alpha compositing, image I/O |
//! | [`export`] | Batch runner: per-item isolation, progress events, cancellation, background worker |
//! | [`preview`] | Single-image preview fitted to a display box |
//! | [`scan`] | Expands directory inputs to the images they contain |
//! | [`naming`] | `<stem>_watermarked.<ext>` output naming |
//! | [`config`] | `config.toml` loading, defaults and command-line overrides |
//! | [`output`] | CLI output formatting for settings, progress and summaries |
//!
//! # Design Decisions
//!
//! ## One Failure Never Stops The Batch
//!
//! A missing, corrupt or unwritable image is recorded as that item's failure
//! and the batch moves on. Only an unreadable watermark aborts the run, since
//! no item could succeed without it.
//!
//! ## Integer Blending
//!
//! Blending is done in 8-bit integer arithmetic with round-to-nearest. With
//! zero opacity the output is pixel-identical to the input, and with full
//! opacity an opaque watermark is copied exactly.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding and encoding use the `image` crate only. The binary needs no
//! system libraries.

pub mod config;
pub mod export;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod preview;
pub mod scan;
