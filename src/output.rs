//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Settings
//!
//! ```text
//! Size: 15%
//! Opacity: 50%
//! Corner: bottom-right
//! ```
//!
//! ## Export
//!
//! ```text
//!   1 / 3  dawn.jpg
//!     → out/dawn_watermarked.jpg
//!   2 / 3  broken.jpg
//!     Failed: photos/broken.jpg: Format error decoding Jpeg
//!   3 / 3  pano.png
//!     → out/pano_watermarked.png
//!     Watermark clipped: larger than the image at this scale
//!
//! Processed 3 images: 2 succeeded, 1 failed
//! Output: out
//! ```
//!
//! # Architecture
//!
//! Each `format_*` function returns `Vec<String>` for testability and is
//! pure. The `print_*` wrappers write to stdout.

use crate::export::{BatchResult, ItemOutcome, ProgressEvent};
use crate::imaging::WatermarkConfig;
use std::path::Path;

/// Indentation for context lines under an item.
const INDENT: &str = "    ";

/// Size as a whole percentage of image width, truncated.
pub fn size_percent(config: &WatermarkConfig) -> u32 {
    (config.scale() * 100.0) as u32
}

/// Opacity as a whole percentage of 255, truncated.
pub fn opacity_percent(config: &WatermarkConfig) -> u32 {
    (config.opacity() as f64 / 255.0 * 100.0) as u32
}

/// Format the effective watermark parameters.
pub fn format_settings(config: &WatermarkConfig) -> Vec<String> {
    vec![
        format!("Size: {}%", size_percent(config)),
        format!("Opacity: {}%", opacity_percent(config)),
        format!("Corner: {}", config.corner()),
    ]
}

/// Format the `"  i / total"` counter.
pub fn progress_counter(index: usize, total: usize) -> String {
    format!("{:>3} / {}", index, total)
}

/// Format one progress event as display lines.
pub fn format_progress(event: &ProgressEvent) -> Vec<String> {
    let mut lines = vec![format!(
        "{}  {}",
        progress_counter(event.index, event.total),
        event.label
    )];
    match &event.outcome {
        ItemOutcome::Success(path) => {
            lines.push(format!("{INDENT}\u{2192} {}", path.display()));
            if event.clipped {
                lines.push(format!(
                    "{INDENT}Watermark clipped: larger than the image at this scale"
                ));
            }
        }
        ItemOutcome::Failure(reason) => {
            lines.push(format!("{INDENT}Failed: {}", reason));
        }
    }
    lines
}

/// Format the end-of-batch summary.
pub fn format_summary(result: &BatchResult, output_dir: &Path) -> Vec<String> {
    let mut lines = vec![String::new()];

    let noun = if result.processed() == 1 {
        "image"
    } else {
        "images"
    };
    lines.push(format!(
        "Processed {} {}: {} succeeded, {} failed",
        result.processed(),
        noun,
        result.succeeded,
        result.failed
    ));

    if result.cancelled {
        lines.push("Cancelled before all images were processed".to_string());
    }

    if result.failed > 0 {
        lines.push("Failures:".to_string());
        for reason in result.failures() {
            lines.push(format!("{INDENT}{}", reason));
        }
    }

    lines.push(format!("Output: {}", output_dir.display()));
    lines
}

/// Print the effective watermark parameters to stdout.
pub fn print_settings(config: &WatermarkConfig) {
    for line in format_settings(config) {
        println!("{}", line);
    }
}

/// Print one progress event to stdout.
pub fn print_progress(event: &ProgressEvent) {
    for line in format_progress(event) {
        println!("{}", line);
    }
}

/// Print the batch summary to stdout.
pub fn print_summary(result: &BatchResult, output_dir: &Path) {
    for line in format_summary(result, output_dir) {
        println!("{}", line);
    }
}
