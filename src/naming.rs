//! Output filename derivation.
//!
//! Every exported file is named after its source: `<stem>_watermarked<ext>`,
//! keeping the original extension (and therefore the original format):
//!
//! - `IMG_0042.JPG` → `IMG_0042_watermarked.JPG`
//! - `logo.png` → `logo_watermarked.png`
//! - `README` → `README_watermarked`
//!
//! Outputs are written flat into one directory, so two sources with the same
//! stem from different folders map to the same output path and the later one
//! wins.

use std::path::{Path, PathBuf};

/// Suffix inserted between the stem and the extension.
pub const OUTPUT_SUFFIX: &str = "_watermarked";

/// Derive the output file name for `source`.
///
/// Returns `None` when the path has no file name (e.g. `..` or `/`).
pub fn output_file_name(source: &Path) -> Option<String> {
    let stem = source.file_stem()?.to_string_lossy();
    Some(match source.extension() {
        Some(ext) => format!("{stem}{OUTPUT_SUFFIX}.{}", ext.to_string_lossy()),
        None => format!("{stem}{OUTPUT_SUFFIX}"),
    })
}

/// Full output path for `source` inside `output_dir`.
pub fn output_path(source: &Path, output_dir: &Path) -> Option<PathBuf> {
    output_file_name(source).map(|name| output_dir.join(name))
}

/// Short label for progress display: the file name, or the whole path if it has none.
pub fn display_label(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
