//! Source image discovery.
//!
//! The command line accepts files and directories. Directories are expanded
//! one level deep (no recursion) to the images they contain:
//!
//! ```text
//! shoot/
//! ├── 001.jpg        ✓
//! ├── 002.PNG        ✓  extension match is case-insensitive
//! ├── notes.txt      ✗  not an image
//! ├── .thumb.jpg     ✗  hidden
//! └── raw/           ✗  subdirectories are not entered
//!     └── 003.jpg
//! ```
//!
//! Results are sorted by path so batch order is stable across platforms.

use crate::imaging::has_supported_extension;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Failed to read directory {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Collect supported images directly inside `dir`.
pub fn collect_images(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let io_err = |source| ScanError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut images: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(io_err)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && !is_hidden(p) && has_supported_extension(p))
        .collect();

    images.sort();
    Ok(images)
}

/// Expand a mixed list of files and directories into source paths.
///
/// Files are kept as given, even if missing or not images, so that the batch
/// can report them as per-item failures. Directories are replaced by their
/// images, in place.
pub fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, ScanError> {
    let mut sources = Vec::new();
    for input in inputs {
        if input.is_dir() {
            sources.extend(collect_images(input)?);
        } else {
            sources.push(input.clone());
        }
    }
    Ok(sources)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| n.to_string_lossy().starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        // scan only checks extensions, content is irrelevant
        fs::write(path, "").unwrap();
    }

    #[test]
    fn collects_supported_images_sorted() {
        let tmp = TempDir::new().unwrap();
        for name in ["b.png", "a.jpg", "c.JPEG", "d.bmp", "e.gif"] {
            touch(&tmp.path().join(name));
        }

        let names: Vec<String> = collect_images(tmp.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.png", "c.JPEG", "d.bmp", "e.gif"]);
    }

    #[test]
    fn skips_non_images_hidden_files_and_subdirectories() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("keep.jpg"));
        touch(&tmp.path().join("notes.txt"));
        touch(&tmp.path().join("photo.webp"));
        touch(&tmp.path().join(".hidden.png"));
        touch(&tmp.path().join("nested/deep.jpg"));
        fs::create_dir_all(tmp.path().join("folder.png")).unwrap();

        let found = collect_images(tmp.path()).unwrap();
        assert_eq!(found, vec![tmp.path().join("keep.jpg")]);
    }

    #[test]
    fn empty_directory_yields_nothing() {
        let tmp = TempDir::new().unwrap();
        assert!(collect_images(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn missing_directory_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = collect_images(&tmp.path().join("nope"));
        assert!(matches!(result, Err(ScanError::Io { .. })));
    }

    #[test]
    fn expand_keeps_files_and_expands_directories_in_order() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("shoot");
        touch(&dir.join("2.png"));
        touch(&dir.join("1.png"));
        let single = tmp.path().join("single.jpg");
        touch(&single);
        let missing = tmp.path().join("missing.jpg");

        let sources =
            expand_inputs(&[single.clone(), dir.clone(), missing.clone()]).unwrap();
        assert_eq!(
            sources,
            vec![single, dir.join("1.png"), dir.join("2.png"), missing]
        );
    }
}
