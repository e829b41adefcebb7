//! Utility functions for paths, numeric conversion and frame preprocessing.

pub mod image_conversion;
pub mod safe_cast;

use crate::Result;
use std::path::Path;

/// Create the parent directory of `path` if it has one and it is missing
///
/// # Errors
///
/// Returns an error if the directory cannot be created
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// File name without its final extension, used to name per-video outputs
#[must_use]
pub fn video_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string())
}

/// Final path component as a string
#[must_use]
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Arithmetic mean, 0 for an empty slice
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_video_stem() {
        assert_eq!(video_stem(Path::new("data/videos/Badminton_1.mp4")), "Badminton_1");
        assert_eq!(video_stem(Path::new("clip")), "clip");
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name(&PathBuf::from("data/videos/a.mp4")), "a.mp4");
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
    }

    #[test]
    fn test_ensure_parent_dir_bare_file_name() {
        // No parent component, nothing to create
        assert!(ensure_parent_dir(Path::new("out.mp4")).is_ok());
    }
}
