//! Discovery of gallery images in a dataset directory.

use std::path::{Path, PathBuf};

use crate::error::CoreError;

/// File extensions (lowercase) treated as gallery images.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// A gallery image and the identifier derived from its file stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetImage {
    pub id: String,
    pub path: PathBuf,
}

/// Whether `path` ends in one of [`SUPPORTED_EXTENSIONS`], ignoring case.
pub fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}

/// List the supported image files directly inside `dir`, sorted by name.
pub fn scan_images(dir: &Path) -> Result<Vec<DatasetImage>, CoreError> {
    if !dir.is_dir() {
        return Err(CoreError::NotFound {
            what: "Dataset directory",
            path: dir.to_path_buf(),
        });
    }

    let mut images = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || !has_supported_extension(&path) {
            continue;
        }
        let Some(stem) = path.file_stem() else {
            continue;
        };
        images.push(DatasetImage {
            id: stem.to_string_lossy().into_owned(),
            path,
        });
    }

    images.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn extension_check_ignores_case() {
        assert!(has_supported_extension(Path::new("a/B.JPG")));
        assert!(has_supported_extension(Path::new("face.jpeg")));
        assert!(has_supported_extension(Path::new("face.Png")));
        assert!(!has_supported_extension(Path::new("face.gif")));
        assert!(!has_supported_extension(Path::new("README")));
    }

    #[test]
    fn scan_lists_supported_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.JPG", "notes.txt", "c.jpeg"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.png")).unwrap();

        let images = scan_images(dir.path()).unwrap();
        let ids: Vec<&str> = images.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn scan_missing_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        assert_matches!(
            scan_images(&dir.path().join("missing")),
            Err(CoreError::NotFound { .. })
        );
    }
}
