//! File discovery for finding photos in directories.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions matching the formats the intake validator accepts.
const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Discover all supported photo files at a path.
///
/// If path is a file, returns it if supported.
/// If path is a directory, recursively finds all supported files,
/// sorted by path for deterministic ordering.
pub fn discover(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        if is_supported(path) {
            return vec![path.to_path_buf()];
        }
        return vec![];
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let entry_path = entry.path();
        if entry_path.is_file() && is_supported(entry_path) {
            files.push(entry_path.to_path_buf());
        }
    }

    files.sort();
    files
}

/// Check if a file has a supported extension.
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext_lower = ext.to_lowercase();
            SUPPORTED_EXTENSIONS.iter().any(|fmt| *fmt == ext_lower)
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported() {
        assert!(is_supported(Path::new("crash.jpg")));
        assert!(is_supported(Path::new("crash.JPG")));
        assert!(is_supported(Path::new("crash.jpeg")));
        assert!(is_supported(Path::new("crash.png")));
        assert!(is_supported(Path::new("crash.gif")));
        assert!(is_supported(Path::new("crash.webp")));
        assert!(!is_supported(Path::new("crash.txt")));
        assert!(!is_supported(Path::new("crash.pdf")));
        assert!(!is_supported(Path::new("crash")));
    }

    #[test]
    fn test_discover_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.jpg"), b"x").unwrap();
        std::fs::write(dir.path().join("a.png"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        let nested = dir.path().join("more");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(nested.join("c.webp"), b"x").unwrap();

        let files = discover(dir.path());
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.png", "b.jpg", "c.webp"]);
    }

    #[test]
    fn test_discover_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("front.jpg");
        std::fs::write(&file, b"x").unwrap();

        assert_eq!(discover(&file), vec![file.clone()]);
        assert!(discover(&dir.path().join("missing.jpg")).is_empty());
    }
}
