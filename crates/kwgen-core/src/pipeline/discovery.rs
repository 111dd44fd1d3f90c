//! Finding image files under an input path.

use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::config::ProcessingConfig;

/// A candidate image found on disk.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

/// Walks directories for files with a supported extension.
pub struct FileDiscovery {
    extensions: Vec<String>,
}

impl FileDiscovery {
    pub fn new(config: &ProcessingConfig) -> Self {
        Self {
            extensions: config
                .supported_formats
                .iter()
                .map(|f| f.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// Discover supported images at `path`, sorted by path.
    ///
    /// A file path yields itself when supported. Directories are walked
    /// recursively, skipping hidden entries.
    pub fn discover(&self, path: &Path) -> Vec<DiscoveredFile> {
        if path.is_file() {
            return match std::fs::metadata(path) {
                Ok(meta) if self.is_supported(path) => vec![DiscoveredFile {
                    path: path.to_path_buf(),
                    size: meta.len(),
                }],
                _ => vec![],
            };
        }

        let mut files: Vec<DiscoveredFile> = WalkDir::new(path)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && self.is_supported(e.path()))
            .filter_map(|e| {
                let size = e.metadata().ok()?.len();
                Some(DiscoveredFile {
                    path: e.into_path(),
                    size,
                })
            })
            .collect();

        files.sort_by(|a, b| a.path.cmp(&b.path));
        tracing::debug!("Discovered {} image(s) under {:?}", files.len(), path);
        files
    }

    /// Case-insensitive extension check.
    pub fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                self.extensions.iter().any(|e| *e == ext)
            })
            .unwrap_or(false)
    }

    pub fn total_size(files: &[DiscoveredFile]) -> u64 {
        files.iter().map(|f| f.size).sum()
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_is_supported() {
        let discovery = FileDiscovery::new(&ProcessingConfig::default());
        for name in ["a.jpg", "a.JPG", "a.jpeg", "a.png", "a.gif", "a.bmp", "a.WebP"] {
            assert!(discovery.is_supported(Path::new(name)), "{name}");
        }
        for name in ["a.txt", "a.tiff", "a_keywords_en.json", "noext"] {
            assert!(!discovery.is_supported(Path::new(name)), "{name}");
        }
    }

    #[test]
    fn test_discover_recursive_sorted() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("b.png"));
        touch(&dir.path().join("a.JPG"));
        touch(&dir.path().join("nested/c.webp"));
        touch(&dir.path().join("notes.txt"));
        touch(&dir.path().join("a_keywords_en.json"));

        let files = FileDiscovery::new(&ProcessingConfig::default()).discover(dir.path());
        let names: Vec<_> = files
            .iter()
            .map(|f| f.path.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.JPG"),
                PathBuf::from("b.png"),
                PathBuf::from("nested/c.webp")
            ]
        );
    }

    #[test]
    fn test_discover_skips_hidden() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join(".thumbs/a.jpg"));
        touch(&dir.path().join(".hidden.png"));
        touch(&dir.path().join("visible.png"));

        let files = FileDiscovery::new(&ProcessingConfig::default()).discover(dir.path());
        assert_eq!(files.len(), 1);
        assert!(files[0].path.ends_with("visible.png"));
    }

    #[test]
    fn test_discover_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("one.gif");
        touch(&image);
        let discovery = FileDiscovery::new(&ProcessingConfig::default());

        assert_eq!(discovery.discover(&image).len(), 1);
        let text = dir.path().join("one.txt");
        touch(&text);
        assert!(discovery.discover(&text).is_empty());
    }

    #[test]
    fn test_total_size() {
        let files = vec![
            DiscoveredFile {
                path: PathBuf::from("a.jpg"),
                size: 100,
            },
            DiscoveredFile {
                path: PathBuf::from("b.jpg"),
                size: 200,
            },
        ];
        assert_eq!(FileDiscovery::total_size(&files), 300);
    }
}
