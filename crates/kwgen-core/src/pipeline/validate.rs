//! Input validation before any model call.

use std::io::Read;
use std::path::{Path, PathBuf};

use crate::config::LimitsConfig;
use crate::error::PipelineError;

/// Image formats the tool can send to a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    Bmp,
    WebP,
}

impl ImageKind {
    /// Format identifier used for MIME types and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpeg",
            ImageKind::Png => "png",
            ImageKind::Gif => "gif",
            ImageKind::Bmp => "bmp",
            ImageKind::WebP => "webp",
        }
    }

    /// Classify a file by its leading bytes.
    pub fn from_header(header: &[u8]) -> Option<Self> {
        match header {
            [0xFF, 0xD8, 0xFF, ..] => Some(ImageKind::Jpeg),
            [0x89, b'P', b'N', b'G', ..] => Some(ImageKind::Png),
            [b'G', b'I', b'F', b'8', ..] => Some(ImageKind::Gif),
            [b'B', b'M', ..] => Some(ImageKind::Bmp),
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => {
                Some(ImageKind::WebP)
            }
            _ => None,
        }
    }

    /// Read the first bytes of `path` and classify them.
    pub fn sniff(path: &Path) -> Result<Option<Self>, std::io::Error> {
        let mut file = std::fs::File::open(path)?;
        let mut header = [0u8; 12];
        let mut filled = 0;
        // A single read may return fewer bytes than available
        while filled < header.len() {
            let n = file.read(&mut header[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(Self::from_header(&header[..filled]))
    }
}

impl std::fmt::Display for ImageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedImage {
    pub path: PathBuf,
    pub kind: ImageKind,
    pub file_size: u64,
}

/// Validates files before they are read in full.
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Checks that the file exists, is within the size limit and starts with
    /// the magic bytes of a supported format.
    pub fn validate(&self, path: &Path) -> Result<ValidatedImage, PipelineError> {
        if !path.exists() {
            return Err(PipelineError::FileNotFound(path.to_path_buf()));
        }

        let metadata = std::fs::metadata(path).map_err(|e| PipelineError::Validate {
            path: path.to_path_buf(),
            message: format!("Cannot read metadata: {e}"),
        })?;

        let max_bytes = self.limits.max_file_size_mb * 1024 * 1024;
        if metadata.len() > max_bytes {
            return Err(PipelineError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: metadata.len() / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }

        let kind = ImageKind::sniff(path)
            .map_err(|e| PipelineError::Validate {
                path: path.to_path_buf(),
                message: format!("Cannot open file: {e}"),
            })?
            .ok_or_else(|| PipelineError::UnsupportedFormat {
                path: path.to_path_buf(),
                format: path
                    .extension()
                    .map(|e| e.to_string_lossy().to_lowercase())
                    .unwrap_or_else(|| "unknown".to_string()),
            })?;

        Ok(ValidatedImage {
            path: path.to_path_buf(),
            kind,
            file_size: metadata.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{write_jpeg, write_png};

    #[test]
    fn test_header_classification() {
        assert_eq!(
            ImageKind::from_header(&[0xFF, 0xD8, 0xFF, 0xE0]),
            Some(ImageKind::Jpeg)
        );
        assert_eq!(
            ImageKind::from_header(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A]),
            Some(ImageKind::Png)
        );
        assert_eq!(ImageKind::from_header(b"GIF89a"), Some(ImageKind::Gif));
        assert_eq!(ImageKind::from_header(b"BM\0\0"), Some(ImageKind::Bmp));
        assert_eq!(
            ImageKind::from_header(b"RIFF\0\0\0\0WEBPVP8 "),
            Some(ImageKind::WebP)
        );
    }

    #[test]
    fn test_header_rejects_lookalikes() {
        // RIFF container that is not WebP (e.g. WAV)
        assert_eq!(ImageKind::from_header(b"RIFF\0\0\0\0WAVE"), None);
        // TIFF is a valid image but not supported for keywording
        assert_eq!(ImageKind::from_header(&[b'I', b'I', 0x2A, 0x00]), None);
        assert_eq!(ImageKind::from_header(&[0xFF, 0xD8]), None);
        assert_eq!(ImageKind::from_header(&[]), None);
    }

    #[test]
    fn test_validate_real_images() {
        let dir = tempfile::tempdir().unwrap();
        let validator = Validator::new(LimitsConfig::default());

        let jpeg = validator.validate(&write_jpeg(dir.path(), "a.jpg")).unwrap();
        assert_eq!(jpeg.kind, ImageKind::Jpeg);
        assert!(jpeg.file_size > 0);

        let png = validator.validate(&write_png(dir.path(), "b.png")).unwrap();
        assert_eq!(png.kind, ImageKind::Png);
    }

    #[test]
    fn test_validate_classifies_by_content_not_extension() {
        let dir = tempfile::tempdir().unwrap();
        let png = write_png(dir.path(), "b.png");
        let renamed = dir.path().join("really_png.jpg");
        std::fs::rename(&png, &renamed).unwrap();

        let validated = Validator::new(LimitsConfig::default())
            .validate(&renamed)
            .unwrap();
        assert_eq!(validated.kind, ImageKind::Png);
    }

    #[test]
    fn test_validate_missing_file() {
        let err = Validator::new(LimitsConfig::default())
            .validate(Path::new("/nonexistent/a.jpg"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound(_)));
    }

    #[test]
    fn test_validate_garbage_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.jpg");
        std::fs::write(&path, b"definitely not an image").unwrap();

        let err = Validator::new(LimitsConfig::default())
            .validate(&path)
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat { ref format, .. } if format == "jpg"));
    }

    #[test]
    fn test_validate_size_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.jpg");
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
        bytes.resize(1024 * 1024 + 1, 0);
        std::fs::write(&path, bytes).unwrap();

        let limits = LimitsConfig {
            max_file_size_mb: 1,
            ..LimitsConfig::default()
        };
        let err = Validator::new(limits).validate(&path).unwrap_err();
        assert!(matches!(err, PipelineError::FileTooLarge { max_mb: 1, .. }));
    }
}
