//! Per-language JSON sidecar files.
//!
//! Each image gets one file per language, `{stem}_keywords_{lang}.json`, in
//! the output directory.

use crate::error::PipelineError;
use crate::language::Language;
use crate::types::KeywordSet;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Contents of one sidecar file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidecarRecord {
    /// Image path as it was given
    pub image: String,
    pub language: Language,
    pub keywords: Vec<String>,
}

/// Sidecar location for an image and language.
pub fn sidecar_path(output_dir: &Path, image: &Path, language: Language) -> PathBuf {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    output_dir.join(format!("{stem}_keywords_{}.json", language.code()))
}

/// Read and parse one sidecar file.
pub fn read_sidecar(path: &Path) -> Result<SidecarRecord, PipelineError> {
    let content = std::fs::read_to_string(path).map_err(|e| PipelineError::Sidecar {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| PipelineError::Sidecar {
        path: path.to_path_buf(),
        message: format!("invalid sidecar JSON: {e}"),
    })
}

/// Load the sidecars of `image` for `languages` back into a [`KeywordSet`].
///
/// Missing sidecars are skipped, so the result only holds languages that
/// were found.
pub fn load_keyword_set(
    image: &Path,
    output_dir: &Path,
    languages: &[Language],
) -> Result<KeywordSet, PipelineError> {
    let mut set = KeywordSet::new();
    for &language in languages {
        let path = sidecar_path(output_dir, image, language);
        if !path.exists() {
            tracing::debug!("No {} sidecar for {:?}", language, image);
            continue;
        }
        set.insert(language, read_sidecar(&path)?.keywords);
    }
    Ok(set)
}

/// True when every requested language already has a sidecar with keywords.
///
/// Empty sidecars left by a failed run do not count.
pub fn sidecars_exist(image: &Path, output_dir: &Path, languages: &[Language]) -> bool {
    languages.iter().all(|&l| {
        let path = sidecar_path(output_dir, image, l);
        path.exists() && read_sidecar(&path).is_ok_and(|r| !r.keywords.is_empty())
    })
}

/// Writes keyword sets to sidecar files.
#[derive(Debug, Clone)]
pub struct SidecarWriter {
    output_dir: PathBuf,
    append: bool,
    pretty: bool,
}

impl SidecarWriter {
    pub fn new(output_dir: impl Into<PathBuf>, append: bool) -> Self {
        Self {
            output_dir: output_dir.into(),
            append,
            pretty: true,
        }
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write one sidecar per language in `keywords`. Returns the paths written.
    ///
    /// A language with an empty list still gets a sidecar. In append mode the
    /// existing keywords of such a sidecar are kept.
    pub fn write(&self, image: &Path, keywords: &KeywordSet) -> Result<Vec<PathBuf>, PipelineError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|e| PipelineError::Sidecar {
            path: self.output_dir.clone(),
            message: format!("Failed to create output directory: {e}"),
        })?;

        let mut written = Vec::new();
        for (language, new_keywords) in keywords.iter() {
            if new_keywords.is_empty() {
                tracing::warn!("No {} keywords for {:?}", language, image);
            }
            let path = sidecar_path(&self.output_dir, image, language);
            let merged = if self.append {
                self.merge_existing(&path, new_keywords)
            } else {
                new_keywords.to_vec()
            };

            let record = SidecarRecord {
                image: image.to_string_lossy().into_owned(),
                language,
                keywords: merged,
            };
            self.write_record(&path, &record)?;
            tracing::debug!("Wrote {:?}", path);
            written.push(path);
        }
        Ok(written)
    }

    /// Existing keywords first, then new ones not already present.
    fn merge_existing(&self, path: &Path, new_keywords: &[String]) -> Vec<String> {
        if !path.exists() {
            return new_keywords.to_vec();
        }
        let mut merged = match read_sidecar(path) {
            Ok(existing) => existing.keywords,
            Err(e) => {
                tracing::warn!("Overwriting unreadable sidecar: {e}");
                Vec::new()
            }
        };
        let mut seen: HashSet<String> = merged.iter().cloned().collect();
        for keyword in new_keywords {
            if seen.insert(keyword.clone()) {
                merged.push(keyword.clone());
            }
        }
        merged
    }

    fn write_record(&self, path: &Path, record: &SidecarRecord) -> Result<(), PipelineError> {
        let json = if self.pretty {
            serde_json::to_string_pretty(record)
        } else {
            serde_json::to_string(record)
        }
        .map_err(|e| PipelineError::Sidecar {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        std::fs::write(path, json).map_err(|e| PipelineError::Sidecar {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}
