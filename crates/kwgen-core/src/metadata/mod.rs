//! Embedding keywords into image file metadata.
//!
//! All selected languages are folded into one string of `lang:keyword`
//! items. JPEG stores it in EXIF `UserComment`, PNG in a `Keywords` text
//! chunk. Other formats are rejected.

pub mod jpeg;
pub mod png;

use std::path::Path;

use crate::error::PipelineError;
use crate::language::Language;
use crate::pipeline::validate::ImageKind;
use crate::types::KeywordSet;

/// `"{lang}:{kw}"` items joined with `", "`, languages in selection order.
pub fn combined_keyword_string(keywords: &KeywordSet, languages: &[Language]) -> String {
    languages
        .iter()
        .flat_map(|&lang| {
            keywords
                .get(lang)
                .iter()
                .map(move |kw| format!("{}:{kw}", lang.code()))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn detect(path: &Path) -> Result<Option<ImageKind>, PipelineError> {
    if !path.exists() {
        return Err(PipelineError::FileNotFound(path.to_path_buf()));
    }
    ImageKind::sniff(path).map_err(|e| PipelineError::Embed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn unsupported(path: &Path, kind: Option<ImageKind>) -> PipelineError {
    PipelineError::UnsupportedFormat {
        path: path.to_path_buf(),
        format: kind
            .map(|k| k.to_string())
            .unwrap_or_else(|| "unknown".to_string()),
    }
}

/// Write the keywords of `languages` into the metadata of the image at `path`.
pub fn embed_keywords(
    path: &Path,
    keywords: &KeywordSet,
    languages: &[Language],
) -> Result<(), PipelineError> {
    let text = combined_keyword_string(keywords, languages);
    if text.is_empty() {
        return Err(PipelineError::Embed {
            path: path.to_path_buf(),
            message: "no keywords for the selected languages".to_string(),
        });
    }

    match detect(path)? {
        Some(ImageKind::Jpeg) => jpeg::embed(path, &text),
        Some(ImageKind::Png) => png::embed(path, &text),
        other => Err(unsupported(path, other)),
    }?;

    tracing::debug!("Embedded {} bytes of keywords into {:?}", text.len(), path);
    Ok(())
}

/// Read back a previously embedded keyword string, if any.
pub fn read_embedded_keywords(path: &Path) -> Result<Option<String>, PipelineError> {
    match detect(path)? {
        Some(ImageKind::Jpeg) => jpeg::read(path),
        Some(ImageKind::Png) => png::read(path),
        other => Err(unsupported(path, other)),
    }
}
