//! Core data types produced by the keyword pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::language::Language;

/// Keywords for one image, keyed by language.
///
/// Only the languages that were requested appear as keys. A requested
/// language whose generation failed maps to an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordSet {
    by_language: BTreeMap<Language, Vec<String>>,
}

impl KeywordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set with an empty keyword list for every given language.
    pub fn empty_for(languages: &[Language]) -> Self {
        let mut set = Self::new();
        for &lang in languages {
            set.insert(lang, Vec::new());
        }
        set
    }

    pub fn insert(&mut self, language: Language, keywords: Vec<String>) {
        self.by_language.insert(language, keywords);
    }

    /// Keywords for a language, or an empty slice when it was not requested.
    pub fn get(&self, language: Language) -> &[String] {
        self.by_language
            .get(&language)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, language: Language) -> bool {
        self.by_language.contains_key(&language)
    }

    pub fn languages(&self) -> impl Iterator<Item = Language> + '_ {
        self.by_language.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Language, &[String])> {
        self.by_language.iter().map(|(l, k)| (*l, k.as_slice()))
    }

    /// True when no language has any keyword.
    pub fn is_empty(&self) -> bool {
        self.by_language.values().all(Vec::is_empty)
    }

    /// Total keyword count across all languages.
    pub fn total(&self) -> usize {
        self.by_language.values().map(Vec::len).sum()
    }
}

/// The complete result of keywording one image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageKeywords {
    /// Path to the source file
    pub file_path: PathBuf,

    /// Just the filename portion
    pub file_name: String,

    /// Detected format ("jpeg", "png", "webp", etc.)
    pub format: String,

    /// Image width in pixels, when the header could be read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    /// Image height in pixels, when the header could be read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    /// File size in bytes
    pub file_size: u64,

    /// Generated keywords per language
    pub keywords: KeywordSet,

    /// Model that produced the keywords
    pub model: String,

    /// Sidecar files written for this image
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sidecars: Vec<PathBuf>,

    /// Whether keywords were embedded into the image file
    #[serde(default)]
    pub embedded: bool,
}

/// Counters for a batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub embedded: usize,
}

impl ProcessingStats {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }
}
