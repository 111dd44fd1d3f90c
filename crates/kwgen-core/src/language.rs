//! Output languages for keyword generation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A language keywords can be produced in.
///
/// English is always generated first; the other languages are translations
/// of the English keyword list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "dk", alias = "da")]
    Danish,
    #[serde(rename = "vi")]
    Vietnamese,
}

impl Language {
    /// Every supported language, in display order.
    pub const ALL: [Language; 3] = [Language::English, Language::Danish, Language::Vietnamese];

    /// Short code used in sidecar file names and embedded keyword prefixes.
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Danish => "dk",
            Language::Vietnamese => "vi",
        }
    }

    /// English name of the language, as used in translation prompts.
    pub fn name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Danish => "Danish",
            Language::Vietnamese => "Vietnamese",
        }
    }

    /// Parse a language code (case-insensitive). `da` is accepted for Danish.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "en" => Some(Language::English),
            "dk" | "da" => Some(Language::Danish),
            "vi" => Some(Language::Vietnamese),
            _ => None,
        }
    }

    pub fn is_english(self) -> bool {
        self == Language::English
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::from_code(s).ok_or_else(|| {
            format!("unknown language '{s}' (expected one of: en, dk, vi)")
        })
    }
}

/// Parse a list of codes, dropping duplicates while keeping the first occurrence.
pub fn parse_languages<S: AsRef<str>>(codes: &[S]) -> Result<Vec<Language>, String> {
    let mut languages = Vec::with_capacity(codes.len());
    for code in codes {
        let lang: Language = code.as_ref().parse()?;
        if !languages.contains(&lang) {
            languages.push(lang);
        }
    }
    Ok(languages)
}
