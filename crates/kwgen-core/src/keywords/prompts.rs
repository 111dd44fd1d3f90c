//! Prompt text sent to the vision model.

use crate::language::Language;

/// Prompt asking for English keywords describing the attached image.
pub const ENGLISH_KEYWORDS_PROMPT: &str = "Generate 5-7 relevant keywords for this image in English. \
Focus on describing: objects, colors, actions, emotions, settings, style. \
Avoid generic terms like 'photograph', 'photography', 'image', 'picture' or software names. \
Provide only single words or short phrases, separated by commas.";

/// Prompt asking for a translation of the English keyword list.
pub fn translation_prompt(language: Language, english: &[String]) -> String {
    format!(
        "Translate these English keywords to {}, keeping the same meaning and style. \
         Return only the translations, separated by commas: {}",
        language.name(),
        english.join(", ")
    )
}
