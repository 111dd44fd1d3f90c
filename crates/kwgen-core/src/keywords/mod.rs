//! Keyword generation: prompts, reply parsing and the per-image generator.

mod generator;
mod parse;
mod prompts;

pub use generator::{GenerateOptions, KeywordGenerator};
pub use parse::{parse_keywords, parse_translation};
pub use prompts::{translation_prompt, ENGLISH_KEYWORDS_PROMPT};
