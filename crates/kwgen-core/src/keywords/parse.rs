//! Turning free-form model replies into keyword lists.

use std::collections::HashSet;

/// Parse an English keyword reply: comma separated, lowercased.
pub fn parse_keywords(text: &str) -> Vec<String> {
    collect_unique(text.split(','))
}

/// Parse a translation reply.
///
/// Models often answer translations one per line, so newlines count as
/// separators, and hyphens are dropped entirely.
pub fn parse_translation(text: &str) -> Vec<String> {
    let text = text.replace('\n', ",").replace('-', "");
    collect_unique(text.split(','))
}

fn collect_unique<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .filter_map(clean_keyword)
        .filter(|k| seen.insert(k.clone()))
        .collect()
}

/// Normalize one item. Returns `None` when nothing is left.
fn clean_keyword(raw: &str) -> Option<String> {
    let mut s = raw.trim();

    // "1. sky" / "2) sea" list numbering; a bare "2024." is a keyword
    let digits = s.len() - s.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0 {
        if let Some(rest) = s[digits..].strip_prefix(['.', ')']) {
            if !rest.trim().is_empty() {
                s = rest.trim_start();
            }
        }
    }

    s = s.trim_start_matches(['*', '•', '-']).trim();
    s = s
        .trim_matches(['"', '\'', '“', '”', '‘', '’', '`'])
        .trim_end_matches('.')
        .trim();

    if s.is_empty() {
        None
    } else {
        Some(s.to_lowercase())
    }
}
