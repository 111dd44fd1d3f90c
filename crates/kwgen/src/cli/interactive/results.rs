//! Results table shown after an interactive processing run.

use kwgen_core::{ImageKeywords, KeywordSet, Language};

use crate::cli::process::FailedImage;

/// Width of each keyword column.
pub const KEYWORD_WIDTH: usize = 30;
const FILE_WIDTH: usize = 24;

/// Word-wrap `text` to lines of at most `width` characters.
///
/// Words longer than `width` are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            lines.push(word.drain(..width).collect());
        }
        let word: String = word.into_iter().collect();
        if word.is_empty() {
            continue;
        }

        let needed = if line.is_empty() {
            word.chars().count()
        } else {
            line.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(&word);
    }

    if !line.is_empty() || lines.is_empty() {
        lines.push(line);
    }
    lines
}

/// Render one row per image with File, English, Danish and Vietnamese
/// columns. Embedded images are marked with `*`, failed images with `!`.
pub fn render_table(results: &[ImageKeywords], failed: &[FailedImage]) -> String {
    let header = std::iter::once("File").chain(Language::ALL.iter().map(|l| l.name()));
    let separator = std::iter::once(FILE_WIDTH)
        .chain(Language::ALL.iter().map(|_| KEYWORD_WIDTH))
        .map(|w| "-".repeat(w))
        .collect::<Vec<_>>();

    let mut out = vec![
        format_row(&header.map(str::to_string).collect::<Vec<_>>()),
        format_row(&separator),
    ];

    for image in results {
        let marker = if image.embedded { "* " } else { "  " };
        push_rows(&mut out, &format!("{marker}{}", image.file_name), &image.keywords);
    }
    for image in failed {
        push_rows(&mut out, &format!("! {}", image.file_name()), &image.keywords);
    }

    out.join("\n")
}

fn push_rows(out: &mut Vec<String>, label: &str, keywords: &KeywordSet) {
    let columns: Vec<Vec<String>> = std::iter::once(wrap_text(label, FILE_WIDTH))
        .chain(
            Language::ALL
                .iter()
                .map(|&l| wrap_text(&keywords.get(l).join(", "), KEYWORD_WIDTH)),
        )
        .collect();

    let height = columns.iter().map(Vec::len).max().unwrap_or(1);
    for i in 0..height {
        let cells: Vec<String> = columns
            .iter()
            .map(|c| c.get(i).cloned().unwrap_or_default())
            .collect();
        out.push(format_row(&cells));
    }
}

fn format_row(cells: &[String]) -> String {
    let mut row = String::new();
    for (i, cell) in cells.iter().enumerate() {
        let width = if i == 0 { FILE_WIDTH } else { KEYWORD_WIDTH };
        row.push_str(&format!("{cell:<width$}"));
        if i + 1 < cells.len() {
            row.push_str(" | ");
        }
    }
    row.trim_end().to_string()
}
