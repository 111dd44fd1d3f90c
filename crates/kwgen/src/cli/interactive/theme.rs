//! dialoguer theme and banner for interactive mode.

use console::{style, Style};
use dialoguer::theme::ColorfulTheme;

/// `ColorfulTheme` with kwgen's colours: cyan prompts, green values.
pub fn kwgen_theme() -> ColorfulTheme {
    ColorfulTheme {
        prompt_prefix: style("?".to_string()).for_stderr().cyan(),
        prompt_style: Style::new().for_stderr().bold(),
        prompt_suffix: style("›".to_string()).for_stderr().bright().black(),
        active_item_prefix: style("▸".to_string()).for_stderr().cyan(),
        active_item_style: Style::new().for_stderr().cyan(),
        checked_item_prefix: style("◉".to_string()).for_stderr().green(),
        unchecked_item_prefix: style("○".to_string()).for_stderr().dim(),
        success_prefix: style("✓".to_string()).for_stderr().green(),
        success_suffix: style("·".to_string()).for_stderr().bright().black(),
        error_prefix: style("✗".to_string()).for_stderr().red(),
        error_style: Style::new().for_stderr().red(),
        values_style: Style::new().for_stderr().green(),
        ..ColorfulTheme::default()
    }
}

/// Print the version banner to stderr.
pub fn print_banner(model: &str) {
    let version_line = format!("kwgen v{}", kwgen_core::VERSION);
    let tagline = "Multilingual image keywords";
    let model_line = format!("model: {model}");

    let inner_width = [tagline.len(), model_line.len(), version_line.len()]
        .into_iter()
        .max()
        .unwrap_or(0)
        + 4;

    let cyan = Style::new().for_stderr().cyan();
    let dim = Style::new().for_stderr().dim();

    eprintln!();
    eprintln!("{}", cyan.apply_to(format!("  ╔{:═<inner_width$}╗", "")));
    eprintln!("{}", cyan.apply_to(format!("  ║{version_line:^inner_width$}║")));
    eprintln!("{}", cyan.apply_to(format!("  ║{tagline:^inner_width$}║")));
    eprintln!("{}", cyan.apply_to(format!("  ╚{:═<inner_width$}╝", "")));
    eprintln!("  {}", dim.apply_to(model_line));
    eprintln!();
}

/// Print a yellow warning line.
pub fn warn(message: impl std::fmt::Display) {
    eprintln!("  {}", Style::new().for_stderr().yellow().apply_to(message));
}

/// Print a dimmed note line.
pub fn note(message: impl std::fmt::Display) {
    eprintln!("  {}", Style::new().for_stderr().dim().apply_to(message));
}
