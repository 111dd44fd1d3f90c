//! Interactive mode: the menu-driven experience for bare `kwgen` on a TTY.
//!
//! Flows reuse the same processing and embedding code as the subcommands.
//! The results of the last processing run are kept for the embed flow.

pub mod embed;
pub mod process;
pub mod results;
pub mod setup;
pub mod theme;

use console::Style;
use dialoguer::Select;
use kwgen_core::{Config, ImageKeywords, Language};
use std::path::PathBuf;

use crate::cli::process::FailedImage;

/// State carried between menu selections.
pub struct Session {
    pub config: Config,
    pub last_run: Option<LastRun>,
}

/// The most recent processing run.
pub struct LastRun {
    pub output_dir: PathBuf,
    pub languages: Vec<Language>,
    pub results: Vec<ImageKeywords>,
    pub failed: Vec<FailedImage>,
}

/// Turn a dialoguer result into `Ok(Some(value))`, `Ok(None)` on interrupt
/// (Ctrl+C / terminal disconnect), and `Err` for other I/O failures.
///
/// For `interact_text()` / `interact()` calls that lack an `_opt` variant.
fn handle_interrupt<T>(result: dialoguer::Result<T>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(dialoguer::Error::IO(e)) if e.kind() == std::io::ErrorKind::Interrupted => Ok(None),
        Err(e) => Err(e.into()),
    }
}

const MENU_ITEMS: &[&str] = &[
    "Process images",
    "Embed keywords",
    "Select model",
    "API keys",
    "Configuration",
    "Exit",
];

/// Entry point for interactive mode.
pub async fn run(config: Config) -> anyhow::Result<()> {
    theme::print_banner(&config.general.last_model);

    let theme = theme::kwgen_theme();
    let mut session = Session {
        config,
        last_run: None,
    };

    loop {
        let selection = Select::with_theme(&theme)
            .with_prompt("What would you like to do?")
            .items(MENU_ITEMS)
            .default(0)
            .interact_opt()?;

        let outcome = match selection {
            Some(0) => process::guided_process(&mut session).await,
            Some(1) => embed::guided_embed(&mut session),
            Some(2) => setup::select_model(&mut session.config).await,
            Some(3) => setup::manage_api_keys(&mut session.config),
            Some(4) => show_config(&session.config),
            _ => break,
        };

        // A failed flow returns to the menu instead of ending the session.
        if let Err(e) = outcome {
            let red = Style::new().for_stderr().red();
            eprintln!("  {} {e:#}", red.apply_to("✗"));
        }
    }

    Ok(())
}

/// Summary of the current settings, with the full TOML on request.
fn show_config(config: &Config) -> anyhow::Result<()> {
    let theme = theme::kwgen_theme();
    let dim = Style::new().for_stderr().dim();
    let cyan = Style::new().for_stderr().cyan();
    let label = Style::new().for_stderr().bold();

    loop {
        eprintln!();
        eprintln!("  {}", cyan.apply_to("Current configuration:"));
        eprintln!();

        let config_path = Config::default_path();
        let path_note = if config_path.exists() {
            "(exists)"
        } else {
            "(using defaults)"
        };
        let languages: Vec<&str> = config
            .default_languages()
            .into_iter()
            .map(Language::name)
            .collect();

        for (name, value) in [
            (
                "Config file:",
                format!("{} {}", config_path.display(), dim.apply_to(path_note)),
            ),
            ("Model:", config.general.last_model.clone()),
            ("Languages:", languages.join(", ")),
            ("Parallel:", format!("{} image(s)", config.processing.parallel)),
            (
                "Retries:",
                format!(
                    "{} (base delay {} ms)",
                    config.pipeline.retry_attempts, config.pipeline.retry_delay_ms
                ),
            ),
            ("Timeout:", format!("{} ms", config.limits.llm_timeout_ms)),
            ("Ollama:", config.llm.ollama.endpoint.clone()),
            ("LM Studio:", config.llm.lmstudio.endpoint.clone()),
            ("API keys:", setup::key_summary(config)),
        ] {
            eprintln!("    {:<20} {value}", label.apply_to(name));
        }
        eprintln!();

        let items = &["View full config (TOML)", "Show config file path", "Back"];
        let selection = Select::with_theme(&theme)
            .with_prompt("Configuration")
            .items(items)
            .default(0)
            .interact_opt()?;

        match selection {
            Some(0) => {
                let toml = config.to_toml()?;
                eprintln!();
                eprintln!("{}", dim.apply_to("─".repeat(50)));
                eprintln!("{toml}");
                eprintln!("{}", dim.apply_to("─".repeat(50)));
                eprintln!();
            }
            Some(1) => {
                eprintln!();
                eprintln!("  {}", config_path.display());
                eprintln!();
            }
            _ => break,
        }
    }

    Ok(())
}
