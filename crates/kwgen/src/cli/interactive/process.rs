//! Guided processing flow.
//!
//! input directory → output directory → languages → append → confirm →
//! run → results table → optional embed.

use std::path::PathBuf;

use console::Style;
use dialoguer::{Confirm, Input, MultiSelect};
use kwgen_core::{FileDiscovery, Language};

use super::theme::{kwgen_theme, note, warn};
use super::{results, setup, LastRun, Session};
use crate::cli::process::ProcessArgs;

/// Walk the user through one processing run.
pub async fn guided_process(session: &mut Session) -> anyhow::Result<()> {
    let theme = kwgen_theme();

    // Input directory, re-prompting until it exists and holds images.
    let (input_dir, count) = loop {
        let Some(raw) = super::handle_interrupt(
            Input::<String>::with_theme(&theme)
                .with_prompt("Input directory")
                .interact_text(),
        )?
        else {
            return Ok(());
        };
        let path = expand(&raw);

        if !path.is_dir() {
            warn(format!("Directory not found: {}", path.display()));
            continue;
        }
        let files = FileDiscovery::new(&session.config.processing).discover(&path);
        if files.is_empty() {
            warn("No image files found in that directory.");
            continue;
        }
        note(format!(
            "Found {} image(s) ({:.1} MB)",
            files.len(),
            FileDiscovery::total_size(&files) as f64 / 1_000_000.0
        ));
        break (path, files.len());
    };

    let Some(raw_output) = super::handle_interrupt(
        Input::<String>::with_theme(&theme)
            .with_prompt("Output directory")
            .default(input_dir.display().to_string())
            .interact_text(),
    )?
    else {
        return Ok(());
    };
    let output_dir = expand(&raw_output);

    let Some(languages) = select_languages(&session.config.default_languages())? else {
        return Ok(());
    };

    let Some(append) = Confirm::with_theme(&theme)
        .with_prompt("Append to existing keyword files?")
        .default(session.config.processing.append)
        .interact_opt()?
    else {
        return Ok(());
    };

    // Cloud models need a key before the run starts.
    let model = session.config.general.last_model.clone();
    if let Some(provider) = setup::key_provider_for(&model) {
        if !provider.has_key(&session.config) {
            warn(format!("{model} needs a {} API key.", provider.label()));
            if !setup::prompt_api_key(&mut session.config, provider)? {
                return Ok(());
            }
        }
    }

    eprintln!();
    let bold = Style::new().for_stderr().bold();
    eprintln!(
        "  {}",
        bold.apply_to(format!("Ready to process {count} image(s)"))
    );
    let names: Vec<&str> = languages.iter().map(|l| l.name()).collect();
    note(format!(
        "Model: {model} | Languages: {} | Output: {} | {}",
        names.join(", "),
        output_dir.display(),
        if append { "append" } else { "overwrite" }
    ));
    eprintln!();

    if Confirm::with_theme(&theme)
        .with_prompt("Start processing?")
        .default(true)
        .interact_opt()?
        != Some(true)
    {
        return Ok(());
    }

    let args = ProcessArgs {
        input_dir,
        output_dir: Some(output_dir),
        model: Some(model),
        append,
        languages: languages.iter().map(|l| l.code().to_string()).collect(),
        quiet: true,
        ..ProcessArgs::default()
    };
    let outcome = crate::cli::process::run(&args, &mut session.config).await?;

    if outcome.results.is_empty() && outcome.failed.is_empty() {
        return Ok(());
    }

    eprintln!();
    eprintln!("{}", results::render_table(&outcome.results, &outcome.failed));
    eprintln!();

    let generated = !outcome.results.is_empty();
    session.last_run = Some(LastRun {
        output_dir: outcome.output_dir,
        languages: outcome.languages,
        results: outcome.results,
        failed: outcome.failed,
    });
    if !generated {
        warn("No keywords were generated.");
        return Ok(());
    }

    if Confirm::with_theme(&theme)
        .with_prompt("Embed keywords into these images now?")
        .default(false)
        .interact_opt()?
        == Some(true)
    {
        super::embed::guided_embed(session)?;
    }

    Ok(())
}

/// Multi-select of output languages. English is preselected along with
/// `defaults`. Re-prompts on an empty selection; `None` on Esc.
fn select_languages(defaults: &[Language]) -> anyhow::Result<Option<Vec<Language>>> {
    let theme = kwgen_theme();
    let names: Vec<&str> = Language::ALL.iter().map(|l| l.name()).collect();
    let checked: Vec<bool> = Language::ALL
        .iter()
        .map(|l| l.is_english() || defaults.contains(l))
        .collect();

    loop {
        let Some(picked) = MultiSelect::with_theme(&theme)
            .with_prompt("Languages (space to toggle)")
            .items(&names)
            .defaults(&checked)
            .interact_opt()?
        else {
            return Ok(None);
        };

        if picked.is_empty() {
            warn("Select at least one language.");
            continue;
        }
        return Ok(Some(picked.into_iter().map(|i| Language::ALL[i]).collect()));
    }
}

fn expand(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw.trim()).into_owned())
}
