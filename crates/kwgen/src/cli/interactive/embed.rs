//! Guided embed flow over the images of the last processing run.

use dialoguer::{Confirm, MultiSelect};

use super::theme::{kwgen_theme, note, warn};
use super::{results, Session};
use crate::cli::embed::{collect_jobs, confirm_message, embed_all};

/// Choose images from the last run and embed their keywords.
pub fn guided_embed(session: &mut Session) -> anyhow::Result<()> {
    let theme = kwgen_theme();
    let Some(run) = session.last_run.as_mut().filter(|r| !r.results.is_empty()) else {
        warn("Process some images first.");
        return Ok(());
    };

    let labels: Vec<String> = run
        .results
        .iter()
        .map(|r| {
            if r.embedded {
                format!("{} (embedded)", r.file_name)
            } else {
                r.file_name.clone()
            }
        })
        .collect();
    let checked: Vec<bool> = run.results.iter().map(|r| !r.embedded).collect();

    let Some(picked) = MultiSelect::with_theme(&theme)
        .with_prompt("Images to embed into (space to toggle)")
        .items(&labels)
        .defaults(&checked)
        .interact_opt()?
    else {
        return Ok(());
    };
    if picked.is_empty() {
        note("Nothing selected.");
        return Ok(());
    }

    // Keywords come from the sidecars so edits made since the run are kept.
    let paths: Vec<_> = picked
        .iter()
        .map(|&i| run.results[i].file_path.clone())
        .collect();
    let jobs = collect_jobs(&paths, &run.output_dir, &run.languages);
    if jobs.is_empty() {
        warn("None of the selected images can be embedded into (JPEG and PNG only).");
        return Ok(());
    }

    if Confirm::with_theme(&theme)
        .with_prompt(confirm_message(run.languages.len(), jobs.len()))
        .default(false)
        .interact_opt()?
        != Some(true)
    {
        return Ok(());
    }

    let summary = embed_all(&jobs, &run.languages);
    for (path, message) in &summary.failed {
        warn(format!("Failed: {} - {message}", path.display()));
    }
    for row in run.results.iter_mut() {
        if summary.embedded.contains(&row.file_path) {
            row.embedded = true;
        }
    }
    note(format!(
        "Embedded keywords into {} of {} image(s).",
        summary.embedded.len(),
        jobs.len()
    ));

    eprintln!();
    eprintln!("{}", results::render_table(&run.results, &run.failed));
    eprintln!();
    Ok(())
}
