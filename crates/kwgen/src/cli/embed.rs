//! The `kwgen embed` command: write keywords from existing sidecars into
//! JPEG EXIF or PNG text metadata.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::Args;
use dialoguer::Confirm;
use kwgen_core::language::parse_languages;
use kwgen_core::pipeline::ImageKind;
use kwgen_core::{embed_keywords, load_keyword_set, Config, FileDiscovery, KeywordSet, Language};

/// Arguments for the `embed` command.
#[derive(Args, Debug)]
pub struct EmbedArgs {
    /// Directory of images to embed into
    #[arg(short, long)]
    pub input_dir: PathBuf,

    /// Directory holding the keyword sidecars (defaults to the input directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Languages to embed: en, dk, vi (defaults to the configured languages)
    #[arg(short, long, num_args = 1..)]
    pub languages: Vec<String>,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

/// One image and the keywords to embed into it.
#[derive(Debug)]
pub struct EmbedJob {
    pub path: PathBuf,
    pub keywords: KeywordSet,
}

/// Result of embedding a set of jobs.
#[derive(Debug, Default)]
pub struct EmbedSummary {
    pub embedded: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Execute the embed command.
pub fn execute(args: EmbedArgs, config: &Config) -> anyhow::Result<()> {
    if !args.input_dir.is_dir() {
        anyhow::bail!("Input directory not found: {}", args.input_dir.display());
    }

    let languages = if args.languages.is_empty() {
        config.default_languages()
    } else {
        parse_languages(&args.languages).map_err(|e| anyhow::anyhow!(e))?
    };
    let output_dir = args.output_dir.as_deref().unwrap_or(&args.input_dir);

    let files: Vec<PathBuf> = FileDiscovery::new(&config.processing)
        .discover(&args.input_dir)
        .into_iter()
        .map(|f| f.path)
        .collect();
    let jobs = collect_jobs(&files, output_dir, &languages);

    if jobs.is_empty() {
        println!(
            "No keyword sidecars found for JPEG or PNG images in {}",
            output_dir.display()
        );
        return Ok(());
    }

    if !args.yes {
        if !std::io::stdin().is_terminal() {
            anyhow::bail!("Refusing to modify images without confirmation. Pass --yes to proceed.");
        }
        let proceed = Confirm::new()
            .with_prompt(confirm_message(languages.len(), jobs.len()))
            .default(false)
            .interact_opt()?;
        if proceed != Some(true) {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let summary = embed_all(&jobs, &languages);
    for (path, message) in &summary.failed {
        eprintln!("  Failed: {} - {message}", path.display());
    }
    println!(
        "Embedded keywords into {} of {} image(s).",
        summary.embedded.len(),
        jobs.len()
    );

    if summary.embedded.is_empty() {
        anyhow::bail!("No images were updated");
    }
    Ok(())
}

/// Prompt shown before any image file is modified.
pub fn confirm_message(languages: usize, images: usize) -> String {
    format!(
        "This will embed keywords for {languages} language(s) into {images} image file(s). Continue?"
    )
}

/// Pair each embeddable image with its sidecar keywords.
///
/// Images that are not JPEG or PNG, that have no sidecar keywords for
/// `languages`, or whose sidecars cannot be read are left out.
pub fn collect_jobs(
    files: &[PathBuf],
    output_dir: &Path,
    languages: &[Language],
) -> Vec<EmbedJob> {
    let mut jobs = Vec::new();
    for path in files {
        match ImageKind::sniff(path) {
            Ok(Some(ImageKind::Jpeg | ImageKind::Png)) => {}
            Ok(_) => {
                tracing::debug!("Not embeddable, skipping {:?}", path);
                continue;
            }
            Err(e) => {
                tracing::warn!("Could not read {:?}: {e}", path);
                continue;
            }
        }

        let keywords = match load_keyword_set(path, output_dir, languages) {
            Ok(keywords) => keywords,
            Err(e) => {
                tracing::warn!("Skipping {:?}: {e}", path);
                continue;
            }
        };
        if keywords.total() == 0 {
            tracing::debug!("No sidecar keywords for {:?}", path);
            continue;
        }
        jobs.push(EmbedJob {
            path: path.clone(),
            keywords,
        });
    }
    jobs
}

/// Embed every job. A failing image never stops the others.
pub fn embed_all(jobs: &[EmbedJob], languages: &[Language]) -> EmbedSummary {
    let mut summary = EmbedSummary::default();
    for job in jobs {
        match embed_keywords(&job.path, &job.keywords, languages) {
            Ok(()) => {
                tracing::info!("Embedded keywords into {:?}", job.path);
                summary.embedded.push(job.path.clone());
            }
            Err(e) => {
                tracing::error!("{e}");
                summary.failed.push((job.path.clone(), e.to_string()));
            }
        }
    }
    summary
}
