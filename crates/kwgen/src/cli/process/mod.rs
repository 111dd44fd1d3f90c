//! The `kwgen process` command.

mod batch;
mod setup;
pub mod types;

pub use batch::{BatchOutcome, FailedImage};
pub use types::OutputFormat;

use clap::Args;
use kwgen_core::{Config, FileDiscovery};
use std::path::PathBuf;

use batch::run_batch;
use setup::setup_pipeline;

/// Arguments for the `process` command.
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Directory of images to process
    #[arg(short, long)]
    pub input_dir: PathBuf,

    /// Directory for the keyword sidecars (defaults to the input directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Vision model, e.g. llava, lmstudio:qwen2-vl, gpt-4o, gemini-1.5-flash
    /// (defaults to the last used model)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Merge new keywords into existing sidecars instead of replacing them
    #[arg(long)]
    pub append: bool,

    /// Languages to generate: en, dk, vi (defaults to the configured languages)
    #[arg(short, long, num_args = 1..)]
    pub languages: Vec<String>,

    /// OpenAI API key (saved to the config file)
    #[arg(long)]
    pub openai_key: Option<String>,

    /// Google AI API key (saved to the config file)
    #[arg(long)]
    pub google_key: Option<String>,

    /// Embed the keywords into the image files after writing sidecars
    #[arg(long)]
    pub embed: bool,

    /// Skip images whose sidecars already exist for every language
    #[arg(long)]
    pub skip_existing: bool,

    /// Number of images processed concurrently
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Write a report of all processed images to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Suppress per-image keyword output (set by interactive mode).
    #[arg(skip)]
    pub quiet: bool,
}

/// Manual Default for building `ProcessArgs` outside of clap.
///
/// Matches the clap defaults above. Used by interactive mode.
impl Default for ProcessArgs {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::new(),
            output_dir: None,
            model: None,
            append: false,
            languages: Vec::new(),
            openai_key: None,
            google_key: None,
            embed: false,
            skip_existing: false,
            parallel: None,
            report: None,
            format: OutputFormat::Json,
            quiet: false,
        }
    }
}

/// Execute the process command.
pub async fn execute(args: ProcessArgs, mut config: Config) -> anyhow::Result<()> {
    let outcome = run(&args, &mut config).await?;
    if outcome.stats.total() > 0 && outcome.stats.succeeded == 0 {
        anyhow::bail!(
            "No images were processed successfully. Check that the model '{}' is available \
             (`kwgen models`).",
            outcome.model
        );
    }
    Ok(())
}

/// Process every image under `args.input_dir` and return what happened.
///
/// `config` is updated with any API keys passed in `args`.
pub async fn run(args: &ProcessArgs, config: &mut Config) -> anyhow::Result<BatchOutcome> {
    if !args.input_dir.is_dir() {
        anyhow::bail!("Input directory not found: {}", args.input_dir.display());
    }

    let ctx = setup_pipeline(args, config)?;

    let files: Vec<PathBuf> = FileDiscovery::new(&config.processing)
        .discover(&args.input_dir)
        .into_iter()
        .map(|f| f.path)
        .collect();

    if files.is_empty() {
        println!("No image files found in {}", args.input_dir.display());
        return Ok(BatchOutcome::empty(ctx));
    }
    tracing::info!(
        "Found {} image(s), using model {} via {}",
        files.len(),
        ctx.pipeline.model(),
        ctx.pipeline.provider_name()
    );

    run_batch(ctx, args, files).await
}
