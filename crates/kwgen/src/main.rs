//! kwgen CLI - multilingual keyword generation for images using vision LLMs.
//!
//! kwgen sends each image to a vision model, collects English keywords,
//! translates them into Danish and Vietnamese on request, writes one JSON
//! sidecar per language and can embed the keywords into the image files.
//!
//! # Usage
//!
//! ```bash
//! # Guided mode (no arguments, on a terminal)
//! kwgen
//!
//! # Generate English and Danish keywords for a folder
//! kwgen process --input-dir ./photos --languages en dk
//!
//! # Embed keywords from existing sidecars
//! kwgen embed --input-dir ./photos --yes
//!
//! # List models
//! kwgen models
//! ```

use std::io::IsTerminal;

use clap::{CommandFactory, Parser, Subcommand};

mod cli;
mod logging;

/// kwgen - multilingual image keywords from vision LLMs.
#[derive(Parser, Debug)]
#[command(name = "kwgen")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate keywords for a directory of images
    Process(cli::process::ProcessArgs),

    /// Embed keywords from existing sidecars into the image files
    Embed(cli::embed::EmbedArgs),

    /// List available vision models
    Models,

    /// View and manage configuration
    Config(cli::config::ConfigArgs),

    /// Start the guided, menu-driven mode
    Interactive,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match kwgen_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `kwgen config path`."
            );
            kwgen_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("kwgen v{}", kwgen_core::VERSION);

    match cli.command {
        Some(Commands::Process(args)) => cli::process::execute(args, config).await,
        Some(Commands::Embed(args)) => cli::embed::execute(args, &config),
        Some(Commands::Models) => cli::models::execute(&config).await,
        Some(Commands::Config(args)) => cli::config::execute(args),
        Some(Commands::Interactive) => cli::interactive::run(config).await,
        None if std::io::stdin().is_terminal() && std::io::stderr().is_terminal() => {
            cli::interactive::run(config).await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}
