//! The `kwgen config` command, plus the config file edits other commands
//! make (API keys, last used model).
//!
//! Edits go through `toml_edit` so comments and layout in a hand-written
//! config survive.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Subcommand, ValueEnum};
use kwgen_core::Config;
use toml_edit::{DocumentMut, Item, Table};

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,

    /// Show config file path
    Path,

    /// Initialize a new config file with defaults
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Store an API key for a cloud provider
    SetKey {
        /// Provider the key belongs to
        #[arg(value_enum)]
        provider: KeyProvider,

        /// The API key
        key: String,
    },
}

/// Cloud providers that need an API key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum KeyProvider {
    /// OpenAI (gpt-4o models)
    Openai,
    /// Google AI (gemini models)
    Google,
}

impl KeyProvider {
    pub const ALL: [KeyProvider; 2] = [KeyProvider::Openai, KeyProvider::Google];

    /// Section name under `[llm]`.
    pub fn section(self) -> &'static str {
        match self {
            KeyProvider::Openai => "openai",
            KeyProvider::Google => "google",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            KeyProvider::Openai => "OpenAI",
            KeyProvider::Google => "Google AI",
        }
    }

    pub fn env_var(self) -> &'static str {
        match self {
            KeyProvider::Openai => "OPENAI_API_KEY",
            KeyProvider::Google => "GOOGLE_API_KEY",
        }
    }

    /// The raw configured value, possibly a `${VAR}` reference.
    pub fn configured_key(self, config: &Config) -> &str {
        match self {
            KeyProvider::Openai => &config.llm.openai.api_key,
            KeyProvider::Google => &config.llm.google.api_key,
        }
    }

    /// Update the in-memory config to use `key`.
    pub fn apply(self, config: &mut Config, key: &str) {
        match self {
            KeyProvider::Openai => config.llm.openai.api_key = key.to_string(),
            KeyProvider::Google => config.llm.google.api_key = key.to_string(),
        }
    }

    /// True when the configured value resolves to a non-empty key.
    pub fn has_key(self, config: &Config) -> bool {
        kwgen_core::llm::provider::resolve_env_var(self.configured_key(config)).is_some()
    }
}

/// Execute the config command.
pub fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let config = Config::load()?;
            println!("{}", config.to_toml()?);
        }

        ConfigCommand::Path => {
            println!("{}", Config::default_path().display());
        }

        ConfigCommand::Init { force } => {
            let path = Config::default_path();

            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at: {}\nUse --force to overwrite.",
                    path.display()
                );
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, Config::default().to_toml()?)?;

            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }

        ConfigCommand::SetKey { provider, key } => {
            let key = key.trim();
            if key.is_empty() {
                anyhow::bail!("API key for {} must not be empty", provider.label());
            }
            let path = save_api_key(provider, key)?;
            println!("{} API key saved to {}", provider.label(), path.display());
        }
    }

    Ok(())
}

/// Persist an API key to the default config file. Returns the file path.
pub fn save_api_key(provider: KeyProvider, key: &str) -> anyhow::Result<PathBuf> {
    let path = Config::default_path();
    edit_config_file(&path, |doc| set_api_key(doc, provider, key))?;
    tracing::debug!("Saved {} API key to {:?}", provider.label(), path);
    Ok(path)
}

/// Persist the last used model to the default config file.
pub fn save_last_model(model: &str) -> anyhow::Result<PathBuf> {
    let path = Config::default_path();
    edit_config_file(&path, |doc| set_last_model(doc, model))?;
    tracing::debug!("Saved last model {model:?} to {:?}", path);
    Ok(path)
}

/// Read `path` (empty if missing), apply `edit`, write it back.
fn edit_config_file(
    path: &Path,
    edit: impl FnOnce(&mut DocumentMut) -> anyhow::Result<()>,
) -> anyhow::Result<()> {
    let content = if path.exists() {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?
    } else {
        String::new()
    };

    let mut doc: DocumentMut = content
        .parse()
        .with_context(|| format!("Config file {} is not valid TOML", path.display()))?;
    edit(&mut doc)?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, doc.to_string())
        .with_context(|| format!("Failed to write config file {}", path.display()))?;
    Ok(())
}

fn set_api_key(doc: &mut DocumentMut, provider: KeyProvider, key: &str) -> anyhow::Result<()> {
    let created = !doc.contains_key("llm");
    let llm = child_table(doc.as_table_mut(), "llm")?;
    if created {
        llm.set_implicit(true);
    }
    replace_value(child_table(llm, provider.section())?, "api_key", key);
    Ok(())
}

fn set_last_model(doc: &mut DocumentMut, model: &str) -> anyhow::Result<()> {
    replace_value(child_table(doc.as_table_mut(), "general")?, "last_model", model);
    Ok(())
}

/// Set `key` to `new`, keeping the comments around an existing entry.
fn replace_value(table: &mut Table, key: &str, new: &str) {
    let mut item = toml_edit::value(new);
    if let (Some(old), Some(value)) = (table.get(key).and_then(Item::as_value), item.as_value_mut()) {
        *value.decor_mut() = old.decor().clone();
    }
    table[key] = item;
}

fn child_table<'a>(parent: &'a mut Table, key: &str) -> anyhow::Result<&'a mut Table> {
    parent
        .entry(key)
        .or_insert(Item::Table(Table::new()))
        .as_table_mut()
        .ok_or_else(|| anyhow::anyhow!("`{key}` in the config file is not a table"))
}
