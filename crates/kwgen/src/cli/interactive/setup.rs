//! Model selection and API key entry, both persisted to the config file.

use dialoguer::{Password, Select};
use kwgen_core::llm::list_models;
use kwgen_core::{Config, ModelSpec, ProviderKind};

use super::theme::{kwgen_theme, note, warn};
use crate::cli::config::{save_api_key, save_last_model, KeyProvider};

/// Pick a model from the catalog and remember it as `last_model`.
pub async fn select_model(config: &mut Config) -> anyhow::Result<()> {
    let theme = kwgen_theme();
    note("Looking for models...");

    let models = list_models(&config.llm).await;
    if models.is_empty() {
        warn("No models available. Start Ollama or LM Studio, or add an API key.");
        return Ok(());
    }

    let labels: Vec<String> = models.iter().map(|m| model_label(m)).collect();
    let current = models
        .iter()
        .position(|m| *m == config.general.last_model)
        .unwrap_or(0);

    let Some(choice) = Select::with_theme(&theme)
        .with_prompt("Vision model")
        .items(&labels)
        .default(current)
        .interact_opt()?
    else {
        return Ok(());
    };

    let model = models[choice].clone();
    config.general.last_model = model.clone();
    match save_last_model(&model) {
        Ok(path) => note(format!("Saved to {}", path.display())),
        Err(e) => warn(format!("Could not save model choice: {e}")),
    }

    if let Some(provider) = key_provider_for(&model) {
        if !provider.has_key(config) {
            warn(format!("{} needs an API key.", provider.label()));
            prompt_api_key(config, provider)?;
        }
    }
    Ok(())
}

/// Enter or replace the OpenAI and Google keys.
pub fn manage_api_keys(config: &mut Config) -> anyhow::Result<()> {
    let theme = kwgen_theme();

    loop {
        let mut items: Vec<String> = KeyProvider::ALL
            .iter()
            .map(|&p| format!("{:<10} {}", p.label(), key_status(config, p)))
            .collect();
        items.push("Back".to_string());

        match Select::with_theme(&theme)
            .with_prompt("API keys")
            .items(&items)
            .default(0)
            .interact_opt()?
        {
            Some(i) if i < KeyProvider::ALL.len() => {
                prompt_api_key(config, KeyProvider::ALL[i])?;
            }
            _ => return Ok(()),
        }
    }
}

/// Ask for a key with masked input and persist it. Returns whether a key was set.
pub fn prompt_api_key(config: &mut Config, provider: KeyProvider) -> anyhow::Result<bool> {
    let theme = kwgen_theme();
    let Some(key) = super::handle_interrupt(
        Password::with_theme(&theme)
            .with_prompt(format!(
                "{} API key (leave empty to keep the current one)",
                provider.label()
            ))
            .allow_empty_password(true)
            .interact(),
    )?
    else {
        return Ok(false);
    };

    let key = key.trim();
    if key.is_empty() {
        return Ok(false);
    }

    provider.apply(config, key);
    match save_api_key(provider, key) {
        Ok(path) => note(format!("Key saved to {}", path.display())),
        Err(e) => {
            warn(format!("Could not save to config: {e}"));
            note("Using the key for this session only.");
        }
    }
    Ok(true)
}

/// One-line status of both cloud keys.
pub fn key_summary(config: &Config) -> String {
    KeyProvider::ALL
        .iter()
        .map(|&p| format!("{} {}", p.label(), key_status(config, p)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Cloud provider that serves `model`, if any.
pub fn key_provider_for(model: &str) -> Option<KeyProvider> {
    match ModelSpec::parse(model).provider {
        ProviderKind::OpenAi => Some(KeyProvider::Openai),
        ProviderKind::Google => Some(KeyProvider::Google),
        ProviderKind::Ollama | ProviderKind::LmStudio => None,
    }
}

fn key_status(config: &Config, provider: KeyProvider) -> String {
    let raw = provider.configured_key(config);
    match (raw.starts_with("${"), provider.has_key(config)) {
        (true, true) => format!("(from {})", &raw[2..raw.len().saturating_sub(1)]),
        (false, true) => "(set)".to_string(),
        (_, false) => "(not set)".to_string(),
    }
}

fn model_label(model: &str) -> String {
    let spec = ModelSpec::parse(model);
    let kind = if spec.provider.is_local() { "local" } else { "cloud" };
    format!("{model}  ({}, {kind})", spec.provider)
}
