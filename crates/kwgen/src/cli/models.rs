//! The `kwgen models` command.

use kwgen_core::llm::list_models;
use kwgen_core::{Config, ModelSpec};

/// List every model kwgen can use right now, marking the last used one.
///
/// Local servers that are not running contribute nothing; cloud models are
/// always listed.
pub async fn execute(config: &Config) -> anyhow::Result<()> {
    let models = list_models(&config.llm).await;
    tracing::debug!("{} model(s) available", models.len());

    for line in format_listing(&models, &config.general.last_model) {
        println!("{line}");
    }
    Ok(())
}

fn format_listing(models: &[String], current: &str) -> Vec<String> {
    models
        .iter()
        .map(|name| {
            let marker = if name == current { "*" } else { " " };
            format!("{marker} {name:<40} {}", ModelSpec::parse(name).provider)
        })
        .collect()
}
