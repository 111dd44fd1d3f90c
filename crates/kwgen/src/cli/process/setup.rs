//! Pipeline construction for the process command.

use std::path::PathBuf;

use kwgen_core::language::parse_languages;
use kwgen_core::{Config, KeywordPipeline, Language, ModelSpec, ProcessOptions};

use super::ProcessArgs;
use crate::cli::config::{save_api_key, KeyProvider};

/// Everything a batch run needs, assembled from args and config.
pub(crate) struct ProcessContext {
    pub pipeline: KeywordPipeline,
    pub output_dir: PathBuf,
    pub languages: Vec<Language>,
}

/// Build the pipeline for `args`.
///
/// API keys given on the command line are persisted first so the provider
/// factory sees them.
pub(crate) fn setup_pipeline(
    args: &ProcessArgs,
    config: &mut Config,
) -> anyhow::Result<ProcessContext> {
    for (provider, key) in [
        (KeyProvider::Openai, &args.openai_key),
        (KeyProvider::Google, &args.google_key),
    ] {
        if let Some(key) = key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            provider.apply(config, key);
            if let Err(e) = save_api_key(provider, key) {
                tracing::warn!("Could not save {} API key: {e}", provider.label());
            }
        }
    }

    let languages = resolve_languages(&args.languages, config)?;
    let model = ModelSpec::parse(args.model.as_deref().unwrap_or(&config.general.last_model));
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| args.input_dir.clone());

    let options = ProcessOptions {
        languages: languages.clone(),
        parallel: args.parallel.unwrap_or(config.processing.parallel).max(1),
        embed: args.embed,
        skip_existing: args.skip_existing,
    };

    let pipeline = KeywordPipeline::from_config(
        config,
        &model,
        &output_dir,
        args.append || config.processing.append,
        options,
    )?;

    tracing::debug!(
        "Model {} ({}), languages {:?}, output {:?}",
        model,
        model.provider,
        languages,
        output_dir
    );

    Ok(ProcessContext {
        pipeline,
        output_dir,
        languages,
    })
}

/// Languages from the command line, else from config.
fn resolve_languages(codes: &[String], config: &Config) -> anyhow::Result<Vec<Language>> {
    if codes.is_empty() {
        return Ok(config.default_languages());
    }
    let languages = parse_languages(codes).map_err(|e| anyhow::anyhow!(e))?;
    if languages.is_empty() {
        anyhow::bail!("Select at least one language");
    }
    Ok(languages)
}
