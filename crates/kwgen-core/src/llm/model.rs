//! Model names, provider routing and the model catalog.

use std::fmt;

use crate::config::LlmConfig;

use super::lmstudio::LmStudioProvider;
use super::ollama::OllamaProvider;

/// Prefix that routes a model to LM Studio instead of Ollama.
pub const LMSTUDIO_PREFIX: &str = "lmstudio:";

/// Cloud vision models always offered in the catalog.
pub const CLOUD_MODELS: &[&str] = &["gpt-4o", "gpt-4o-mini", "gemini-1.5-flash", "gemini-1.5-pro"];

/// Backend that serves a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Ollama,
    LmStudio,
    OpenAi,
    Google,
}

impl ProviderKind {
    pub fn is_local(self) -> bool {
        matches!(self, ProviderKind::Ollama | ProviderKind::LmStudio)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Ollama => write!(f, "ollama"),
            ProviderKind::LmStudio => write!(f, "lmstudio"),
            ProviderKind::OpenAi => write!(f, "openai"),
            ProviderKind::Google => write!(f, "google"),
        }
    }
}

/// A model name as the user typed it, resolved to a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    /// Name as given, e.g. `lmstudio:llava-v1.6`
    pub name: String,
    /// Backend serving the model
    pub provider: ProviderKind,
    /// Name sent to the backend API, e.g. `llava-v1.6`
    pub api_model: String,
}

impl ModelSpec {
    /// Route a model name to its backend.
    ///
    /// `lmstudio:` → LM Studio, `gpt-4*` → OpenAI, `gemini*` → Google,
    /// everything else → Ollama.
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        let (provider, api_model) = if let Some(rest) = name.strip_prefix(LMSTUDIO_PREFIX) {
            (ProviderKind::LmStudio, rest)
        } else if name.starts_with("gpt-4") {
            (ProviderKind::OpenAi, name)
        } else if name.starts_with("gemini") {
            (ProviderKind::Google, name)
        } else {
            (ProviderKind::Ollama, name)
        };

        Self {
            name: name.to_string(),
            provider,
            api_model: api_model.to_string(),
        }
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Keep only Ollama models that can look at images.
pub fn is_vision_model(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("llava") || lower.contains("vision")
}

/// List every model that can be selected right now.
///
/// Local servers that are not running contribute nothing; cloud models are
/// always listed.
pub async fn list_models(config: &LlmConfig) -> Vec<String> {
    let mut models = Vec::new();

    let ollama = OllamaProvider::new(&config.ollama.endpoint, "");
    match ollama.list_models().await {
        Ok(names) => models.extend(names.into_iter().filter(|n| is_vision_model(n))),
        Err(e) => tracing::warn!("Could not list Ollama models: {e}"),
    }

    let lmstudio = LmStudioProvider::new(&config.lmstudio.endpoint, "");
    match lmstudio.list_models().await {
        Ok(names) => models.extend(names.into_iter().map(|n| format!("{LMSTUDIO_PREFIX}{n}"))),
        Err(e) => tracing::debug!("Could not list LM Studio models: {e}"),
    }

    models.extend(CLOUD_MODELS.iter().map(|m| m.to_string()));
    models
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lmstudio_strips_prefix() {
        let spec = ModelSpec::parse("lmstudio:llava-v1.6-mistral");
        assert_eq!(spec.provider, ProviderKind::LmStudio);
        assert_eq!(spec.api_model, "llava-v1.6-mistral");
        assert_eq!(spec.name, "lmstudio:llava-v1.6-mistral");
    }

    #[test]
    fn test_parse_cloud_models() {
        assert_eq!(ModelSpec::parse("gpt-4o").provider, ProviderKind::OpenAi);
        assert_eq!(
            ModelSpec::parse("gpt-4-vision-preview").provider,
            ProviderKind::OpenAi
        );
        assert_eq!(
            ModelSpec::parse("gemini-pro-vision").provider,
            ProviderKind::Google
        );
    }

    #[test]
    fn test_parse_defaults_to_ollama() {
        let spec = ModelSpec::parse("llama3.2-vision:11b");
        assert_eq!(spec.provider, ProviderKind::Ollama);
        assert_eq!(spec.api_model, "llama3.2-vision:11b");
        // gpt-3.5 is not a vision model prefix, so it falls through to Ollama
        assert_eq!(ModelSpec::parse("gpt-3.5").provider, ProviderKind::Ollama);
    }

    #[test]
    fn test_vision_filter() {
        assert!(is_vision_model("llava:13b"));
        assert!(is_vision_model("llama3.2-Vision"));
        assert!(!is_vision_model("mistral:7b"));
    }

    #[test]
    fn test_local_providers() {
        assert!(ProviderKind::Ollama.is_local());
        assert!(ProviderKind::LmStudio.is_local());
        assert!(!ProviderKind::Google.is_local());
    }

    #[tokio::test]
    async fn test_list_models_without_local_servers_returns_cloud_models() {
        let mut config = LlmConfig::default();
        // Port 9 (discard) is never an HTTP server
        config.ollama.endpoint = "http://127.0.0.1:9".into();
        config.lmstudio.endpoint = "http://127.0.0.1:9/v1".into();
        let models = list_models(&config).await;
        assert_eq!(models, CLOUD_MODELS.iter().map(|s| s.to_string()).collect::<Vec<_>>());
    }
}
