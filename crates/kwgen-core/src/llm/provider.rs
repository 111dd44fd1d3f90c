//! LLM provider trait and request/response types.
//!
//! Defines the interface that all LLM providers implement, plus the
//! factory that creates the right provider from a parsed model name.

use crate::config::LlmConfig;
use crate::error::PipelineError;
use async_trait::async_trait;
use base64::Engine;
use std::time::Duration;

use super::model::{ModelSpec, ProviderKind};

/// Base64-encoded image ready to send to an LLM API.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type (e.g., "image/jpeg", "image/png")
    pub media_type: String,
}

impl ImageInput {
    /// Create an `ImageInput` from raw bytes and format string.
    ///
    /// The format is the image format identifier (e.g., "jpeg", "png", "webp").
    pub fn from_bytes(bytes: &[u8], format: &str) -> Self {
        let media_type = match format {
            "jpeg" | "jpg" => "image/jpeg",
            "png" => "image/png",
            "webp" => "image/webp",
            "gif" => "image/gif",
            "bmp" => "image/bmp",
            other => {
                tracing::warn!("Unknown image format '{other}', defaulting to image/jpeg");
                "image/jpeg"
            }
        };

        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type.to_string(),
        }
    }

    /// Return a data URL suitable for OpenAI-style APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// A single prompt sent to a model, with or without an image attached.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// Image to look at. Translation requests are text-only.
    pub image: Option<ImageInput>,
    /// Text prompt for the model
    pub prompt: String,
    /// Optional system message (chat-style APIs only)
    pub system: Option<String>,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl LlmRequest {
    /// A prompt about an image.
    pub fn with_image(prompt: impl Into<String>, image: ImageInput) -> Self {
        Self {
            image: Some(image),
            ..Self::text(prompt)
        }
    }

    /// A text-only prompt.
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            image: None,
            prompt: prompt.into(),
            system: None,
            max_tokens: 300,
            temperature: 0.2,
        }
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// The response from an LLM call.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Generated text
    pub text: String,
    /// Model identifier used
    pub model: String,
    /// Number of tokens used (input + output), if reported
    pub tokens_used: Option<u32>,
    /// Round-trip latency in milliseconds
    pub latency_ms: u64,
}

/// Trait that all LLM providers implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (we need `Box<dyn LlmProvider>` for dynamic dispatch).
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logging (e.g., "ollama", "google").
    fn name(&self) -> &str;

    /// Check whether the provider is configured and reachable.
    async fn is_available(&self) -> bool;

    /// Send one prompt and return the model's text.
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, PipelineError>;

    /// Per-request timeout for this provider.
    fn timeout(&self) -> Duration;
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok().filter(|v| !v.is_empty())
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Turn a non-success HTTP response into a `PipelineError::Llm` with its status code.
pub(crate) async fn http_error(provider: &str, resp: reqwest::Response) -> PipelineError {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    PipelineError::Llm {
        message: format!("{provider} HTTP {status}: {text}"),
        status_code: Some(status.as_u16()),
    }
}

/// Factory that creates the appropriate provider for a model.
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Create the provider serving `spec`.
    ///
    /// Cloud providers fail here, before any image is read, when their API
    /// key is missing.
    pub fn create(
        spec: &ModelSpec,
        config: &LlmConfig,
    ) -> Result<Box<dyn LlmProvider>, PipelineError> {
        match spec.provider {
            ProviderKind::Ollama => Ok(Box::new(super::ollama::OllamaProvider::new(
                &config.ollama.endpoint,
                &spec.api_model,
            ))),
            ProviderKind::LmStudio => Ok(Box::new(super::lmstudio::LmStudioProvider::new(
                &config.lmstudio.endpoint,
                &spec.api_model,
            ))),
            ProviderKind::OpenAi => {
                let api_key =
                    resolve_env_var(&config.openai.api_key).ok_or_else(|| PipelineError::Llm {
                        message: "OpenAI API key not set. Set OPENAI_API_KEY or run \
                                  `kwgen config set-key openai <KEY>`."
                            .to_string(),
                        status_code: None,
                    })?;
                Ok(Box::new(super::openai::OpenAiProvider::with_endpoint(
                    &api_key,
                    &spec.api_model,
                    &config.openai.endpoint,
                )))
            }
            ProviderKind::Google => {
                let api_key =
                    resolve_env_var(&config.google.api_key).ok_or_else(|| PipelineError::Llm {
                        message: "Google AI API key not set. Set GOOGLE_API_KEY or run \
                                  `kwgen config set-key google <KEY>`."
                            .to_string(),
                        status_code: None,
                    })?;
                Ok(Box::new(super::google::GoogleProvider::new(
                    &config.google.endpoint,
                    &api_key,
                    &spec.api_model,
                )))
            }
        }
    }
}
