//! LM Studio provider (OpenAI-compatible local server).
//!
//! LM Studio speaks the Chat Completions format, so generation delegates to
//! `OpenAiProvider` pointed at the local server. Every request carries the
//! same fixed system message.

use super::openai::OpenAiProvider;
use super::provider::{http_error, LlmProvider, LlmRequest, LlmResponse};
use crate::error::PipelineError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

pub const SYSTEM_MESSAGE: &str = "You are a helpful assistant.";

pub struct LmStudioProvider {
    base_url: String,
    inner: OpenAiProvider,
    client: reqwest::Client,
}

impl LmStudioProvider {
    pub fn new(endpoint: &str, model: &str) -> Self {
        let base_url = endpoint.trim_end_matches('/').to_string();
        let url = format!("{base_url}/chat/completions");
        Self {
            inner: OpenAiProvider::with_endpoint("", model, &url),
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Identifiers of the models the server has loaded, from `/models`.
    pub async fn list_models(&self) -> Result<Vec<String>, PipelineError> {
        let url = format!("{}/models", self.base_url);
        let resp = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| PipelineError::Llm {
                message: format!("LM Studio request failed: {e}"),
                status_code: None,
            })?;

        if !resp.status().is_success() {
            return Err(http_error("LM Studio", resp).await);
        }

        let list: ModelList = resp.json().await.map_err(|e| PipelineError::Llm {
            message: format!("Failed to parse LM Studio model list: {e}"),
            status_code: None,
        })?;
        Ok(list.data.into_iter().map(|m| m.id).collect())
    }
}

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

#[async_trait]
impl LlmProvider for LmStudioProvider {
    fn name(&self) -> &str {
        "lmstudio"
    }

    async fn is_available(&self) -> bool {
        self.list_models().await.is_ok()
    }

    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, PipelineError> {
        let mut request = request.clone();
        request.system.get_or_insert_with(|| SYSTEM_MESSAGE.to_string());
        self.inner.generate(&request).await
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(120)
    }
}
