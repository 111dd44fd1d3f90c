//! Ollama provider for local vision models.
//!
//! Talks to a local Ollama instance via its HTTP API. No authentication.

use super::provider::{http_error, LlmProvider, LlmRequest, LlmResponse};
use crate::error::PipelineError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

pub struct OllamaProvider {
    endpoint: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(endpoint: &str, model: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Names of all installed models, from `/api/tags`.
    pub async fn list_models(&self) -> Result<Vec<String>, PipelineError> {
        let url = format!("{}/api/tags", self.endpoint);
        let resp = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| PipelineError::Llm {
                message: format!("Ollama request failed: {e}"),
                status_code: None,
            })?;

        if !resp.status().is_success() {
            return Err(http_error("Ollama", resp).await);
        }

        let tags: TagsResponse = resp.json().await.map_err(|e| PipelineError::Llm {
            message: format!("Failed to parse Ollama tags: {e}"),
            status_code: None,
        })?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    fn build_body(&self, request: &LlmRequest) -> GenerateRequest {
        GenerateRequest {
            model: self.model.clone(),
            prompt: request.prompt.clone(),
            images: request.image.iter().map(|i| i.data.clone()).collect(),
            system: request.system.clone(),
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        }
    }
}

/// `/api/generate` request body.
#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Deserialize)]
struct TagEntry {
    name: String,
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.endpoint);
        match self.client.get(&url).timeout(Duration::from_secs(5)).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, PipelineError> {
        let url = format!("{}/api/generate", self.endpoint);
        let start = Instant::now();
        let body = self.build_body(request);

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| PipelineError::Llm {
                message: format!("Ollama request failed: {e}"),
                status_code: None,
            })?;

        if !resp.status().is_success() {
            return Err(http_error("Ollama", resp).await);
        }

        let parsed: GenerateResponse = resp.json().await.map_err(|e| PipelineError::Llm {
            message: format!("Failed to parse Ollama response: {e}"),
            status_code: None,
        })?;

        let tokens_used = match (parsed.prompt_eval_count, parsed.eval_count) {
            (None, None) => None,
            (p, e) => Some(p.unwrap_or(0) + e.unwrap_or(0)),
        };

        Ok(LlmResponse {
            text: parsed.response.trim().to_string(),
            model: self.model.clone(),
            tokens_used,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn timeout(&self) -> Duration {
        // Vision models running locally can be slow
        Duration::from_secs(120)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::ImageInput;

    #[test]
    fn test_image_request_body() {
        let provider = OllamaProvider::new("http://localhost:11434/", "llava");
        let request = LlmRequest::with_image("describe", ImageInput::from_bytes(&[1, 2, 3], "png"));
        let body = serde_json::to_value(provider.build_body(&request)).unwrap();

        assert_eq!(body["model"], "llava");
        assert_eq!(body["prompt"], "describe");
        assert_eq!(body["images"][0], "AQID");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["num_predict"], 300);
        assert!(body.get("system").is_none());
    }

    #[test]
    fn test_text_request_omits_images() {
        let provider = OllamaProvider::new("http://localhost:11434", "llava");
        let body = serde_json::to_value(provider.build_body(&LlmRequest::text("translate")))
            .unwrap();
        assert!(body.get("images").is_none());
    }

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let provider = OllamaProvider::new("http://localhost:11434///", "llava");
        assert_eq!(provider.endpoint, "http://localhost:11434");
    }

    #[test]
    fn test_parse_tags() {
        let tags: TagsResponse = serde_json::from_str(
            r#"{"models":[{"name":"llava:latest","size":1},{"name":"mistral:7b"}]}"#,
        )
        .unwrap();
        let names: Vec<_> = tags.models.into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["llava:latest", "mistral:7b"]);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unavailable() {
        let provider = OllamaProvider::new("http://127.0.0.1:9", "llava");
        assert!(!provider.is_available().await);
        assert!(provider.list_models().await.is_err());
    }
}
