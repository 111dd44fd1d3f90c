//! Google Gemini provider using the `generateContent` REST API.
//!
//! Images are sent as `inline_data` parts next to the text prompt.

use super::provider::{http_error, LlmProvider, LlmRequest, LlmResponse};
use crate::error::PipelineError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

pub struct GoogleProvider {
    endpoint: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GoogleProvider {
    pub fn new(endpoint: &str, api_key: &str, model: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn request_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    fn build_body(&self, request: &LlmRequest) -> GenerateContentRequest {
        let mut parts = vec![Part::Text {
            text: request.prompt.clone(),
        }];
        if let Some(image) = &request.image {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.media_type.clone(),
                    data: image.data.clone(),
                },
            });
        }

        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            system_instruction: request.system.as_ref().map(|s| SystemInstruction {
                parts: vec![Part::Text { text: s.clone() }],
            }),
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            },
        }
    }
}

/// Join the text parts of the first candidate that has any.
fn extract_text(resp: &GenerateContentResponse) -> Option<String> {
    resp.candidates.iter().find_map(|c| {
        let text: String = c
            .content
            .as_ref()?
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    })
}

// --- Request types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

// --- Response types ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    total_token_count: Option<u32>,
}

#[async_trait]
impl LlmProvider for GoogleProvider {
    fn name(&self) -> &str {
        "google"
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, PipelineError> {
        let start = Instant::now();
        let body = self.build_body(request);

        let resp = self
            .client
            .post(self.request_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| PipelineError::Llm {
                message: format!("Google AI request failed: {e}"),
                status_code: None,
            })?;

        if !resp.status().is_success() {
            return Err(http_error("Google AI", resp).await);
        }

        let payload: GenerateContentResponse =
            resp.json().await.map_err(|e| PipelineError::Llm {
                message: format!("Failed to parse Google AI response: {e}"),
                status_code: None,
            })?;

        let text = extract_text(&payload).ok_or_else(|| PipelineError::Llm {
            message: "Google AI response did not contain any text".to_string(),
            status_code: None,
        })?;

        Ok(LlmResponse {
            text,
            model: self.model.clone(),
            tokens_used: payload.usage_metadata.and_then(|u| u.total_token_count),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(60)
    }
}
