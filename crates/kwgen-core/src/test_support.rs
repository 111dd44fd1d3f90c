//! Shared helpers for unit tests: a scriptable LLM provider and image fixtures.

use crate::error::PipelineError;
use crate::llm::provider::{LlmProvider, LlmRequest, LlmResponse};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type ResponseFn = Box<dyn Fn(u32, &LlmRequest) -> Result<LlmResponse, PipelineError> + Send + Sync>;

/// A configurable mock provider.
///
/// Each call to `generate()` invokes the response factory with the call index
/// and the request, so tests can answer keyword and translation prompts
/// differently or fail particular attempts.
pub struct MockProvider {
    pub response_fn: ResponseFn,
    pub call_count: Arc<AtomicU32>,
    pub requests: Arc<Mutex<Vec<LlmRequest>>>,
    pub delay: Option<Duration>,
    /// (in_flight, max_concurrent) counters for semaphore tests
    pub in_flight: Option<(Arc<AtomicU32>, Arc<AtomicU32>)>,
}

pub fn ok(text: &str) -> Result<LlmResponse, PipelineError> {
    Ok(LlmResponse {
        text: text.to_string(),
        model: "mock-v1".to_string(),
        tokens_used: Some(42),
        latency_ms: 10,
    })
}

pub fn http_err(status: u16, message: &str) -> Result<LlmResponse, PipelineError> {
    Err(PipelineError::Llm {
        message: message.to_string(),
        status_code: Some(status),
    })
}

impl MockProvider {
    pub fn new(
        response_fn: impl Fn(u32, &LlmRequest) -> Result<LlmResponse, PipelineError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            response_fn: Box::new(response_fn),
            call_count: Arc::new(AtomicU32::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
            delay: None,
            in_flight: None,
        }
    }

    /// Answers image prompts with `keywords` and text prompts with `translation`.
    pub fn keywords(keywords: &str, translation: &str) -> Self {
        let keywords = keywords.to_string();
        let translation = translation.to_string();
        Self::new(move |_, req| {
            if req.image.is_some() {
                ok(&keywords)
            } else {
                ok(&translation)
            }
        })
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count_handle(&self) -> Arc<AtomicU32> {
        self.call_count.clone()
    }

    pub fn requests_handle(&self) -> Arc<Mutex<Vec<LlmRequest>>> {
        self.requests.clone()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, PipelineError> {
        let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if let Some((ref in_flight, ref max_concurrent)) = self.in_flight {
            let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            max_concurrent.fetch_max(current, Ordering::SeqCst);
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let result = (self.response_fn)(idx, request);
        if let Some((ref in_flight, _)) = self.in_flight {
            in_flight.fetch_sub(1, Ordering::SeqCst);
        }
        result
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(60)
    }
}

/// Write a small gradient JPEG.
pub fn write_jpeg(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    gradient(32, 24)
        .save_with_format(&path, image::ImageFormat::Jpeg)
        .unwrap();
    path
}

/// Write a small gradient RGB PNG.
pub fn write_png(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    gradient(16, 12)
        .save_with_format(&path, image::ImageFormat::Png)
        .unwrap();
    path
}

fn gradient(width: u32, height: u32) -> image::RgbImage {
    image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 8) as u8, (y * 8) as u8, ((x + y) * 4) as u8])
    })
}
