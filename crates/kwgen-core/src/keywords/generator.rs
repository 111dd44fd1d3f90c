//! Keyword generation for a single image.
//!
//! English keywords are always requested first from the image; every other
//! selected language is a text-only translation of that English list.

use super::parse::{parse_keywords, parse_translation};
use super::prompts::{translation_prompt, ENGLISH_KEYWORDS_PROMPT};
use crate::config::Config;
use crate::error::PipelineError;
use crate::language::Language;
use crate::llm::provider::{ImageInput, LlmProvider, LlmRequest};
use crate::llm::retry;
use crate::types::KeywordSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Timeout and retry settings for model calls.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
    /// Maximum retries per call
    pub retry_attempts: u32,
    /// Base backoff delay in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 120_000,
            retry_attempts: 2,
            retry_delay_ms: 1000,
        }
    }
}

impl From<&Config> for GenerateOptions {
    fn from(config: &Config) -> Self {
        Self {
            timeout_ms: config.limits.llm_timeout_ms,
            retry_attempts: config.pipeline.retry_attempts,
            retry_delay_ms: config.pipeline.retry_delay_ms,
        }
    }
}

/// Produces a [`KeywordSet`] for an image using one provider.
pub struct KeywordGenerator {
    provider: Arc<dyn LlmProvider>,
    options: GenerateOptions,
}

impl KeywordGenerator {
    pub fn new(provider: Box<dyn LlmProvider>, options: GenerateOptions) -> Self {
        Self {
            provider: Arc::from(provider),
            options,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Read `path` and generate keywords for `languages`.
    pub async fn generate(
        &self,
        path: &Path,
        format: &str,
        languages: &[Language],
    ) -> Result<KeywordSet, PipelineError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PipelineError::FileNotFound(path.to_path_buf())
            } else {
                PipelineError::Validate {
                    path: path.to_path_buf(),
                    message: format!("Failed to read image: {e}"),
                }
            }
        })?;

        let image = ImageInput::from_bytes(&bytes, format);
        self.generate_for_image(path, image, languages).await
    }

    /// Generate keywords for an already-encoded image.
    ///
    /// Fails when no English keywords could be obtained. A failed translation
    /// only leaves that language empty.
    pub async fn generate_for_image(
        &self,
        path: &Path,
        image: ImageInput,
        languages: &[Language],
    ) -> Result<KeywordSet, PipelineError> {
        let request = LlmRequest::with_image(ENGLISH_KEYWORDS_PROMPT, image);
        let english = self
            .call_with_retry(path, "keywords", &request, parse_keywords)
            .await?;
        tracing::debug!("{} English keywords for {:?}", english.len(), path);

        let mut set = KeywordSet::new();
        for &language in languages {
            if language.is_english() {
                set.insert(language, english.clone());
                continue;
            }

            let request = LlmRequest::text(translation_prompt(language, &english));
            let translated = match self
                .call_with_retry(path, "translate", &request, parse_translation)
                .await
            {
                Ok(keywords) => keywords,
                Err(e) => {
                    tracing::warn!("Translation to {} failed for {:?}: {e}", language.name(), path);
                    Vec::new()
                }
            };
            set.insert(language, translated);
        }

        Ok(set)
    }

    /// Run one request with timeout, backoff and parse-level retries.
    async fn call_with_retry(
        &self,
        path: &Path,
        stage: &str,
        request: &LlmRequest,
        parse: fn(&str) -> Vec<String>,
    ) -> Result<Vec<String>, PipelineError> {
        let timeout = Duration::from_millis(self.options.timeout_ms);
        let mut last_error = None;

        for attempt in 0..=self.options.retry_attempts {
            if attempt > 0 {
                let delay = retry::backoff_duration(attempt - 1, self.options.retry_delay_ms);
                tracing::debug!(
                    "Retry {attempt}/{} ({stage}) for {:?} after {delay:?}",
                    self.options.retry_attempts,
                    path
                );
                tokio::time::sleep(delay).await;
            }

            let error = match tokio::time::timeout(timeout, self.provider.generate(request)).await
            {
                Ok(Ok(response)) => {
                    let keywords = parse(&response.text);
                    if !keywords.is_empty() {
                        return Ok(keywords);
                    }
                    PipelineError::MalformedResponse {
                        path: path.to_path_buf(),
                        message: format!("no keywords in reply: {:?}", response.text),
                    }
                }
                Ok(Err(e)) => e,
                Err(_) => PipelineError::Timeout {
                    path: path.to_path_buf(),
                    stage: stage.to_string(),
                    timeout_ms: self.options.timeout_ms,
                },
            };

            let retryable = retry::is_retryable(&error);
            last_error = Some(error);
            if !retryable {
                break;
            }
        }

        Err(last_error.unwrap_or_else(|| PipelineError::MalformedResponse {
            path: path.to_path_buf(),
            message: "no attempts were made".to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{http_err, ok, MockProvider};
    use std::sync::atomic::Ordering;

    fn fast_options() -> GenerateOptions {
        GenerateOptions {
            timeout_ms: 5000,
            retry_attempts: 0,
            retry_delay_ms: 10,
        }
    }

    fn image() -> ImageInput {
        ImageInput::from_bytes(&[0xFF, 0xD8, 0xFF], "jpeg")
    }

    #[tokio::test]
    async fn test_english_only() {
        let provider = MockProvider::keywords("Beach, Sunset, Ocean", "unused");
        let calls = provider.call_count_handle();
        let generator = KeywordGenerator::new(Box::new(provider), fast_options());

        let set = generator
            .generate_for_image(Path::new("beach.jpg"), image(), &[Language::English])
            .await
            .unwrap();

        assert_eq!(set.get(Language::English), ["beach", "sunset", "ocean"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_translation_without_english_selected() {
        let provider = MockProvider::keywords("beach, sunset", "Strand\nSolnedgang");
        let requests = provider.requests_handle();
        let generator = KeywordGenerator::new(Box::new(provider), fast_options());

        let set = generator
            .generate_for_image(Path::new("beach.jpg"), image(), &[Language::Danish])
            .await
            .unwrap();

        assert!(!set.contains(Language::English));
        assert_eq!(set.get(Language::Danish), ["strand", "solnedgang"]);

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].image.is_some());
        assert!(requests[1].image.is_none());
        assert!(requests[1].prompt.contains("to Danish"));
        assert!(requests[1].prompt.ends_with("beach, sunset"));
    }

    #[tokio::test]
    async fn test_failed_translation_leaves_language_empty() {
        let provider = MockProvider::new(|_, req| {
            if req.image.is_some() {
                ok("dog, park")
            } else {
                http_err(400, "bad request")
            }
        });
        let generator = KeywordGenerator::new(Box::new(provider), fast_options());

        let set = generator
            .generate_for_image(
                Path::new("dog.jpg"),
                image(),
                &[Language::English, Language::Vietnamese],
            )
            .await
            .unwrap();

        assert_eq!(set.get(Language::English), ["dog", "park"]);
        assert!(set.contains(Language::Vietnamese));
        assert!(set.get(Language::Vietnamese).is_empty());
    }

    #[tokio::test]
    async fn test_empty_english_reply_is_retried() {
        let provider = MockProvider::new(|idx, _| if idx == 0 { ok("  ") } else { ok("cat") });
        let calls = provider.call_count_handle();
        let options = GenerateOptions {
            retry_attempts: 2,
            ..fast_options()
        };
        let generator = KeywordGenerator::new(Box::new(provider), options);

        let set = generator
            .generate_for_image(Path::new("cat.png"), image(), &[Language::English])
            .await
            .unwrap();

        assert_eq!(set.get(Language::English), ["cat"]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_english_skips_translations() {
        let provider = MockProvider::keywords(",,", "should not be asked");
        let calls = provider.call_count_handle();
        let options = GenerateOptions {
            retry_attempts: 1,
            ..fast_options()
        };
        let generator = KeywordGenerator::new(Box::new(provider), options);

        let err = generator
            .generate_for_image(
                Path::new("blank.jpg"),
                image(),
                &[Language::English, Language::Danish],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::MalformedResponse { .. }));
        // 1 initial + 1 retry, no translation calls
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_auth_error_not_retried() {
        let provider = MockProvider::new(|_, _| http_err(401, "unauthorized"));
        let calls = provider.call_count_handle();
        let options = GenerateOptions {
            retry_attempts: 3,
            ..fast_options()
        };
        let generator = KeywordGenerator::new(Box::new(provider), options);

        let err = generator
            .generate_for_image(Path::new("a.jpg"), image(), &[Language::English])
            .await
            .unwrap_err();

        assert!(err.to_string().contains("unauthorized"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_retried_until_exhausted() {
        let provider = MockProvider::new(|_, _| http_err(429, "rate limited"));
        let calls = provider.call_count_handle();
        let options = GenerateOptions {
            retry_attempts: 2,
            ..fast_options()
        };
        let generator = KeywordGenerator::new(Box::new(provider), options);

        let err = generator
            .generate_for_image(Path::new("a.jpg"), image(), &[Language::English])
            .await
            .unwrap_err();

        assert!(err.to_string().contains("rate limited"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_timeout() {
        let provider = MockProvider::keywords("slow", "slow").with_delay(Duration::from_secs(5));
        let options = GenerateOptions {
            timeout_ms: 50,
            ..fast_options()
        };
        let generator = KeywordGenerator::new(Box::new(provider), options);

        let err = generator
            .generate_for_image(Path::new("slow.jpg"), image(), &[Language::English])
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Timeout { timeout_ms: 50, .. }));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let provider = MockProvider::keywords("a", "b");
        let calls = provider.call_count_handle();
        let generator = KeywordGenerator::new(Box::new(provider), fast_options());

        let err = generator
            .generate(Path::new("/nonexistent/ghost.jpg"), "jpeg", &[Language::English])
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::FileNotFound(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
