//! Pipeline orchestration: validate → generate → write sidecars → embed.
//!
//! Batches run with bounded concurrency (semaphore). Results are delivered
//! through a callback as they complete so the shell can report progress.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::config::{Config, LimitsConfig};
use crate::error::PipelineError;
use crate::keywords::{GenerateOptions, KeywordGenerator};
use crate::language::Language;
use crate::llm::{LlmProvider, LlmProviderFactory, ModelSpec};
use crate::metadata::embed_keywords;
use crate::sidecar::{sidecars_exist, SidecarWriter};
use crate::types::{ImageKeywords, KeywordSet, ProcessingStats};

use super::validate::Validator;

/// Options for one processing run.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Languages to produce, in selection order
    pub languages: Vec<Language>,
    /// Maximum images in flight
    pub parallel: usize,
    /// Embed keywords into the image files after writing sidecars
    pub embed: bool,
    /// Skip images whose sidecars all exist already
    pub skip_existing: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            languages: vec![Language::English],
            parallel: 1,
            embed: false,
            skip_existing: false,
        }
    }
}

/// Outcome for one image in a batch.
#[derive(Debug)]
pub enum BatchResult {
    Success(ImageKeywords),
    Skipped(PathBuf),
    /// The image produced no keywords; `keywords` maps every selected
    /// language to an empty list.
    Failure {
        path: PathBuf,
        error: String,
        keywords: KeywordSet,
    },
}

/// Processes images into keywords and sidecars.
///
/// Cheap to clone; batch tasks each hold a clone.
#[derive(Clone)]
pub struct KeywordPipeline {
    validator: Arc<Validator>,
    generator: Arc<KeywordGenerator>,
    sidecars: SidecarWriter,
    model: String,
    options: ProcessOptions,
}

impl KeywordPipeline {
    pub fn new(
        generator: KeywordGenerator,
        sidecars: SidecarWriter,
        limits: LimitsConfig,
        model: &str,
        options: ProcessOptions,
    ) -> Self {
        Self {
            validator: Arc::new(Validator::new(limits)),
            generator: Arc::new(generator),
            sidecars,
            model: model.to_string(),
            options,
        }
    }

    /// Build a pipeline whose provider comes from the model name.
    pub fn from_config(
        config: &Config,
        model: &ModelSpec,
        output_dir: &Path,
        append: bool,
        options: ProcessOptions,
    ) -> Result<Self, PipelineError> {
        let provider = LlmProviderFactory::create(model, &config.llm)?;
        Ok(Self::with_provider(config, provider, &model.name, output_dir, append, options))
    }

    /// Build a pipeline around an existing provider.
    pub fn with_provider(
        config: &Config,
        provider: Box<dyn LlmProvider>,
        model: &str,
        output_dir: &Path,
        append: bool,
        options: ProcessOptions,
    ) -> Self {
        let generator = KeywordGenerator::new(provider, GenerateOptions::from(config));
        let sidecars = SidecarWriter::new(output_dir, append).pretty(config.output.pretty);
        Self::new(generator, sidecars, config.limits.clone(), model, options)
    }

    pub fn options(&self) -> &ProcessOptions {
        &self.options
    }

    pub fn provider_name(&self) -> &str {
        self.generator.provider_name()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run one image through the pipeline.
    pub async fn process(&self, path: &Path) -> Result<ImageKeywords, PipelineError> {
        let start = std::time::Instant::now();
        let validated = self.validator.validate(path)?;
        let languages = &self.options.languages;

        let (width, height) = match image::image_dimensions(path) {
            Ok((w, h)) => (Some(w), Some(h)),
            Err(e) => {
                tracing::debug!("Could not read dimensions of {:?}: {e}", path);
                (None, None)
            }
        };

        let keywords = match self
            .generator
            .generate(path, validated.kind.as_str(), languages)
            .await
        {
            Ok(keywords) => keywords,
            Err(e) => {
                // Failed images still get (empty) sidecars for every language.
                let empty = KeywordSet::empty_for(languages);
                if let Err(write_err) = self.sidecars.write(path, &empty) {
                    tracing::warn!("{write_err}");
                }
                return Err(e);
            }
        };
        let sidecars = self.sidecars.write(path, &keywords)?;

        let mut result = ImageKeywords {
            file_path: path.to_path_buf(),
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "unknown".to_string()),
            format: validated.kind.to_string(),
            width,
            height,
            file_size: validated.file_size,
            keywords,
            model: self.model.clone(),
            sidecars,
            embedded: false,
        };

        if self.options.embed {
            match embed_keywords(path, &result.keywords, languages) {
                Ok(()) => result.embedded = true,
                Err(e) => tracing::warn!("{e}"),
            }
        }

        tracing::debug!("Processed {:?} in {:?}", result.file_name, start.elapsed());
        Ok(result)
    }

    /// Process a batch of images.
    ///
    /// Spawns one task per image, bounded by a semaphore of
    /// `options.parallel` permits. A failing image never stops the batch.
    pub async fn process_batch<F>(&self, files: &[PathBuf], on_result: F) -> ProcessingStats
    where
        F: Fn(BatchResult) + Send + Sync + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.options.parallel.max(1)));
        let on_result = Arc::new(on_result);
        let mut handles = Vec::with_capacity(files.len());

        for path in files {
            if self.options.skip_existing
                && sidecars_exist(path, self.sidecars.output_dir(), &self.options.languages)
            {
                tracing::info!("Skipping {:?} (sidecars exist)", path);
                on_result(BatchResult::Skipped(path.clone()));
                handles.push(None);
                continue;
            }

            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::warn!("Batch semaphore closed unexpectedly, stopping batch");
                    break;
                }
            };

            let pipeline = self.clone();
            let on_result = on_result.clone();
            let path = path.clone();

            handles.push(Some(tokio::spawn(async move {
                let outcome = pipeline.process(&path).await;
                let result = match outcome {
                    Ok(image) => BatchResult::Success(image),
                    Err(e) => {
                        tracing::error!("{e}");
                        BatchResult::Failure {
                            keywords: KeywordSet::empty_for(&pipeline.options.languages),
                            error: e.to_string(),
                            path,
                        }
                    }
                };
                let embedded = matches!(&result, BatchResult::Success(r) if r.embedded);
                let success = matches!(&result, BatchResult::Success(_));
                drop(permit);
                on_result(result);
                (success, embedded)
            })));
        }

        let mut stats = ProcessingStats::default();
        for handle in handles {
            let Some(handle) = handle else {
                stats.skipped += 1;
                continue;
            };
            match handle.await {
                Ok((true, embedded)) => {
                    stats.succeeded += 1;
                    if embedded {
                        stats.embedded += 1;
                    }
                }
                Ok((false, _)) => stats.failed += 1,
                Err(e) => {
                    tracing::error!("Processing task panicked: {e}");
                    stats.failed += 1;
                }
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::read_embedded_keywords;
    use crate::sidecar::{read_sidecar, sidecar_path};
    use crate::test_support::{http_err, ok, write_jpeg, write_png, MockProvider};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.pipeline.retry_attempts = 0;
        config.pipeline.retry_delay_ms = 10;
        config.limits.llm_timeout_ms = 5000;
        config
    }

    fn pipeline(provider: MockProvider, out: &Path, options: ProcessOptions) -> KeywordPipeline {
        KeywordPipeline::with_provider(
            &test_config(),
            Box::new(provider),
            "mock-v1",
            out,
            false,
            options,
        )
    }

    async fn run(
        pipeline: &KeywordPipeline,
        files: &[PathBuf],
    ) -> (Vec<BatchResult>, ProcessingStats) {
        let results = Arc::new(Mutex::new(Vec::new()));
        let sink = results.clone();
        let stats = pipeline
            .process_batch(files, move |r| sink.lock().unwrap().push(r))
            .await;
        let results = Arc::try_unwrap(results).unwrap().into_inner().unwrap();
        (results, stats)
    }

    #[tokio::test]
    async fn test_process_writes_sidecars() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let image = write_jpeg(dir.path(), "beach.jpg");
        let options = ProcessOptions {
            languages: vec![Language::English, Language::Danish],
            ..ProcessOptions::default()
        };
        let pipeline = pipeline(MockProvider::keywords("beach, sun", "strand, sol"), &out, options);

        let result = pipeline.process(&image).await.unwrap();

        assert_eq!(result.file_name, "beach.jpg");
        assert_eq!(result.format, "jpeg");
        assert_eq!((result.width, result.height), (Some(32), Some(24)));
        assert_eq!(result.model, "mock-v1");
        assert_eq!(result.sidecars.len(), 2);
        assert!(!result.embedded);

        let dk = read_sidecar(&sidecar_path(&out, &image, Language::Danish)).unwrap();
        assert_eq!(dk.keywords, vec!["strand", "sol"]);
        assert_eq!(dk.image, image.to_string_lossy());
    }

    #[tokio::test]
    async fn test_process_with_embed() {
        let dir = tempfile::tempdir().unwrap();
        let image = write_png(dir.path(), "sky.png");
        let options = ProcessOptions {
            embed: true,
            ..ProcessOptions::default()
        };
        let pipeline = pipeline(MockProvider::keywords("sky, cloud", ""), dir.path(), options);

        let result = pipeline.process(&image).await.unwrap();

        assert!(result.embedded);
        assert_eq!(
            read_embedded_keywords(&image).unwrap().as_deref(),
            Some("en:sky, en:cloud")
        );
    }

    #[tokio::test]
    async fn test_invalid_file_never_reaches_model() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("fake.png");
        std::fs::write(&fake, b"plain text").unwrap();
        let provider = MockProvider::keywords("x", "y");
        let calls = provider.call_count_handle();
        let pipeline = pipeline(provider, dir.path(), ProcessOptions::default());

        let err = pipeline.process(&fake).await.unwrap_err();

        assert!(matches!(err, PipelineError::UnsupportedFormat { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_batch_partial_failure() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            write_jpeg(dir.path(), "a.jpg"),
            dir.path().join("missing.jpg"),
            write_png(dir.path(), "c.png"),
        ];
        let pipeline = pipeline(
            MockProvider::keywords("tree", ""),
            dir.path(),
            ProcessOptions::default(),
        );

        let (results, stats) = run(&pipeline, &files).await;

        assert_eq!(stats.succeeded, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(results.len(), 3);
        assert!(results.iter().any(
            |r| matches!(r, BatchResult::Failure { path, .. } if path.ends_with("missing.jpg"))
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_batch_model_failure_yields_empty_keywords() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![write_jpeg(dir.path(), "a.jpg")];
        let languages = vec![Language::English, Language::Vietnamese];
        let options = ProcessOptions {
            languages: languages.clone(),
            ..ProcessOptions::default()
        };
        let pipeline = pipeline(
            MockProvider::new(|_, _| http_err(404, "model 'llava' not found")),
            dir.path(),
            options,
        );

        let (results, stats) = run(&pipeline, &files).await;

        assert_eq!((stats.succeeded, stats.failed), (0, 1));
        match &results[0] {
            BatchResult::Failure { error, keywords, .. } => {
                assert!(error.contains("not found"));
                assert_eq!(keywords, &KeywordSet::empty_for(&languages));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        for language in languages {
            let record = read_sidecar(&sidecar_path(dir.path(), &files[0], language)).unwrap();
            assert!(record.keywords.is_empty());
        }
    }

    #[tokio::test]
    async fn test_invalid_file_writes_no_sidecars() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("fake.jpg");
        std::fs::write(&fake, b"plain text").unwrap();
        let pipeline = pipeline(
            MockProvider::keywords("x", ""),
            dir.path(),
            ProcessOptions::default(),
        );

        assert!(pipeline.process(&fake).await.is_err());
        assert!(!sidecar_path(dir.path(), &fake, Language::English).exists());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_batch_skip_existing() {
        let dir = tempfile::tempdir().unwrap();
        let done = write_jpeg(dir.path(), "done.jpg");
        let fresh = write_jpeg(dir.path(), "fresh.jpg");
        std::fs::write(
            sidecar_path(dir.path(), &done, Language::English),
            r#"{"image":"done.jpg","language":"en","keywords":["old"]}"#,
        )
        .unwrap();

        let provider = MockProvider::keywords("new", "");
        let calls = provider.call_count_handle();
        let options = ProcessOptions {
            skip_existing: true,
            ..ProcessOptions::default()
        };
        let pipeline = pipeline(provider, dir.path(), options);

        let (results, stats) = run(&pipeline, &[done.clone(), fresh]).await;

        assert_eq!((stats.succeeded, stats.skipped, stats.failed), (1, 1, 0));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, BatchResult::Skipped(p) if p == &done)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_batch_semaphore_bounds_concurrency() {
        let dir = tempfile::tempdir().unwrap();
        let files: Vec<_> = (0..6)
            .map(|i| write_jpeg(dir.path(), &format!("{i}.jpg")))
            .collect();

        let in_flight = Arc::new(AtomicU32::new(0));
        let max_concurrent = Arc::new(AtomicU32::new(0));
        let mut provider =
            MockProvider::new(|_, _| ok("described")).with_delay(Duration::from_millis(100));
        provider.in_flight = Some((in_flight, max_concurrent.clone()));

        let options = ProcessOptions {
            parallel: 2,
            ..ProcessOptions::default()
        };
        let pipeline = pipeline(provider, dir.path(), options);
        let (_, stats) = run(&pipeline, &files).await;

        assert_eq!(stats.succeeded, 6);
        assert!(
            max_concurrent.load(Ordering::SeqCst) <= 2,
            "semaphore violated: max concurrent was {}",
            max_concurrent.load(Ordering::SeqCst)
        );
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockProvider::keywords("x", "y");
        let calls = provider.call_count_handle();
        let pipeline = pipeline(provider, dir.path(), ProcessOptions::default());

        let (results, stats) = run(&pipeline, &[]).await;

        assert!(results.is_empty());
        assert_eq!(stats.total(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
