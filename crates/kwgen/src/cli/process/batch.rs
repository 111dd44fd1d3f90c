//! Batch processing with progress, keyword output and the optional report.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use kwgen_core::{BatchResult, ImageKeywords, KeywordSet, Language, ProcessingStats, ReportWriter};

use super::setup::ProcessContext;
use super::ProcessArgs;

/// An image that produced no keywords.
#[derive(Debug, Clone)]
pub struct FailedImage {
    pub path: PathBuf,
    pub error: String,
    /// Empty list per selected language
    pub keywords: KeywordSet,
}

impl FailedImage {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// What a batch run produced.
#[derive(Debug)]
pub struct BatchOutcome {
    pub stats: ProcessingStats,
    /// Successful images, sorted by path
    pub results: Vec<ImageKeywords>,
    /// Failed images, sorted by path
    pub failed: Vec<FailedImage>,
    pub output_dir: PathBuf,
    pub languages: Vec<Language>,
    pub model: String,
}

impl BatchOutcome {
    pub(crate) fn empty(ctx: ProcessContext) -> Self {
        Self {
            stats: ProcessingStats::default(),
            results: Vec::new(),
            failed: Vec::new(),
            output_dir: ctx.output_dir,
            languages: ctx.languages,
            model: ctx.pipeline.model().to_string(),
        }
    }
}

/// Run `files` through the pipeline, reporting each result as it completes.
pub(crate) async fn run_batch(
    ctx: ProcessContext,
    args: &ProcessArgs,
    files: Vec<PathBuf>,
) -> anyhow::Result<BatchOutcome> {
    let progress = create_progress_bar(files.len() as u64);
    let collected: Arc<Mutex<Vec<ImageKeywords>>> = Arc::new(Mutex::new(Vec::new()));
    let failures: Arc<Mutex<Vec<FailedImage>>> = Arc::new(Mutex::new(Vec::new()));
    let start = Instant::now();

    let on_result = {
        let progress = progress.clone();
        let collected = collected.clone();
        let failures = failures.clone();
        let languages = ctx.languages.clone();
        let quiet = args.quiet;
        move |result: BatchResult| {
            match result {
                BatchResult::Success(image) => {
                    if !quiet {
                        let text = format_keywords(&image, &languages);
                        progress.suspend(|| println!("{text}"));
                    }
                    if let Ok(mut results) = collected.lock() {
                        results.push(image);
                    }
                }
                BatchResult::Skipped(_) => {}
                BatchResult::Failure {
                    path,
                    error,
                    keywords,
                } => {
                    let failed = FailedImage {
                        path,
                        error,
                        keywords,
                    };
                    progress.suspend(|| {
                        eprintln!("  Failed: {} - {}", failed.path.display(), failed.error);
                        if !quiet {
                            println!("{}", format_failed(&failed, &languages));
                        }
                    });
                    if let Ok(mut failures) = failures.lock() {
                        failures.push(failed);
                    }
                }
            }
            progress.inc(1);
            let elapsed = start.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                progress.set_message(format!("{:.2} img/sec", progress.position() as f64 / elapsed));
            }
        }
    };

    let stats = ctx.pipeline.process_batch(&files, on_result).await;
    progress.finish_and_clear();

    let mut results = collected
        .lock()
        .map(|mut r| std::mem::take(&mut *r))
        .unwrap_or_default();
    results.sort_by(|a, b| a.file_path.cmp(&b.file_path));
    let mut failed = failures
        .lock()
        .map(|mut f| std::mem::take(&mut *f))
        .unwrap_or_default();
    failed.sort_by(|a, b| a.path.cmp(&b.path));

    if let Some(report_path) = &args.report {
        write_report(report_path, args, &results)?;
    }

    print_summary(&stats, start.elapsed());

    Ok(BatchOutcome {
        stats,
        results,
        failed,
        output_dir: ctx.output_dir,
        languages: ctx.languages,
        model: ctx.pipeline.model().to_string(),
    })
}

fn write_report(path: &Path, args: &ProcessArgs, results: &[ImageKeywords]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let mut report = ReportWriter::new(BufWriter::new(file), args.format.into(), true);
    for image in results {
        report.record(image)?;
    }
    let count = report.records();
    report.finish()?;
    tracing::info!("Report with {count} record(s) written to {:?}", path);
    Ok(())
}

/// Keyword lines for one image: the file name, then one line per language.
pub(crate) fn format_keywords(image: &ImageKeywords, languages: &[Language]) -> String {
    let mut out = keyword_lines(&image.file_name, &image.keywords, languages);
    if image.embedded {
        out.push_str("\n  (embedded)");
    }
    out
}

/// Keyword lines for a failed image, every language shown as `(none)`.
pub(crate) fn format_failed(failed: &FailedImage, languages: &[Language]) -> String {
    keyword_lines(
        &format!("{} (failed)", failed.file_name()),
        &failed.keywords,
        languages,
    )
}

fn keyword_lines(title: &str, keywords: &KeywordSet, languages: &[Language]) -> String {
    let mut out = title.to_string();
    for &language in languages {
        let words = keywords.get(language);
        let text = if words.is_empty() {
            "(none)".to_string()
        } else {
            words.join(", ")
        };
        out.push_str(&format!("\n  {:<11} {text}", format!("{}:", language.name())));
    }
    out
}

fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
    ) {
        pb.set_style(style.progress_chars("##-"));
    }
    pb.set_message("starting...");
    pb
}

fn print_summary(stats: &ProcessingStats, elapsed: Duration) {
    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Succeeded:    {:>8}", stats.succeeded);
    if stats.failed > 0 {
        eprintln!("    Failed:       {:>8}", stats.failed);
    }
    if stats.skipped > 0 {
        eprintln!("    Skipped:      {:>8}", stats.skipped);
    }
    if stats.embedded > 0 {
        eprintln!("    Embedded:     {:>8}", stats.embedded);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", stats.total());
    eprintln!("    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    eprintln!("  ====================================");
}
