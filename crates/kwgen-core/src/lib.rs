//! kwgen core - multilingual image keywords from vision LLMs.
//!
//! Sends images to a vision-capable model (Ollama, LM Studio, OpenAI or
//! Google Gemini), collects English keywords, translates them into the
//! other selected languages, writes one JSON sidecar per language and can
//! embed the keywords into JPEG EXIF or PNG text metadata.
//!
//! ```text
//! Image → Validate → English keywords → Translations → Sidecars → (Embed)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use kwgen_core::{Config, KeywordPipeline, Language, ModelSpec, ProcessOptions};
//!
//! #[tokio::main]
//! async fn main() -> kwgen_core::Result<()> {
//!     let config = Config::load()?;
//!     let options = ProcessOptions {
//!         languages: vec![Language::English, Language::Danish],
//!         ..ProcessOptions::default()
//!     };
//!     let pipeline = KeywordPipeline::from_config(
//!         &config,
//!         &ModelSpec::parse("llava"),
//!         "./out".as_ref(),
//!         false,
//!         options,
//!     )?;
//!
//!     let result = pipeline.process("./beach.jpg".as_ref()).await?;
//!     println!("{:?}", result.keywords);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod keywords;
pub mod language;
pub mod llm;
pub mod metadata;
pub mod output;
pub mod pipeline;
pub mod sidecar;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::Config;
pub use error::{ConfigError, KwgenError, PipelineError, PipelineResult, Result};
pub use language::Language;
pub use llm::{ModelSpec, ProviderKind};
pub use metadata::{combined_keyword_string, embed_keywords, read_embedded_keywords};
pub use output::{OutputFormat, ReportWriter};
pub use pipeline::{BatchResult, FileDiscovery, KeywordPipeline, ProcessOptions};
pub use sidecar::{load_keyword_set, SidecarWriter};
pub use types::{ImageKeywords, KeywordSet, ProcessingStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
