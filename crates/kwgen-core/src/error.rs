//! Error types for the kwgen keyword pipeline.
//!
//! Errors are organized by stage to provide clear, actionable error messages
//! that include relevant context (file paths, stage names, specific issues).

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for kwgen operations.
#[derive(Error, Debug)]
pub enum KwgenError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The file failed pre-flight validation
    #[error("Validation failed for {path}: {message}")]
    Validate { path: PathBuf, message: String },

    /// LLM call failed. `status_code` is set when the failure was an HTTP status.
    #[error("LLM error: {message}")]
    Llm {
        message: String,
        status_code: Option<u16>,
    },

    /// The model answered, but nothing usable could be parsed from it
    #[error("Malformed LLM response for {path}: {message}")]
    MalformedResponse { path: PathBuf, message: String },

    /// Operation timed out
    #[error("Timeout in {stage} stage for {path} after {timeout_ms}ms")]
    Timeout {
        path: PathBuf,
        stage: String,
        timeout_ms: u64,
    },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Unsupported image format
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// Sidecar JSON could not be read or written
    #[error("Sidecar error for {path}: {message}")]
    Sidecar { path: PathBuf, message: String },

    /// Writing keywords into image metadata failed
    #[error("Metadata embedding failed for {path}: {message}")]
    Embed { path: PathBuf, message: String },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
}

/// Convenience type alias for kwgen results.
pub type Result<T> = std::result::Result<T, KwgenError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
