//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Model used when none is given on the command line. Updated whenever a
    /// model is picked in interactive mode.
    pub last_model: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            last_model: "llava".to_string(),
        }
    }
}

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Maximum number of images keyworded concurrently
    pub parallel: usize,

    /// Supported input extensions
    pub supported_formats: Vec<String>,

    /// Default language codes
    pub languages: Vec<String>,

    /// Merge into existing sidecars instead of overwriting them
    pub append: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel: 1,
            supported_formats: ["jpg", "jpeg", "png", "gif", "bmp", "webp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            languages: vec!["en".to_string()],
            append: false,
        }
    }
}

/// Retry settings for transient and malformed LLM responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Max retry attempts per LLM call
    pub retry_attempts: u32,

    /// Base delay between retries in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 2,
            retry_delay_ms: 1000,
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// LLM call timeout in milliseconds
    pub llm_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 50,
            llm_timeout_ms: 120_000,
        }
    }
}

/// Sidecar output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print sidecar JSON
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// LLM provider configurations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama (local) configuration
    pub ollama: OllamaConfig,

    /// LM Studio (local, OpenAI-compatible) configuration
    pub lmstudio: LmStudioConfig,

    /// OpenAI configuration
    pub openai: OpenAiConfig,

    /// Google Gemini configuration
    pub google: GoogleConfig,
}

/// Ollama configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Ollama API endpoint
    pub endpoint: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
        }
    }
}

/// LM Studio configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LmStudioConfig {
    /// Base URL of the OpenAI-compatible server
    pub endpoint: String,
}

impl Default for LmStudioConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:1234/v1".to_string(),
        }
    }
}

/// OpenAI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Chat Completions URL
    pub endpoint: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: "${OPENAI_API_KEY}".to_string(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
        }
    }
}

/// Google Gemini configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Generative Language API base URL
    pub endpoint: String,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            api_key: "${GOOGLE_API_KEY}".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }
}
