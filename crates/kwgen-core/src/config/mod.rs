//! Configuration management for kwgen.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. Every section is optional in the TOML file.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use crate::language::{parse_languages, Language};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Processing settings
    pub processing: ProcessingConfig,

    /// Retry settings
    pub pipeline: PipelineConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Sidecar output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// LLM provider settings
    pub llm: LlmConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.kwgen.kwgen/config.toml
    /// - Linux: ~/.config/kwgen/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\kwgen\kwgen\config\config.toml
    ///
    /// Falls back to ~/.kwgen/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "kwgen", "kwgen")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = shellexpand::tilde("~").into_owned();
                PathBuf::from(home).join(".kwgen").join("config.toml")
            })
    }

    /// Default languages from config. Validation guarantees the codes parse.
    pub fn default_languages(&self) -> Vec<Language> {
        parse_languages(&self.processing.languages).unwrap_or_else(|_| vec![Language::English])
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}
