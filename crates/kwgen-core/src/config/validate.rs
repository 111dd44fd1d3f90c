//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::language::parse_languages;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.parallel == 0 {
            return Err(ConfigError::ValidationError(
                "processing.parallel must be > 0".into(),
            ));
        }
        if self.processing.supported_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "processing.supported_formats must not be empty".into(),
            ));
        }
        if self.processing.languages.is_empty() {
            return Err(ConfigError::ValidationError(
                "processing.languages must not be empty".into(),
            ));
        }
        parse_languages(&self.processing.languages)
            .map_err(|e| ConfigError::ValidationError(format!("processing.languages: {e}")))?;
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.llm_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.llm_timeout_ms must be > 0".into(),
            ));
        }
        if self.general.last_model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "general.last_model must not be empty".into(),
            ));
        }
        Ok(())
    }
}
