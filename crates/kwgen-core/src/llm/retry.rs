//! Retry classification and exponential backoff for LLM calls.

use crate::error::PipelineError;
use std::time::Duration;

/// Whether another attempt at the same call could succeed.
///
/// Retried: timeouts, 429, 5xx, connection failures and replies that
/// parsed to zero keywords. Auth failures, bad requests and missing models
/// fail immediately.
pub fn is_retryable(error: &PipelineError) -> bool {
    match error {
        PipelineError::Timeout { .. } | PipelineError::MalformedResponse { .. } => true,
        PipelineError::Llm {
            status_code,
            message,
        } => {
            if let Some(code) = status_code {
                return *code == 429 || (500..=599).contains(code);
            }
            // No status: transport-level failure such as refused connection or DNS
            message.contains("timed out") || message.contains("connect")
        }
        _ => false,
    }
}

/// `base_delay * 2^attempt`, capped at 30 seconds.
pub fn backoff_duration(attempt: u32, base_delay_ms: u64) -> Duration {
    let delay = base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay.min(30_000))
}
