//! Vision LLM backends.
//!
//! A provider abstraction over Ollama, LM Studio, OpenAI and Google Gemini,
//! plus routing from model names to backends and the model catalog.

pub(crate) mod google;
pub(crate) mod lmstudio;
pub mod model;
pub(crate) mod ollama;
pub(crate) mod openai;
pub mod provider;
pub mod retry;

pub use model::{list_models, ModelSpec, ProviderKind, CLOUD_MODELS};
pub use provider::{ImageInput, LlmProvider, LlmProviderFactory, LlmRequest, LlmResponse};
