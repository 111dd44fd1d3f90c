//! Image pipeline stages.
//!
//! - **discovery**: find image files in directories
//! - **validate**: size, magic-byte and format checks before any model call
//! - **processor**: runs images through generation, sidecars and embedding

pub mod discovery;
pub mod processor;
pub mod validate;

pub use discovery::{DiscoveredFile, FileDiscovery};
pub use processor::{BatchResult, KeywordPipeline, ProcessOptions};
pub use validate::{ImageKind, ValidatedImage, Validator};
