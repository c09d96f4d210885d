//! Vision provider integration for damage assessment.
//!
//! Provides a provider abstraction over the supported vision backends
//! (OpenAI, Gemini) and the registry that maps request engine selectors to
//! configured providers.

pub(crate) mod gemini;
pub(crate) mod openai;
pub(crate) mod prompt;
pub(crate) mod provider;
pub(crate) mod retry;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
pub use provider::{
    resolve_env_var, ImageInput, ProviderRegistry, VisionProvider, VisionRequest, VisionResponse,
};
