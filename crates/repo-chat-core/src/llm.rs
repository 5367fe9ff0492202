//! Language-model capability trait.
//!
//! The core only needs text in, text out. Provider request and response
//! shapes stay in the app crate's implementations.

use async_trait::async_trait;

use crate::error::LlmError;

/// Default sampling temperature: low, favouring factual answers.
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// A stateless text-completion capability.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Provider name used in logs and errors (e.g. `"openai"`).
    fn name(&self) -> &str;

    /// Complete `prompt` at the given sampling temperature.
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, LlmError>;
}
