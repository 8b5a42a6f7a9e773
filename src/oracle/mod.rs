pub mod ollama;
pub mod prompt;

use async_trait::async_trait;

use crate::error::Result;

/// Text-generation oracle: named template variables in, generated text out.
///
/// No retry or timeout contract of its own; retries happen at the workflow
/// level, never inside the call.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Generate a completion for `prompt` using the named model.
    async fn generate(&self, model: &str, prompt: &str) -> Result<String>;
}
