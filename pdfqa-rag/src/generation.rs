//! Text generation trait consumed by the answering orchestrator.

use async_trait::async_trait;

use crate::error::Result;

/// A model that turns a rendered prompt into answer text.
///
/// Implementations should surface timeouts and transport failures as
/// [`RagError::GenerationError`](crate::RagError::GenerationError).
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// A short name used in logs and errors.
    fn name(&self) -> &str;
}
