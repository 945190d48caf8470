use async_trait::async_trait;

use crate::llm_client::{LlmClient, LlmError};

/// Qualitative assessment capability. Takes a finished prompt and returns the
/// generated prose unparsed.
///
/// Carried in the pipeline as `Arc<dyn Narrator>`.
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn assess(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Default narrator backed by the Gemini client.
pub struct GeminiNarrator(pub LlmClient);

#[async_trait]
impl Narrator for GeminiNarrator {
    async fn assess(&self, prompt: &str) -> Result<String, LlmError> {
        self.0.generate(prompt).await
    }
}
