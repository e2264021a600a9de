//! Offline generator that answers with the prompt.

use scriptdesk_core::chat::generator::ResponseGenerator;
use scriptdesk_types::error::GenerationError;

/// Returns the prompt as the reply. Used when no backend is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoGenerator;

impl ResponseGenerator for EchoGenerator {
    fn name(&self) -> &str {
        "echo"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        Ok(prompt.to_string())
    }
}
