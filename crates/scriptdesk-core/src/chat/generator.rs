//! ResponseGenerator trait definition.
//!
//! A generator turns one prompt into one reply. Uses RPITIT, so concrete
//! generators are used directly or through [`BoxResponseGenerator`] when the
//! backend is picked at runtime.
//!
//! [`BoxResponseGenerator`]: super::box_generator::BoxResponseGenerator

use scriptdesk_types::error::GenerationError;

/// Backend that produces an assistant reply for a prompt.
///
/// Implementations live in scriptdesk-infra (e.g., `GeminiGenerator`).
pub trait ResponseGenerator: Send + Sync {
    /// Short backend name for logs (e.g., "gemini", "echo").
    fn name(&self) -> &str;

    /// Produce a reply for `prompt`. The prompt is the user's message text
    /// with no history attached.
    fn generate(
        &self,
        prompt: &str,
    ) -> impl std::future::Future<Output = Result<String, GenerationError>> + Send;
}
