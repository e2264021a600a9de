//! BoxResponseGenerator -- object-safe dynamic dispatch wrapper for ResponseGenerator.
//!
//! 1. `ResponseGeneratorDyn` is the object-safe twin with boxed futures
//! 2. Blanket impl of `ResponseGeneratorDyn` for every `T: ResponseGenerator`
//! 3. `BoxResponseGenerator` wraps `Box<dyn ResponseGeneratorDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use scriptdesk_types::error::GenerationError;

use super::generator::ResponseGenerator;

/// Object-safe version of [`ResponseGenerator`].
pub trait ResponseGeneratorDyn: Send + Sync {
    fn name(&self) -> &str;

    fn generate_boxed<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, GenerationError>> + Send + 'a>>;
}

impl<T: ResponseGenerator> ResponseGeneratorDyn for T {
    fn name(&self) -> &str {
        ResponseGenerator::name(self)
    }

    fn generate_boxed<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, GenerationError>> + Send + 'a>> {
        Box::pin(self.generate(prompt))
    }
}

/// Type-erased generator for runtime backend selection.
///
/// Implements [`ResponseGenerator`] itself, so the chat controller takes it
/// like any concrete generator.
pub struct BoxResponseGenerator {
    inner: Box<dyn ResponseGeneratorDyn>,
}

impl BoxResponseGenerator {
    pub fn new<T: ResponseGenerator + 'static>(generator: T) -> Self {
        Self {
            inner: Box::new(generator),
        }
    }
}

impl ResponseGenerator for BoxResponseGenerator {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.inner.generate_boxed(prompt).await
    }
}

impl std::fmt::Debug for BoxResponseGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxResponseGenerator")
            .field("name", &self.inner.name())
            .finish()
    }
}
