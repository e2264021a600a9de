//! GeminiGenerator -- concrete [`ResponseGenerator`] for the Gemini API.
//!
//! Sends one user turn per call to
//! `POST {base}/v1beta/models/{model}:generateContent`. The API key is held
//! in a [`SecretString`] and only exposed when building the request header.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use scriptdesk_core::chat::generator::ResponseGenerator;
use scriptdesk_types::error::GenerationError;

use super::types::{ErrorResponse, GenerateContentRequest, GenerateContentResponse};

/// Default Gemini API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// HTTP-level timeout; the configurable generation timeout sits above this.
const HTTP_TIMEOUT: Duration = Duration::from_secs(300);

/// Gemini response generator.
pub struct GeminiGenerator {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl GeminiGenerator {
    pub fn new(api_key: SecretString, model: String) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| GenerationError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model,
        })
    }

    /// Override the base URL (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

// No Debug derive: keeps the client and key out of formatted output.

impl ResponseGenerator for GeminiGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = GenerateContentRequest::from_prompt(prompt);

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Request(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&error_body)
                .map(|e| e.error.message)
                .unwrap_or(error_body);
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Request(format!("failed to parse response: {e}")))?;

        parsed.text().ok_or(GenerationError::EmptyResponse)
    }
}
