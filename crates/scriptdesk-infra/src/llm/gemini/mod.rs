//! Google Gemini response generator.
//!
//! [`GeminiGenerator`] implements
//! [`ResponseGenerator`](scriptdesk_core::chat::generator::ResponseGenerator)
//! over the `generateContent` REST endpoint.

pub mod client;
pub mod types;

pub use client::GeminiGenerator;
