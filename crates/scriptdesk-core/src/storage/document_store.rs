//! Document store trait.
//!
//! Defines the interface for string-keyed JSON document storage.
//! Implementations live in scriptdesk-infra.

use scriptdesk_types::error::StoreError;

/// Trait for durable string-keyed JSON storage.
///
/// Each key holds one whole document; `set` replaces it. Uses RPITIT
/// (native async fn in traits, Rust 2024 edition).
pub trait DocumentStore: Send + Sync {
    /// Get a document by key. Returns None if the key does not exist.
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<serde_json::Value>, StoreError>> + Send;

    /// Replace the document stored under a key (upsert).
    fn set(
        &self,
        key: &str,
        value: &serde_json::Value,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}
