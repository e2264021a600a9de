//! Soft-failing persistence adapter.
//!
//! Wraps a [`DocumentStore`] so that no storage or serialization failure ever
//! reaches the caller: loads degrade to "absent" and saves to a logged no-op.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::document_store::DocumentStore;

/// Key of the script list document.
pub const SCRIPTS_KEY: &str = "scripts_data";

/// Key of the script id to chat history document.
pub const CHAT_HISTORIES_KEY: &str = "chat_histories";

/// Typed, never-failing view over a [`DocumentStore`].
pub struct PersistentStore<S: DocumentStore> {
    inner: S,
}

impl<S: DocumentStore> PersistentStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Access the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Load and decode a document.
    ///
    /// Returns `None` when the key is missing, the store fails, or the stored
    /// value does not decode as `T`. Failures are logged.
    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = match self.inner.get(key).await {
            Ok(Some(value)) => value,
            Ok(None) => {
                debug!(key, "no stored document");
                return None;
            }
            Err(err) => {
                warn!(key, error = %err, "failed to read document, treating as absent");
                return None;
            }
        };

        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                warn!(key, error = %err, "stored document is malformed, treating as absent");
                None
            }
        }
    }

    /// Encode and store a document. Returns whether the write went through.
    pub async fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let encoded = match serde_json::to_value(value) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(key, error = %err, "failed to encode document, skipping save");
                return false;
            }
        };

        match self.inner.set(key, &encoded).await {
            Ok(()) => {
                debug!(key, "document saved");
                true
            }
            Err(err) => {
                warn!(key, error = %err, "failed to save document");
                false
            }
        }
    }
}
