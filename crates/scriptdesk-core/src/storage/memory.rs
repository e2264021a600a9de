//! In-memory document store.
//!
//! Used by tests and by ephemeral (`--ephemeral`) runs. Clones share the same
//! backing maps, so a test can hand one clone to the registry and inspect the
//! other. Counts writes per key and can be told to fail.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use scriptdesk_types::error::StoreError;

use super::document_store::DocumentStore;

#[derive(Default)]
struct Shared {
    documents: DashMap<String, serde_json::Value>,
    writes: DashMap<String, usize>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

/// Process-local [`DocumentStore`]; nothing survives a restart.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    shared: Arc<Shared>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set` calls for a key.
    pub fn write_count(&self, key: &str) -> usize {
        self.shared.writes.get(key).map(|count| *count).unwrap_or(0)
    }

    /// The stored document, bypassing failure injection.
    pub fn raw(&self, key: &str) -> Option<serde_json::Value> {
        self.shared.documents.get(key).map(|value| value.clone())
    }

    /// Store a document without counting it as a write.
    pub fn insert_raw(&self, key: &str, value: serde_json::Value) {
        self.shared.documents.insert(key.to_string(), value);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.shared.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.shared.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        if self.shared.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Io("injected read failure".to_string()));
        }
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: &serde_json::Value) -> Result<(), StoreError> {
        if self.shared.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io("injected write failure".to_string()));
        }
        self.shared.documents.insert(key.to_string(), value.clone());
        *self.shared.writes.entry(key.to_string()).or_insert(0) += 1;
        Ok(())
    }
}
