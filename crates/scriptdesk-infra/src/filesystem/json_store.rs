//! JSON-file document store.
//!
//! Each document lives in `{dir}/{key}.json`. Writes go to a temporary
//! sibling file that is then renamed over the target, so a crash mid-write
//! leaves the previous document intact.

use std::path::{Path, PathBuf};

use scriptdesk_core::storage::document_store::DocumentStore;
use scriptdesk_types::error::StoreError;
use tracing::debug;

/// Directory-backed implementation of `DocumentStore`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`.
    pub fn document_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(StoreError::Io(format!("invalid document key: '{key}'")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl DocumentStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        let path = self.document_path(key)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    async fn set(&self, key: &str, value: &serde_json::Value) -> Result<(), StoreError> {
        let path = self.document_path(key)?;
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        let content = serde_json::to_string_pretty(value)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&tmp, &content).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(key, path = %path.display(), "document saved");
        Ok(())
    }
}
