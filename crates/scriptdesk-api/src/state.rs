//! Application state wiring the session together.
//!
//! The session manager is generic over the document store and generator;
//! AppState pins it to [`WorkspaceStore`] (the configured backend) and a
//! [`BoxResponseGenerator`].

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::debug;

use scriptdesk_core::chat::box_generator::BoxResponseGenerator;
use scriptdesk_core::chat::session::{SessionManager, SessionOptions};
use scriptdesk_core::clock::SystemClock;
use scriptdesk_core::registry::ScriptRegistry;
use scriptdesk_core::storage::document_store::DocumentStore;
use scriptdesk_core::storage::memory::InMemoryDocumentStore;
use scriptdesk_infra::config::load_workspace_config;
use scriptdesk_infra::filesystem::json_store::JsonFileStore;
use scriptdesk_infra::filesystem::resolve_data_dir;
use scriptdesk_infra::llm::build_generator;
use scriptdesk_infra::llm::echo::EchoGenerator;
use scriptdesk_infra::sqlite::documents::SqliteDocumentStore;
use scriptdesk_infra::sqlite::pool::{DatabasePool, database_url};
use scriptdesk_types::config::{StorageBackend, WorkspaceConfig};
use scriptdesk_types::error::StoreError;

/// The document store picked at startup.
pub enum WorkspaceStore {
    Sqlite(SqliteDocumentStore),
    Json(JsonFileStore),
    Memory(InMemoryDocumentStore),
}

impl WorkspaceStore {
    pub fn describe(&self) -> &'static str {
        match self {
            WorkspaceStore::Sqlite(_) => "sqlite",
            WorkspaceStore::Json(_) => "json",
            WorkspaceStore::Memory(_) => "memory",
        }
    }

    async fn close(&self) {
        if let WorkspaceStore::Sqlite(store) = self {
            store.pool().close().await;
        }
    }
}

impl DocumentStore for WorkspaceStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        match self {
            WorkspaceStore::Sqlite(store) => store.get(key).await,
            WorkspaceStore::Json(store) => store.get(key).await,
            WorkspaceStore::Memory(store) => store.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: &serde_json::Value) -> Result<(), StoreError> {
        match self {
            WorkspaceStore::Sqlite(store) => store.set(key, value).await,
            WorkspaceStore::Json(store) => store.set(key, value).await,
            WorkspaceStore::Memory(store) => store.set(key, value).await,
        }
    }
}

/// Concrete session type used by every command.
pub type ConcreteSession = SessionManager<WorkspaceStore, BoxResponseGenerator>;

/// How much of the runtime a command needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    /// Single command: no sweeper, no generator required.
    OneShot,
    /// Chat loop: configured generator and background sweeper.
    Interactive,
}

/// Shared application state.
pub struct AppState {
    pub session: ConcreteSession,
    pub config: WorkspaceConfig,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Load config, open the store, and start the session.
    pub async fn init(mode: StartMode, ephemeral: bool) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        let config = load_workspace_config(&data_dir).await;

        let store = if ephemeral {
            WorkspaceStore::Memory(InMemoryDocumentStore::new())
        } else {
            open_store(&config, &data_dir).await?
        };
        debug!(backend = store.describe(), data_dir = %data_dir.display(), "store opened");

        let generator = match mode {
            StartMode::Interactive => build_generator(&config.generator).with_context(|| {
                format!(
                    "could not set up the '{}' generator (check [generator] in {}/config.toml)",
                    config.generator.provider,
                    data_dir.display()
                )
            })?,
            StartMode::OneShot => BoxResponseGenerator::new(EchoGenerator),
        };

        let mut options = SessionOptions::from_config(&config);
        if mode == StartMode::OneShot {
            options = options.without_sweeper();
        }

        let session = SessionManager::open(store, generator, Arc::new(SystemClock), options).await;

        Ok(Self {
            session,
            config,
            data_dir,
        })
    }

    pub fn registry(&self) -> &ScriptRegistry<WorkspaceStore> {
        self.session.registry()
    }

    /// Stop background work, flush, and close the store.
    pub async fn shutdown(self) {
        let registry = Arc::clone(self.session.registry());
        self.session.shutdown().await;
        registry.store().close().await;
    }
}

async fn open_store(config: &WorkspaceConfig, data_dir: &std::path::Path) -> anyhow::Result<WorkspaceStore> {
    tokio::fs::create_dir_all(data_dir)
        .await
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    let store = match config.storage.backend {
        StorageBackend::Sqlite => {
            let pool = DatabasePool::new(&database_url(data_dir))
                .await
                .context("failed to open the script database")?;
            WorkspaceStore::Sqlite(SqliteDocumentStore::new(pool))
        }
        StorageBackend::Json => WorkspaceStore::Json(JsonFileStore::new(data_dir)),
    };
    Ok(store)
}
