//! Script registry: the single owner of scripts and chat histories.
//!
//! All mutations go through [`ScriptRegistry::apply`]. Each command is applied
//! to the in-memory state and the affected documents are written through to
//! the store while the state lock is still held, so saves land in command
//! order and a retention sweep always sees the latest state.

pub mod command;
mod state;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use scriptdesk_types::chat::{ChatHistories, ChatHistory, ChatMessage};
use scriptdesk_types::config::WorkspaceConfig;
use scriptdesk_types::script::{Script, ScriptId, ScriptView};
use tokio::sync::Mutex;
use tracing::{debug, info};

pub use command::{CommandOutcome, IgnoreReason, RegistryCommand};
pub use state::default_scripts;

use command::Dirty;
use state::RegistryState;

use crate::clock::Clock;
use crate::recency::{DEFAULT_RECENT_WINDOW_HOURS, view_scripts};
use crate::retention::RetentionPolicy;
use crate::storage::document_store::DocumentStore;
use crate::storage::persistent::{CHAT_HISTORIES_KEY, PersistentStore, SCRIPTS_KEY};

/// Tunables for a registry.
#[derive(Debug, Clone)]
pub struct RegistrySettings {
    pub retention: RetentionPolicy,
    pub recent_window: Duration,
    /// Seed [`default_scripts`] when no script list is stored.
    pub seed_defaults: bool,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            retention: RetentionPolicy::default(),
            recent_window: Duration::hours(DEFAULT_RECENT_WINDOW_HOURS),
            seed_defaults: true,
        }
    }
}

impl From<&WorkspaceConfig> for RegistrySettings {
    fn from(config: &WorkspaceConfig) -> Self {
        Self {
            retention: RetentionPolicy::new(config.retention.ttl()),
            recent_window: config.recent_window(),
            seed_defaults: config.seed_default_scripts,
        }
    }
}

/// Owns the script list, the history map, and the active-script reference.
///
/// Generic over `DocumentStore` so scriptdesk-core never depends on
/// scriptdesk-infra.
pub struct ScriptRegistry<S: DocumentStore> {
    store: PersistentStore<S>,
    clock: Arc<dyn Clock>,
    settings: RegistrySettings,
    state: Mutex<RegistryState>,
}

impl<S: DocumentStore> ScriptRegistry<S> {
    /// Load both documents and bring them to a consistent, retention-clean
    /// state.
    ///
    /// - Missing script list: seeded (or empty when seeding is off).
    /// - Missing history map: an empty history per script.
    /// - Histories with no script are dropped.
    /// - Expired messages are purged before first use.
    ///
    /// Documents that differ from what was loaded are saved once.
    pub async fn open(store: S, clock: Arc<dyn Clock>, settings: RegistrySettings) -> Self {
        let store = PersistentStore::new(store);
        let now = clock.now();

        let loaded_scripts: Option<Vec<Script>> = store.load(SCRIPTS_KEY).await;
        let loaded_histories: Option<ChatHistories> = store.load(CHAT_HISTORIES_KEY).await;

        let scripts_seeded = loaded_scripts.is_none();
        let scripts = loaded_scripts.unwrap_or_else(|| {
            if settings.seed_defaults {
                default_scripts(now)
            } else {
                Vec::new()
            }
        });

        let mut histories_dirty = loaded_histories.is_none();
        let histories = loaded_histories.unwrap_or_else(|| {
            scripts
                .iter()
                .map(|s| (s.id.clone(), ChatHistory::new()))
                .collect()
        });

        let mut state = RegistryState::new(scripts, histories);

        let orphans = state.prune_orphans();
        if orphans > 0 {
            debug!(orphans, "dropped histories without a script");
            histories_dirty = true;
        }

        let purged = settings.retention.apply_in_place(&mut state.histories, now);
        if purged > 0 {
            info!(purged, "purged expired messages on open");
            histories_dirty = true;
        }

        if scripts_seeded {
            store.save(SCRIPTS_KEY, &state.scripts).await;
        }
        if histories_dirty {
            store.save(CHAT_HISTORIES_KEY, &state.histories).await;
        }

        info!(
            scripts = state.scripts.len(),
            seeded = scripts_seeded,
            "script registry opened"
        );

        Self {
            store,
            clock,
            settings,
            state: Mutex::new(state),
        }
    }

    /// The single mutation entry point.
    pub async fn apply(&self, command: RegistryCommand) -> CommandOutcome {
        let name = command.name();
        let mut state = self.state.lock().await;
        let (outcome, dirty) = state.execute(command, self.clock.now(), &self.settings.retention);

        if let CommandOutcome::Ignored(reason) = &outcome {
            debug!(command = name, ?reason, "command ignored");
        }

        self.persist(&mut state, dirty).await;
        outcome
    }

    async fn persist(&self, state: &mut RegistryState, dirty: Dirty) {
        if dirty.scripts {
            self.store.save(SCRIPTS_KEY, &state.scripts).await;
        }
        if dirty.histories {
            state.prune_orphans();
            self.store.save(CHAT_HISTORIES_KEY, &state.histories).await;
        }
    }

    // --- Commands ---

    /// Create a script, make it active, and return it.
    pub async fn create(&self) -> Script {
        let mut state = self.state.lock().await;
        let script = state.create(self.clock.now());
        self.persist(&mut state, Dirty::BOTH).await;
        script
    }

    pub async fn rename(&self, id: &ScriptId, name: &str) -> CommandOutcome {
        self.apply(RegistryCommand::Rename {
            id: id.clone(),
            name: name.to_string(),
        })
        .await
    }

    pub async fn delete(&self, id: &ScriptId) -> CommandOutcome {
        self.apply(RegistryCommand::Delete { id: id.clone() }).await
    }

    pub async fn append(&self, id: &ScriptId, message: ChatMessage) -> CommandOutcome {
        self.apply(RegistryCommand::Append {
            id: id.clone(),
            message,
        })
        .await
    }

    pub async fn touch(&self, id: &ScriptId) -> CommandOutcome {
        self.apply(RegistryCommand::Touch { id: id.clone() }).await
    }

    pub async fn activate(&self, id: &ScriptId) -> CommandOutcome {
        self.apply(RegistryCommand::Activate { id: id.clone() }).await
    }

    /// Run retention now. Returns the number of purged messages.
    pub async fn sweep(&self) -> usize {
        match self.apply(RegistryCommand::Sweep).await {
            CommandOutcome::Swept { purged } => purged,
            _ => 0,
        }
    }

    /// Re-save both documents from the current state.
    pub async fn flush(&self) {
        let mut state = self.state.lock().await;
        self.persist(&mut state, Dirty::BOTH).await;
    }

    // --- Reads ---

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    /// Access the underlying store.
    pub fn store(&self) -> &S {
        self.store.inner()
    }

    /// All scripts in insertion order.
    pub async fn scripts(&self) -> Vec<Script> {
        self.state.lock().await.scripts.clone()
    }

    /// Scripts under `view`, evaluated at the current time.
    pub async fn list(&self, view: ScriptView) -> Vec<Script> {
        let state = self.state.lock().await;
        view_scripts(
            &state.scripts,
            view,
            self.clock.now(),
            self.settings.recent_window,
        )
    }

    pub async fn get(&self, id: &ScriptId) -> Option<Script> {
        self.state.lock().await.get(id).cloned()
    }

    pub async fn contains(&self, id: &ScriptId) -> bool {
        self.state.lock().await.contains(id)
    }

    /// A script's messages; empty when the script has no history entry.
    pub async fn history(&self, id: &ScriptId) -> ChatHistory {
        self.state
            .lock()
            .await
            .histories
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    /// Snapshot of every history.
    pub async fn histories(&self) -> ChatHistories {
        self.state.lock().await.histories.clone()
    }

    pub async fn active(&self) -> Option<ScriptId> {
        self.state.lock().await.active.clone()
    }

    pub async fn active_script(&self) -> Option<Script> {
        let state = self.state.lock().await;
        state.active.as_ref().and_then(|id| state.get(id)).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::memory::InMemoryDocumentStore;
    use scriptdesk_types::chat::MessageRole;

    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_700_000_000_000).unwrap()
    }

    async fn open_with(
        store: InMemoryDocumentStore,
        clock: Arc<ManualClock>,
    ) -> ScriptRegistry<InMemoryDocumentStore> {
        ScriptRegistry::open(store, clock, RegistrySettings::default()).await
    }

    async fn fresh() -> (ScriptRegistry<InMemoryDocumentStore>, InMemoryDocumentStore, Arc<ManualClock>) {
        let store = InMemoryDocumentStore::new();
        let clock = Arc::new(ManualClock::new(start()));
        let registry = open_with(store.clone(), clock.clone()).await;
        (registry, store, clock)
    }

    fn writes(store: &InMemoryDocumentStore) -> (usize, usize) {
        (store.write_count(SCRIPTS_KEY), store.write_count(CHAT_HISTORIES_KEY))
    }

    #[tokio::test]
    async fn test_open_empty_store_seeds_defaults() {
        let (registry, store, _) = fresh().await;

        let scripts = registry.scripts().await;
        let names: Vec<&str> = scripts.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Customer Support", "Product Expert"]);
        assert!(registry.history(&ScriptId::from("1")).await.is_empty());
        assert!(registry.active().await.is_none());

        assert_eq!(writes(&store), (1, 1));
        let stored = store.raw(CHAT_HISTORIES_KEY).unwrap();
        assert_eq!(stored, serde_json::json!({"1": [], "2": []}));
    }

    #[tokio::test]
    async fn test_open_without_seeding() {
        let store = InMemoryDocumentStore::new();
        let clock = Arc::new(ManualClock::new(start()));
        let settings = RegistrySettings {
            seed_defaults: false,
            ..RegistrySettings::default()
        };
        let registry = ScriptRegistry::open(store, clock, settings).await;
        assert!(registry.scripts().await.is_empty());
    }

    #[tokio::test]
    async fn test_open_loads_stored_documents_and_cleans() {
        let store = InMemoryDocumentStore::new();
        let now = start();
        store.insert_raw(
            SCRIPTS_KEY,
            serde_json::json!([{"id": "a", "name": "Alpha", "lastAccessed": now.timestamp_millis()}]),
        );
        store.insert_raw(
            CHAT_HISTORIES_KEY,
            serde_json::json!({
                "a": [
                    {"role": "user", "content": "old", "timestamp": (now - Duration::hours(25)).timestamp_millis()},
                    {"role": "assistant", "content": "new", "timestamp": (now - Duration::hours(1)).timestamp_millis()},
                    {"role": "assistant", "content": "undated"}
                ],
                "orphan": [{"role": "user", "content": "x", "timestamp": now.timestamp_millis()}]
            }),
        );

        let registry = open_with(store.clone(), Arc::new(ManualClock::new(now))).await;

        let history = registry.history(&ScriptId::from("a")).await;
        let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["new", "undated"]);
        assert!(!registry.histories().await.contains_key(&ScriptId::from("orphan")));

        // Script list was loaded, not seeded; cleaned histories were re-saved once.
        assert_eq!(writes(&store), (0, 1));
    }

    #[tokio::test]
    async fn test_open_clean_documents_saves_nothing() {
        let store = InMemoryDocumentStore::new();
        store.insert_raw(
            SCRIPTS_KEY,
            serde_json::json!([{"id": "a", "name": "Alpha", "lastAccessed": start().timestamp_millis()}]),
        );
        store.insert_raw(CHAT_HISTORIES_KEY, serde_json::json!({"a": []}));

        let _registry = open_with(store.clone(), Arc::new(ManualClock::new(start()))).await;
        assert_eq!(writes(&store), (0, 0));
    }

    #[tokio::test]
    async fn test_open_survives_unreadable_store() {
        let store = InMemoryDocumentStore::new();
        store.fail_reads(true);
        store.fail_writes(true);

        let registry = open_with(store, Arc::new(ManualClock::new(start()))).await;
        assert_eq!(registry.scripts().await.len(), 2);
    }

    #[tokio::test]
    async fn test_create_then_delete_restores_state() {
        let (registry, _, _) = fresh().await;
        let scripts_before = registry.scripts().await;
        let histories_before = registry.histories().await;

        let script = registry.create().await;
        assert_eq!(registry.active().await, Some(script.id.clone()));
        assert_eq!(registry.scripts().await.len(), scripts_before.len() + 1);

        registry.delete(&script.id).await;
        assert_eq!(registry.scripts().await, scripts_before);
        assert_eq!(registry.histories().await, histories_before);
        assert!(registry.active().await.is_none());
    }

    #[tokio::test]
    async fn test_write_through_counts() {
        let (registry, store, _) = fresh().await;
        let base = writes(&store);

        let script = registry.create().await;
        assert_eq!(writes(&store), (base.0 + 1, base.1 + 1));

        registry.rename(&script.id, "Renamed").await;
        assert_eq!(writes(&store), (base.0 + 2, base.1 + 1));

        registry
            .append(&script.id, ChatMessage::user("hello", start()))
            .await;
        assert_eq!(writes(&store), (base.0 + 2, base.1 + 2));

        registry.delete(&script.id).await;
        assert_eq!(writes(&store), (base.0 + 3, base.1 + 3));
    }

    #[tokio::test]
    async fn test_ignored_commands_save_nothing() {
        let (registry, store, _) = fresh().await;
        let base = writes(&store);
        let ghost = ScriptId::from("ghost");

        assert!(registry.rename(&ghost, "x").await.is_ignored());
        assert!(registry.delete(&ghost).await.is_ignored());
        assert!(registry.touch(&ghost).await.is_ignored());
        assert!(
            registry
                .append(&ghost, ChatMessage::user("x", start()))
                .await
                .is_ignored()
        );
        assert_eq!(writes(&store), base);
    }

    #[tokio::test]
    async fn test_stored_documents_follow_state() {
        let (registry, store, _) = fresh().await;
        let script = registry.create().await;
        registry.rename(&script.id, "Sales").await;
        registry
            .append(&script.id, ChatMessage::user("hi", start()))
            .await;

        let stored_scripts: Vec<Script> =
            serde_json::from_value(store.raw(SCRIPTS_KEY).unwrap()).unwrap();
        assert_eq!(stored_scripts.last().unwrap().name, "Sales");

        let stored_histories: ChatHistories =
            serde_json::from_value(store.raw(CHAT_HISTORIES_KEY).unwrap()).unwrap();
        assert_eq!(stored_histories[&script.id][0].role, MessageRole::User);
    }

    #[tokio::test]
    async fn test_reopen_sees_persisted_state() {
        let (registry, store, clock) = fresh().await;
        let script = registry.create().await;
        registry
            .append(&script.id, ChatMessage::user("persist me", start()))
            .await;
        drop(registry);

        let reopened = open_with(store, clock).await;
        assert_eq!(reopened.scripts().await.len(), 3);
        assert_eq!(reopened.history(&script.id).await[0].content, "persist me");
    }

    #[tokio::test]
    async fn test_list_recent_uses_clock() {
        let (registry, _, clock) = fresh().await;
        let script = registry.create().await;

        clock.advance(Duration::minutes(30));
        registry.touch(&ScriptId::from("2")).await;

        let recent: Vec<ScriptId> = registry
            .list(ScriptView::Recent)
            .await
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(recent, vec![ScriptId::from("2"), ScriptId::from("1"), script.id.clone()]);

        clock.advance(Duration::hours(24));
        assert!(registry.list(ScriptView::Recent).await.is_empty());
        assert_eq!(registry.list(ScriptView::All).await.len(), 3);
    }

    #[tokio::test]
    async fn test_activate_touches_and_sets_active() {
        let (registry, store, clock) = fresh().await;
        let base = writes(&store);
        clock.advance(Duration::minutes(5));

        registry.activate(&ScriptId::from("2")).await;
        let active = registry.active_script().await.unwrap();
        assert_eq!(active.id, ScriptId::from("2"));
        assert_eq!(active.last_accessed, start() + Duration::minutes(5));
        assert_eq!(writes(&store), (base.0 + 1, base.1));
    }

    #[tokio::test]
    async fn test_sweep_purges_with_latest_state() {
        let (registry, store, clock) = fresh().await;
        let id = ScriptId::from("1");
        registry.append(&id, ChatMessage::user("early", start())).await;
        clock.advance(Duration::hours(23));
        registry
            .append(&id, ChatMessage::user("late", clock.now()))
            .await;
        let base = writes(&store);

        clock.advance(Duration::hours(2));
        assert_eq!(registry.sweep().await, 1);
        let history = registry.history(&id).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content, "late");
        assert_eq!(writes(&store), (base.0, base.1 + 1));

        assert_eq!(registry.sweep().await, 0);
        assert_eq!(writes(&store), (base.0, base.1 + 1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_sweep_keeps_appends() {
        let (registry, store, clock) = fresh().await;
        let registry = Arc::new(registry);
        let id = ScriptId::from("1");
        registry.append(&id, ChatMessage::user("stale", start())).await;
        clock.advance(Duration::hours(25));

        for i in 0..20 {
            let sweeping = tokio::spawn({
                let registry = Arc::clone(&registry);
                async move { registry.sweep().await }
            });
            let appending = tokio::spawn({
                let registry = Arc::clone(&registry);
                let message = ChatMessage::user(format!("fresh {i}"), clock.now());
                let id = id.clone();
                async move { registry.append(&id, message).await }
            });
            let (swept, appended) = tokio::join!(sweeping, appending);
            swept.unwrap();
            assert!(!appended.unwrap().is_ignored());
        }

        let contents: Vec<String> = registry
            .history(&id)
            .await
            .into_iter()
            .map(|m| m.content)
            .collect();
        let expected: Vec<String> = (0..20).map(|i| format!("fresh {i}")).collect();
        assert_eq!(contents, expected);

        let stored: ChatHistories =
            serde_json::from_value(store.raw(CHAT_HISTORIES_KEY).unwrap()).unwrap();
        assert_eq!(stored[&id].len(), 20);
    }

    #[tokio::test]
    async fn test_create_command_matches_create() {
        let (registry, store, _) = fresh().await;
        let base = writes(&store);

        let outcome = registry.apply(RegistryCommand::Create).await;
        let CommandOutcome::Created(script) = outcome else {
            panic!("expected Created, got {outcome:?}");
        };
        assert_eq!(registry.active().await, Some(script.id.clone()));
        assert_eq!(writes(&store), (base.0 + 1, base.1 + 1));

        let second = registry.create().await;
        assert_ne!(second.id, script.id);
        assert_eq!(registry.active().await, Some(second.id));
        assert_eq!(writes(&store), (base.0 + 2, base.1 + 2));
    }

    #[tokio::test]
    async fn test_failed_saves_do_not_affect_state() {
        let (registry, store, _) = fresh().await;
        store.fail_writes(true);

        let script = registry.create().await;
        assert!(registry.contains(&script.id).await);
        assert_eq!(registry.scripts().await.len(), 3);
    }

    #[tokio::test]
    async fn test_flush_writes_both_documents() {
        let (registry, store, _) = fresh().await;
        let base = writes(&store);
        registry.flush().await;
        assert_eq!(writes(&store), (base.0 + 1, base.1 + 1));
    }
}
