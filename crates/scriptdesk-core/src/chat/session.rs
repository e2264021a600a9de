//! Session manager: the owned lifecycle object for a running workspace.
//!
//! Opening a session loads the registry, wires the chat controller to the
//! generator, and starts the retention sweeper. `shutdown` stops the sweeper
//! and flushes both documents.

use std::sync::Arc;
use std::time::Duration;

use scriptdesk_types::config::WorkspaceConfig;
use tracing::info;

use super::controller::ChatController;
use super::generator::ResponseGenerator;
use crate::clock::Clock;
use crate::registry::{RegistrySettings, ScriptRegistry};
use crate::storage::document_store::DocumentStore;
use crate::sweeper::RetentionSweeper;

/// Default period between retention sweeps.
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Everything a session needs besides its store, generator, and clock.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub registry: RegistrySettings,
    pub sweep_interval: Duration,
    pub generation_timeout: Option<Duration>,
    /// Start the background sweeper. One-shot CLI commands leave it off.
    pub run_sweeper: bool,
}

impl SessionOptions {
    pub fn from_config(config: &WorkspaceConfig) -> Self {
        Self {
            registry: RegistrySettings::from(config),
            sweep_interval: config.retention.sweep_interval(),
            generation_timeout: config.generator.timeout(),
            run_sweeper: true,
        }
    }

    pub fn without_sweeper(mut self) -> Self {
        self.run_sweeper = false;
        self
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            registry: RegistrySettings::default(),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            generation_timeout: None,
            run_sweeper: true,
        }
    }
}

/// Owns the registry, the chat controller, and the retention sweeper.
pub struct SessionManager<S: DocumentStore, G: ResponseGenerator> {
    registry: Arc<ScriptRegistry<S>>,
    controller: ChatController<S, G>,
    sweeper: Option<RetentionSweeper>,
}

impl<S, G> SessionManager<S, G>
where
    S: DocumentStore + 'static,
    G: ResponseGenerator + 'static,
{
    /// Open the registry and start background work.
    pub async fn open(store: S, generator: G, clock: Arc<dyn Clock>, options: SessionOptions) -> Self {
        let registry = Arc::new(ScriptRegistry::open(store, clock, options.registry).await);
        let controller = ChatController::new(Arc::clone(&registry), Arc::new(generator))
            .with_timeout(options.generation_timeout);
        let sweeper = options
            .run_sweeper
            .then(|| RetentionSweeper::start(Arc::clone(&registry), options.sweep_interval));

        info!(
            generator = controller.generator().name(),
            sweeper = sweeper.is_some(),
            "session opened"
        );

        Self {
            registry,
            controller,
            sweeper,
        }
    }

    pub fn registry(&self) -> &Arc<ScriptRegistry<S>> {
        &self.registry
    }

    pub fn controller(&self) -> &ChatController<S, G> {
        &self.controller
    }

    /// Stop the sweeper and flush both documents.
    ///
    /// Replies still in flight keep running and persist when they finish if
    /// the runtime is still alive.
    pub async fn shutdown(mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.stop().await;
        }
        self.registry.flush().await;
        info!(
            in_flight = self.controller.in_flight(),
            "session shut down"
        );
    }
}
