//! Scheduled retention sweeps.
//!
//! The sweeper is a background task that applies the retention policy
//! through [`ScriptRegistry::sweep`] on a fixed period. The first sweep runs
//! one full period after start; the registry already cleaned at open.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::registry::ScriptRegistry;
use crate::storage::document_store::DocumentStore;

/// Shortest period the sweeper accepts.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Longest period the sweeper accepts (one week).
pub const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Handle to a running sweep task. Dropping it cancels the task.
pub struct RetentionSweeper {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
    period: Duration,
}

impl RetentionSweeper {
    /// Spawn the sweep loop. Must be called within a tokio runtime.
    pub fn start<S>(registry: Arc<ScriptRegistry<S>>, period: Duration) -> Self
    where
        S: DocumentStore + 'static,
    {
        let period = period.clamp(MIN_SWEEP_INTERVAL, MAX_SWEEP_INTERVAL);
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let now = Instant::now();
            let first = now.checked_add(period).unwrap_or(now);
            let mut ticker = tokio::time::interval_at(first, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let purged = registry.sweep().await;
                        if purged > 0 {
                            info!(purged, "retention sweep purged expired messages");
                        } else {
                            debug!("retention sweep found nothing to purge");
                        }
                    }
                }
            }
            debug!("retention sweeper stopped");
        });

        info!(interval_secs = period.as_secs(), "retention sweeper started");

        Self {
            cancel,
            handle: Some(handle),
            period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// A token that stops the sweeper when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancel the loop and wait for an in-progress sweep to finish.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                warn!(error = %err, "retention sweeper task failed");
            }
        }
    }
}

impl Drop for RetentionSweeper {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
