//! Chat session controller.
//!
//! Drives the per-script send cycle `Idle -> Sending -> Idle | Failed`.
//! A submission appends the user message, marks the script `Sending`, and
//! spawns the generator call. The reply (or the fixed error message) is
//! appended to the script captured at submission time, whatever script is
//! active by then.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures_util::FutureExt;
use scriptdesk_types::chat::ChatMessage;
use scriptdesk_types::error::GenerationError;
use scriptdesk_types::script::ScriptId;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::generator::ResponseGenerator;
use crate::registry::{CommandOutcome, ScriptRegistry};
use crate::storage::document_store::DocumentStore;

/// Where a script is in its send cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionPhase {
    #[default]
    Idle,
    /// A generator call is in flight; further submissions are rejected.
    Sending,
    /// Idle, but the last reply was the error message.
    Failed,
}

impl SessionPhase {
    pub fn is_sending(self) -> bool {
        self == SessionPhase::Sending
    }
}

/// Why a submission was not accepted. Nothing is appended or saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Input was empty after trimming.
    Empty,
    /// The script already has a reply in flight.
    Busy,
    UnknownScript,
    NoActiveScript,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            RejectReason::Empty => "message is empty",
            RejectReason::Busy => "still waiting for the previous reply",
            RejectReason::UnknownScript => "script not found",
            RejectReason::NoActiveScript => "no active script",
        };
        f.write_str(text)
    }
}

/// The message a finished generation produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyOutcome {
    pub script_id: ScriptId,
    /// Assistant reply, or the error-role message on failure.
    pub message: ChatMessage,
    /// False when the script was deleted before the reply arrived.
    pub delivered: bool,
}

/// Handle to an in-flight reply. Resolves to `None` only if the generation
/// task panicked.
#[derive(Debug)]
pub struct PendingReply {
    script_id: ScriptId,
    handle: JoinHandle<ReplyOutcome>,
}

impl PendingReply {
    pub fn script_id(&self) -> &ScriptId {
        &self.script_id
    }
}

impl Future for PendingReply {
    type Output = Option<ReplyOutcome>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.handle).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(Some(outcome)),
            Poll::Ready(Err(err)) => {
                warn!(script_id = %self.script_id, error = %err, "generation task failed");
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Accepted(PendingReply),
    Rejected(RejectReason),
}

impl SubmitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitOutcome::Accepted(_))
    }
}

/// Accepts user input for scripts and runs their generator calls.
///
/// Scripts are independent: each may have one reply in flight at a time.
pub struct ChatController<S: DocumentStore, G: ResponseGenerator> {
    registry: Arc<ScriptRegistry<S>>,
    generator: Arc<G>,
    phases: Arc<DashMap<ScriptId, SessionPhase>>,
    timeout: Option<Duration>,
}

impl<S, G> ChatController<S, G>
where
    S: DocumentStore + 'static,
    G: ResponseGenerator + 'static,
{
    pub fn new(registry: Arc<ScriptRegistry<S>>, generator: Arc<G>) -> Self {
        Self {
            registry,
            generator,
            phases: Arc::new(DashMap::new()),
            timeout: None,
        }
    }

    /// Fail generations that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Arc<ScriptRegistry<S>> {
        &self.registry
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn phase(&self, id: &ScriptId) -> SessionPhase {
        self.phases.get(id).map(|p| *p).unwrap_or_default()
    }

    /// Number of scripts with a reply in flight.
    pub fn in_flight(&self) -> usize {
        self.phases.iter().filter(|p| p.is_sending()).count()
    }

    /// Submit `input` to the active script.
    pub async fn submit_active(&self, input: &mut String) -> SubmitOutcome {
        match self.registry.active().await {
            Some(id) => self.submit(&id, input).await,
            None => SubmitOutcome::Rejected(RejectReason::NoActiveScript),
        }
    }

    /// Submit `input` to `script_id`.
    ///
    /// On acceptance the user message is appended, `input` is cleared, the
    /// script is touched, and the generator call starts in the background.
    /// On rejection `input` is left as it was.
    pub async fn submit(&self, script_id: &ScriptId, input: &mut String) -> SubmitOutcome {
        let prompt = input.trim();
        if prompt.is_empty() {
            return SubmitOutcome::Rejected(RejectReason::Empty);
        }
        if !self.registry.contains(script_id).await {
            return SubmitOutcome::Rejected(RejectReason::UnknownScript);
        }
        if !self.begin_sending(script_id) {
            debug!(%script_id, "submission rejected, reply in flight");
            return SubmitOutcome::Rejected(RejectReason::Busy);
        }

        let prompt = prompt.to_string();
        let user_message = ChatMessage::user(prompt.clone(), self.registry.now());
        if self.registry.append(script_id, user_message).await.is_ignored() {
            // Deleted between the lookup and the append.
            self.phases.remove(script_id);
            return SubmitOutcome::Rejected(RejectReason::UnknownScript);
        }
        input.clear();
        self.registry.touch(script_id).await;

        let handle = tokio::spawn(run_generation(
            Arc::clone(&self.registry),
            Arc::clone(&self.generator),
            Arc::clone(&self.phases),
            script_id.clone(),
            prompt,
            self.timeout,
        ));

        SubmitOutcome::Accepted(PendingReply {
            script_id: script_id.clone(),
            handle,
        })
    }

    /// Delete a script and drop its phase entry.
    pub async fn delete_script(&self, id: &ScriptId) -> CommandOutcome {
        let outcome = self.registry.delete(id).await;
        self.phases.remove(id);
        outcome
    }

    /// Atomic `* -> Sending` unless already `Sending`.
    fn begin_sending(&self, script_id: &ScriptId) -> bool {
        match self.phases.entry(script_id.clone()) {
            Entry::Occupied(entry) if entry.get().is_sending() => false,
            Entry::Occupied(mut entry) => {
                entry.insert(SessionPhase::Sending);
                true
            }
            Entry::Vacant(entry) => {
                entry.insert(SessionPhase::Sending);
                true
            }
        }
    }
}

async fn run_generation<S, G>(
    registry: Arc<ScriptRegistry<S>>,
    generator: Arc<G>,
    phases: Arc<DashMap<ScriptId, SessionPhase>>,
    script_id: ScriptId,
    prompt: String,
    timeout: Option<Duration>,
) -> ReplyOutcome
where
    S: DocumentStore + 'static,
    G: ResponseGenerator + 'static,
{
    let call = async {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, generator.generate(&prompt))
                .await
                .unwrap_or(Err(GenerationError::Timeout(limit.as_secs()))),
            None => generator.generate(&prompt).await,
        }
    };
    let result = AssertUnwindSafe(call)
        .catch_unwind()
        .await
        .unwrap_or(Err(GenerationError::Panicked));

    let (message, phase) = match result {
        Ok(text) => (
            ChatMessage::assistant(text, registry.now()),
            SessionPhase::Idle,
        ),
        Err(err) => {
            warn!(
                %script_id,
                generator = generator.name(),
                error = %err,
                "response generation failed"
            );
            (ChatMessage::generation_error(registry.now()), SessionPhase::Failed)
        }
    };

    let delivered = !registry
        .append(&script_id, message.clone())
        .await
        .is_ignored();
    if !delivered {
        debug!(%script_id, "reply dropped, script no longer exists");
        phases.remove(&script_id);
    } else if phase == SessionPhase::Idle {
        phases.remove(&script_id);
    } else {
        phases.insert(script_id.clone(), phase);
    }

    ReplyOutcome {
        script_id,
        message,
        delivered,
    }
}
