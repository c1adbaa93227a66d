//! Conversation state machine.
//!
//! [`ConversationSession`] owns the single turn log of an orchestrator and
//! the continuation handles of continuation-family backends. It is what makes
//! stateless vendors behave like a stateful chat partner:
//!
//! - stateless backends receive the whole history on every call
//! - continuation backends get a handle seeded with every turn but the newest,
//!   then receive only the newest user message through it
//!
//! A handle is reused only while it is in sync with the history. It is
//! rebuilt after a reset, after other backends added turns since it last
//! exchanged, and after it failed.
//!
//! Failures never escape [`ConversationSession::chat`]; they become the
//! reply text.

use crate::backend::{
    BackendFailure, ChatFamily, ContinuationHandle, GenerationError, Registry, Router,
    TextCapability,
};
use crate::types::{CapabilityKind, ConversationHistory, GenerationOptions, Turn};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// How a chat turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatOutcome {
    /// The backend replied; the reply was appended as the assistant turn
    Answered,
    /// The backend failed; the failure text was appended as the assistant turn
    BackendFailed,
    /// No backend could be selected; only the user turn was appended
    Unrouted,
}

/// Result of one chat turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    /// Reply or diagnostic text
    pub text: String,
    /// Identity of the backend that handled the turn, if one was selected
    pub backend: Option<String>,
    pub outcome: ChatOutcome,
}

impl ChatReply {
    pub fn is_answered(&self) -> bool {
        self.outcome == ChatOutcome::Answered
    }
}

/// Render a failure the way it is shown to the caller and stored in history
pub fn render_failure(error: &impl std::fmt::Display) -> String {
    format!("Error: {}", error)
}

#[derive(Debug)]
struct LiveHandle {
    handle: Box<dyn ContinuationHandle>,
    /// History epoch the handle was seeded in
    epoch: u64,
    /// History length the handle has seen, including its own last reply
    synced_len: usize,
}

/// Turn log plus per-backend continuation handles
#[derive(Debug, Default)]
pub struct ConversationSession {
    history: ConversationHistory,
    handles: HashMap<String, LiveHandle>,
}

impl ConversationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// The turn log
    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Number of turns in the log
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Whether a continuation handle is currently held for `identity`
    pub fn has_live_handle(&self, identity: &str) -> bool {
        self.handles.contains_key(identity)
    }

    /// Run one chat turn.
    ///
    /// The user turn is always appended. An assistant turn follows unless
    /// routing failed, in which case the history grows by exactly one.
    pub async fn chat(
        &mut self,
        registry: &Registry,
        router: &Router,
        message: &str,
        identity: Option<&str>,
        options: &GenerationOptions,
    ) -> ChatReply {
        self.history.push_user(message);

        let entry = match router.resolve(registry, CapabilityKind::Text, identity) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, history_len = self.history.len(), "Chat turn could not be routed");
                return ChatReply {
                    text: render_failure(&e),
                    backend: None,
                    outcome: ChatOutcome::Unrouted,
                };
            }
        };
        let backend = entry.identity().to_string();

        let result = match entry.as_text() {
            Some(adapter) => match adapter.family() {
                ChatFamily::Stateless => adapter.chat(self.history.turns(), options).await,
                ChatFamily::Continuation => {
                    self.send_via_handle(&backend, adapter.as_ref(), options)
                        .await
                }
            },
            None => Err(BackendFailure::unsupported(&backend, "chat")),
        };

        match result {
            Ok(reply) => {
                info!(
                    backend = %backend,
                    history_len = self.history.len() + 1,
                    "Chat turn answered"
                );
                self.history.push_assistant(&reply);
                ChatReply {
                    text: reply,
                    backend: Some(backend),
                    outcome: ChatOutcome::Answered,
                }
            }
            Err(failure) => {
                warn!(backend = %backend, error = %failure, "Chat turn failed");
                let text = render_failure(&failure);
                self.history.push_assistant(&text);
                ChatReply {
                    text,
                    backend: Some(backend),
                    outcome: ChatOutcome::BackendFailed,
                }
            }
        }
    }

    /// Send the newest user turn through `identity`'s handle, seeding a new
    /// one first when there is none or it is out of sync.
    async fn send_via_handle(
        &mut self,
        identity: &str,
        adapter: &dyn TextCapability,
        options: &GenerationOptions,
    ) -> Result<String, BackendFailure> {
        let epoch = self.history.epoch();
        let Some((pending, seed)) = self.history.turns().split_last() else {
            return Err(BackendFailure::unsupported(identity, "chat with an empty history"));
        };

        let in_sync = self
            .handles
            .get(identity)
            .is_some_and(|live| live.epoch == epoch && live.synced_len == seed.len());

        if !in_sync {
            self.handles.remove(identity);
            debug!(backend = identity, seed_turns = seed.len(), "Seeding continuation handle");
            let handle = adapter.start_session(seed)?;
            self.handles.insert(
                identity.to_string(),
                LiveHandle {
                    handle,
                    epoch,
                    synced_len: seed.len(),
                },
            );
        }

        let Some(live) = self.handles.get_mut(identity) else {
            return Err(BackendFailure::unsupported(identity, "continuation sessions"));
        };

        match live.handle.send(&pending.content, options).await {
            Ok(reply) => {
                // The handle now holds the pending turn and its own reply
                live.synced_len = seed.len() + 2;
                Ok(reply)
            }
            Err(failure) => {
                self.handles.remove(identity);
                Err(failure)
            }
        }
    }

    /// Clear the history and drop every continuation handle
    pub fn reset(&mut self) {
        let dropped = self.handles.len();
        self.history.clear();
        self.handles.clear();
        info!(dropped_handles = dropped, "Conversation reset");
    }

    /// Snapshot of the turns
    pub fn turns(&self) -> &[Turn] {
        self.history.turns()
    }
}

/// Route a one-shot request of `kind` and call the kind's generation
/// operation. The conversation history is not touched.
pub async fn generate_stateless(
    registry: &Registry,
    router: &Router,
    kind: CapabilityKind,
    prompt: &str,
    identity: Option<&str>,
    options: &GenerationOptions,
) -> Result<String, GenerationError> {
    let entry = router.resolve(registry, kind, identity)?;
    debug!(kind = %kind, backend = entry.identity(), "Stateless generation");

    let result = match kind {
        CapabilityKind::Text => match entry.as_text() {
            Some(adapter) => adapter.generate_text(prompt, options).await,
            None => Err(BackendFailure::unsupported(entry.identity(), "text generation")),
        },
        CapabilityKind::Image => match entry.as_image() {
            Some(adapter) => adapter.generate_image(prompt, options).await,
            None => Err(BackendFailure::unsupported(entry.identity(), "image generation")),
        },
        CapabilityKind::Video => match entry.as_video() {
            Some(adapter) => adapter.generate_video(prompt, options).await,
            None => Err(BackendFailure::unsupported(entry.identity(), "video generation")),
        },
    };

    result.map_err(|failure| {
        warn!(kind = %kind, backend = entry.identity(), error = %failure, "Generation failed");
        GenerationError::from(failure)
    })
}
