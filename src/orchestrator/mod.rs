//! The orchestrator: one conversation, many backends.
//!
//! [`Orchestrator`] composes the registry, the router and the conversation
//! session behind a small surface that never fails once constructed:
//!
//! - [`Orchestrator::chat`] returns the reply or a rendered failure
//! - `generate_text`/`generate_image`/`generate_video` return the payload
//!   (text or artifact path) or a rendered failure
//! - [`Orchestrator::try_generate`] and [`Orchestrator::try_set_active_selection`]
//!   are the structured variants
//!
//! Construction is the only fallible step. It validates configuration,
//! creates the output directories and builds the registry.
//!
//! # Example
//!
//! ```no_run
//! use switchboard::{Orchestrator, SwitchboardConfig};
//!
//! #[tokio::main]
//! async fn main() -> switchboard::Result<()> {
//!     let config = SwitchboardConfig::from_env()?;
//!     let mut orchestrator = Orchestrator::new(&config)?;
//!
//!     println!("{}", orchestrator.chat("Hello!", None).await);
//!     Ok(())
//! }
//! ```

use crate::backend::{GenerationError, Registry, Router, RoutingError};
use crate::config::SwitchboardConfig;
use crate::conversation::{self, render_failure, ChatReply, ConversationSession};
use crate::error::Result;
use crate::types::{CapabilityKind, ConversationHistory, GenerationOptions};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

/// Point-in-time view of an orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub session_id: Uuid,
    /// Backend that serves each kind when no identity is given
    pub active_selections: BTreeMap<CapabilityKind, String>,
    /// Registered identities per kind, in registration order
    pub identities: BTreeMap<CapabilityKind, Vec<String>>,
    /// Number of turns in the conversation history
    pub conversation_length: usize,
}

/// Single-conversation facade over every configured backend
#[derive(Debug)]
pub struct Orchestrator {
    session_id: Uuid,
    registry: Registry,
    router: Router,
    session: ConversationSession,
    default_options: GenerationOptions,
}

impl Orchestrator {
    /// Build an orchestrator from a configuration snapshot.
    ///
    /// Fails when the configuration is invalid (for instance the default text
    /// provider needs a credential that is missing) or an output directory
    /// cannot be created. Vendors that fail to construct are skipped.
    pub fn new(config: &SwitchboardConfig) -> Result<Self> {
        config.validate()?;
        config.ensure_output_dirs()?;

        let registry = Registry::from_config(config);
        let router = Router::from_defaults(&config.defaults);
        let orchestrator = Self::from_parts(registry, router);

        info!(
            session = %orchestrator.session_id,
            text = ?orchestrator.active_selection(CapabilityKind::Text),
            image = ?orchestrator.active_selection(CapabilityKind::Image),
            "Orchestrator ready"
        );
        Ok(orchestrator)
    }

    /// Assemble an orchestrator from an already populated registry
    pub fn from_parts(registry: Registry, router: Router) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            registry,
            router,
            session: ConversationSession::new(),
            default_options: GenerationOptions::default(),
        }
    }

    /// Options used by `chat`
    pub fn with_default_options(mut self, options: GenerationOptions) -> Self {
        self.default_options = options;
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Send a chat message and return the reply, or the rendered failure.
    ///
    /// With no `identity` the active text selection answers.
    pub async fn chat(&mut self, message: &str, identity: Option<&str>) -> String {
        self.chat_reply(message, identity).await.text
    }

    /// Like [`chat`](Self::chat) but also reports which backend answered
    pub async fn chat_reply(&mut self, message: &str, identity: Option<&str>) -> ChatReply {
        let options = self.default_options.clone();
        self.chat_with_options(message, identity, &options).await
    }

    /// Chat turn with explicit generation options
    pub async fn chat_with_options(
        &mut self,
        message: &str,
        identity: Option<&str>,
        options: &GenerationOptions,
    ) -> ChatReply {
        let span = info_span!("chat", session = %self.session_id, turn = self.session.len());
        self.session
            .chat(&self.registry, &self.router, message, identity, options)
            .instrument(span)
            .await
    }

    /// One-shot text generation; the conversation history is untouched
    pub async fn generate_text(
        &self,
        prompt: &str,
        identity: Option<&str>,
        options: &GenerationOptions,
    ) -> String {
        self.generate(CapabilityKind::Text, prompt, identity, options)
            .await
    }

    /// Generate an image and return the saved file's path
    pub async fn generate_image(
        &self,
        prompt: &str,
        identity: Option<&str>,
        options: &GenerationOptions,
    ) -> String {
        self.generate(CapabilityKind::Image, prompt, identity, options)
            .await
    }

    /// Generate a video and return the saved file's path.
    ///
    /// Without an explicit identity the real video vendor is preferred over
    /// the placeholder regardless of the active selection.
    pub async fn generate_video(
        &self,
        prompt: &str,
        identity: Option<&str>,
        options: &GenerationOptions,
    ) -> String {
        self.generate(CapabilityKind::Video, prompt, identity, options)
            .await
    }

    /// Generate for any kind, rendering failures as text
    pub async fn generate(
        &self,
        kind: CapabilityKind,
        prompt: &str,
        identity: Option<&str>,
        options: &GenerationOptions,
    ) -> String {
        match self.try_generate(kind, prompt, identity, options).await {
            Ok(payload) => payload,
            Err(e) => render_failure(&e),
        }
    }

    /// Generate for any kind, keeping routing and backend failures structured
    pub async fn try_generate(
        &self,
        kind: CapabilityKind,
        prompt: &str,
        identity: Option<&str>,
        options: &GenerationOptions,
    ) -> std::result::Result<String, GenerationError> {
        let span = info_span!("generate", session = %self.session_id, kind = %kind);
        conversation::generate_stateless(
            &self.registry,
            &self.router,
            kind,
            prompt,
            identity,
            options,
        )
        .instrument(span)
        .await
    }

    /// Switch the backend serving `kind`. Returns false and changes nothing
    /// when `identity` is not registered for that kind.
    pub fn set_active_selection(&mut self, kind: CapabilityKind, identity: &str) -> bool {
        self.router
            .set_active_selection(&self.registry, kind, identity)
    }

    /// Switch the backend serving `kind`, reporting why it was refused
    pub fn try_set_active_selection(
        &mut self,
        kind: CapabilityKind,
        identity: &str,
    ) -> std::result::Result<(), RoutingError> {
        self.router
            .try_set_active_selection(&self.registry, kind, identity)
    }

    /// Identity that serves `kind` when none is given.
    ///
    /// For video this is the first registered entry of the precedence list,
    /// since video ignores the stored selection.
    pub fn active_selection(&self, kind: CapabilityKind) -> Option<&str> {
        match kind {
            CapabilityKind::Video => self
                .router
                .resolve(&self.registry, kind, None)
                .ok()
                .map(|entry| entry.identity()),
            _ => self.router.active_selection(kind),
        }
    }

    /// Registered identities for `kind`, in registration order
    pub fn list_identities(&self, kind: CapabilityKind) -> Vec<String> {
        self.registry.list_identities(kind)
    }

    pub fn history(&self) -> &ConversationHistory {
        self.session.history()
    }

    /// Clear the conversation and every continuation session
    pub fn reset(&mut self) {
        self.session.reset();
    }

    pub fn status(&self) -> Status {
        let mut active_selections = BTreeMap::new();
        let mut identities = BTreeMap::new();
        for kind in CapabilityKind::ALL {
            if let Some(selected) = self.active_selection(kind) {
                active_selections.insert(kind, selected.to_string());
            }
            identities.insert(kind, self.list_identities(kind));
        }

        Status {
            session_id: self.session_id,
            active_selections,
            identities,
            conversation_length: self.session.len(),
        }
    }
}
