//! Capability contracts every backend adapter implements.
//!
//! A backend serves exactly one [`CapabilityKind`](crate::types::CapabilityKind)
//! and implements the matching trait. Adapters own every vendor detail: request
//! formatting, authentication, response parsing and artifact persistence. The
//! orchestration layer only ever sees text back, or a [`BackendFailure`].

use super::error::BackendFailure;
use crate::types::{GenerationOptions, Turn};
use async_trait::async_trait;

/// How a text backend consumes conversation context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatFamily {
    /// Receives the full role-tagged history on every call
    Stateless,
    /// Keeps a live session and receives only the newest user message
    Continuation,
}

/// Text generation and chat
#[async_trait]
pub trait TextCapability: Send + Sync + std::fmt::Debug {
    /// One-shot generation with no conversation context
    async fn generate_text(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, BackendFailure>;

    /// Produce the next assistant message for a full history whose last
    /// turn is the pending user message
    async fn chat(
        &self,
        history: &[Turn],
        options: &GenerationOptions,
    ) -> Result<String, BackendFailure>;

    /// Which chat family this backend belongs to
    fn family(&self) -> ChatFamily {
        ChatFamily::Stateless
    }

    /// Open a live session primed with `seed`.
    ///
    /// Only continuation-family backends implement this.
    fn start_session(
        &self,
        seed: &[Turn],
    ) -> Result<Box<dyn ContinuationHandle>, BackendFailure> {
        let _ = seed;
        Err(BackendFailure::unsupported(
            self.name(),
            "continuation sessions",
        ))
    }

    /// Identity the backend reports in failures
    fn name(&self) -> &str;
}

/// Live vendor-side (or adapter-side) chat session
#[async_trait]
pub trait ContinuationHandle: Send + Sync + std::fmt::Debug {
    /// Send the next user message and return the assistant reply
    async fn send(
        &mut self,
        message: &str,
        options: &GenerationOptions,
    ) -> Result<String, BackendFailure>;
}

/// Image generation. Returns the path of the saved artifact.
#[async_trait]
pub trait ImageCapability: Send + Sync + std::fmt::Debug {
    async fn generate_image(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, BackendFailure>;

    fn name(&self) -> &str;
}

/// Video generation. Returns the path of the saved artifact.
#[async_trait]
pub trait VideoCapability: Send + Sync + std::fmt::Debug {
    async fn generate_video(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, BackendFailure>;

    fn name(&self) -> &str;
}
