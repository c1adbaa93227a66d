//! DuckDuckGo AI chat adapter.
//!
//! The vendor put its chat endpoint behind anti-bot protection, so there is
//! no usable protocol left. The adapter stays registered without a credential
//! and answers every call with an unavailability failure, which keeps it a
//! valid default selection that explains itself.

use crate::backend::error::BackendFailure;
use crate::backend::traits::TextCapability;
use crate::types::{GenerationOptions, Turn};
use async_trait::async_trait;

const BACKEND: &str = "duckduckgo";

/// Message returned for every request
pub const UNAVAILABLE_MESSAGE: &str =
    "DuckDuckGo AI is currently unavailable due to API changes (Anti-bot protection).";

/// Credential-free text backend that is always unavailable
#[derive(Debug, Default)]
pub struct DuckDuckGoProvider;

impl DuckDuckGoProvider {
    pub fn new() -> Self {
        Self
    }

    fn unavailable(&self) -> BackendFailure {
        tracing::debug!("DuckDuckGo request refused: vendor unavailable");
        BackendFailure::unavailable(BACKEND, UNAVAILABLE_MESSAGE)
    }
}

#[async_trait]
impl TextCapability for DuckDuckGoProvider {
    async fn generate_text(
        &self,
        _prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String, BackendFailure> {
        Err(self.unavailable())
    }

    async fn chat(
        &self,
        _history: &[Turn],
        _options: &GenerationOptions,
    ) -> Result<String, BackendFailure> {
        Err(self.unavailable())
    }

    fn name(&self) -> &str {
        BACKEND
    }
}
