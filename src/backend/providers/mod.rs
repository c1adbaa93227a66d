//! Vendor adapters.
//!
//! Each adapter owns its vendor's wire protocol. [`Vendor`] is the closed set
//! of vendors the registry knows how to build, listed in registration order.

pub mod dalle;
pub mod duckduckgo;
pub mod gemini;
pub mod openai;
pub mod placeholder;
pub mod replicate;

pub use dalle::DalleProvider;
pub use duckduckgo::DuckDuckGoProvider;
pub use gemini::{GeminiProvider, GeminiSession};
pub use openai::OpenAiCompatibleProvider;
pub use placeholder::PlaceholderVideoProvider;
pub use replicate::ReplicateProvider;

use super::error::{BackendFailure, RegistryError};
use super::registry::Adapter;
use crate::config::SwitchboardConfig;
use crate::types::CapabilityKind;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Every vendor the registry can construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vendor {
    OpenAi,
    Gemini,
    DeepSeek,
    Grok,
    DuckDuckGo,
    Dalle,
    Replicate,
    Placeholder,
}

impl Vendor {
    /// Registration order. `Placeholder` is the video fallback and is only
    /// registered when no other video vendor constructed.
    pub const ALL: [Vendor; 8] = [
        Vendor::OpenAi,
        Vendor::Gemini,
        Vendor::DeepSeek,
        Vendor::Grok,
        Vendor::DuckDuckGo,
        Vendor::Dalle,
        Vendor::Replicate,
        Vendor::Placeholder,
    ];

    /// Backend identity the vendor registers under
    pub fn identity(&self) -> &'static str {
        match self {
            Vendor::OpenAi => "openai",
            Vendor::Gemini => "gemini",
            Vendor::DeepSeek => "deepseek",
            Vendor::Grok => "grok",
            Vendor::DuckDuckGo => "duckduckgo",
            Vendor::Dalle => "dalle",
            Vendor::Replicate => "replicate",
            Vendor::Placeholder => "placeholder",
        }
    }

    /// Capability kind the vendor serves
    pub fn kind(&self) -> CapabilityKind {
        match self {
            Vendor::OpenAi
            | Vendor::Gemini
            | Vendor::DeepSeek
            | Vendor::Grok
            | Vendor::DuckDuckGo => CapabilityKind::Text,
            Vendor::Dalle => CapabilityKind::Image,
            Vendor::Replicate | Vendor::Placeholder => CapabilityKind::Video,
        }
    }

    /// Whether the vendor is the always-available video fallback
    pub fn is_fallback(&self) -> bool {
        matches!(self, Vendor::Placeholder)
    }

    /// Build the vendor's adapter.
    ///
    /// Returns `Ok(None)` when the credential precondition is not met.
    pub fn build(&self, config: &SwitchboardConfig) -> Result<Option<Adapter>, RegistryError> {
        let credentials = &config.credentials;
        let endpoints = &config.endpoints;
        let timeout = config.http_client.request_timeout;

        let adapter = match self {
            Vendor::OpenAi => credentials
                .openai_api_key
                .as_ref()
                .map(|key| {
                    OpenAiCompatibleProvider::openai(
                        key.clone(),
                        endpoints.openai_base_url.clone(),
                        timeout,
                    )
                })
                .transpose()
                .map(|p| p.map(|p| Adapter::Text(Arc::new(p)))),
            Vendor::Gemini => credentials
                .gemini_api_key
                .as_ref()
                .map(|key| {
                    GeminiProvider::new(key.clone(), endpoints.gemini_base_url.clone(), timeout)
                })
                .transpose()
                .map(|p| p.map(|p| Adapter::Text(Arc::new(p)))),
            Vendor::DeepSeek => credentials
                .deepseek_api_key
                .as_ref()
                .map(|key| {
                    OpenAiCompatibleProvider::deepseek(
                        key.clone(),
                        endpoints.deepseek_base_url.clone(),
                        timeout,
                    )
                })
                .transpose()
                .map(|p| p.map(|p| Adapter::Text(Arc::new(p)))),
            Vendor::Grok => credentials
                .xai_api_key
                .as_ref()
                .map(|key| {
                    OpenAiCompatibleProvider::grok(
                        key.clone(),
                        endpoints.grok_base_url.clone(),
                        timeout,
                    )
                })
                .transpose()
                .map(|p| p.map(|p| Adapter::Text(Arc::new(p)))),
            Vendor::DuckDuckGo => Ok(Some(Adapter::Text(Arc::new(DuckDuckGoProvider::new())))),
            Vendor::Dalle => credentials
                .openai_api_key
                .as_ref()
                .map(|key| {
                    DalleProvider::new(
                        key.clone(),
                        endpoints.openai_base_url.clone(),
                        config.output.image_dir.clone(),
                        timeout,
                    )
                })
                .transpose()
                .map(|p| p.map(|p| Adapter::Image(Arc::new(p)))),
            Vendor::Replicate => credentials
                .replicate_api_token
                .as_ref()
                .map(|token| {
                    ReplicateProvider::new(
                        token.clone(),
                        endpoints.replicate_base_url.clone(),
                        config.output.video_dir.clone(),
                        timeout,
                        config.http_client.video_timeout,
                        config.http_client.poll_interval,
                    )
                })
                .transpose()
                .map(|p| p.map(|p| Adapter::Video(Arc::new(p)))),
            Vendor::Placeholder => Ok(Some(Adapter::Video(Arc::new(
                PlaceholderVideoProvider::new(config.output.video_dir.clone()),
            )))),
        };

        adapter.map_err(|e| RegistryError::Construction {
            kind: self.kind(),
            identity: self.identity().to_string(),
            message: e.to_string(),
        })
    }
}

impl std::fmt::Display for Vendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.identity())
    }
}

/// Build the HTTP client an adapter uses for every call
pub(crate) fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("switchboard/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Strip trailing slashes so paths can be appended with `format!`
pub(crate) fn normalize_base_url(base_url: Option<String>, default: &str) -> String {
    base_url
        .unwrap_or_else(|| default.to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Send a request and decode a JSON body, mapping every failure mode
pub(crate) async fn send_json(
    backend: &str,
    request: reqwest::RequestBuilder,
) -> Result<Value, BackendFailure> {
    let response = request
        .send()
        .await
        .map_err(|e| BackendFailure::from_reqwest(backend, e))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| BackendFailure::from_reqwest(backend, e))?;

    if !status.is_success() {
        tracing::warn!(
            backend,
            status = status.as_u16(),
            body = %crate::utils::logging::sanitize_for_logging(&body),
            "Vendor returned an error status"
        );
        return Err(BackendFailure::from_status(
            backend,
            status.as_u16(),
            error_message(&body),
        ));
    }

    serde_json::from_str(&body)
        .map_err(|e| BackendFailure::malformed(backend, format!("invalid JSON: {}", e)))
}

/// Pull the human-readable message out of a vendor error body.
///
/// OpenAI-style vendors and Gemini both use `{"error": {"message": ...}}`;
/// Replicate uses `{"detail": ...}`. Anything else is passed through.
fn error_message(body: &str) -> String {
    let message = serde_json::from_str::<Value>(body).ok().and_then(|json| {
        json.pointer("/error/message")
            .or_else(|| json.get("detail"))
            .or_else(|| json.get("error"))
            .and_then(|m| m.as_str())
            .map(str::to_string)
    });
    crate::utils::logging::sanitize_for_logging(&message.unwrap_or_else(|| body.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_table() {
        let text: Vec<_> = Vendor::ALL
            .iter()
            .filter(|v| v.kind() == CapabilityKind::Text)
            .map(|v| v.identity())
            .collect();
        assert_eq!(text, vec!["openai", "gemini", "deepseek", "grok", "duckduckgo"]);
        assert_eq!(Vendor::Dalle.kind(), CapabilityKind::Image);
        assert!(Vendor::Placeholder.is_fallback());
        assert!(!Vendor::Replicate.is_fallback());
    }

    #[test]
    fn test_credentialed_vendors_need_a_key() {
        let config = SwitchboardConfig::default();
        assert!(Vendor::OpenAi.build(&config).unwrap().is_none());
        assert!(Vendor::Replicate.build(&config).unwrap().is_none());
        assert!(Vendor::DuckDuckGo.build(&config).unwrap().is_some());
        assert!(Vendor::Placeholder.build(&config).unwrap().is_some());
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"error": {"message": "Invalid model", "type": "x"}}"#),
            "Invalid model"
        );
        assert_eq!(error_message(r#"{"detail": "Not found."}"#), "Not found.");
        assert_eq!(error_message("  plain text \n"), "plain text");
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url(Some("http://localhost:8080/v1/".into()), "unused"),
            "http://localhost:8080/v1"
        );
        assert_eq!(normalize_base_url(None, "https://api.x.ai/v1"), "https://api.x.ai/v1");
    }
}
