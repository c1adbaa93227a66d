//! OpenAI-compatible chat completions adapter.
//!
//! OpenAI, DeepSeek and xAI Grok all speak the same `/chat/completions`
//! protocol; they differ only in base URL, default model and credential.
//! All three are stateless: the full role-tagged history goes out on every
//! call.

use super::{http_client, normalize_base_url, send_json};
use crate::backend::error::BackendFailure;
use crate::backend::traits::TextCapability;
use crate::types::{GenerationOptions, Turn};
use crate::utils::logging::preview;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

/// Public OpenAI endpoint
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
/// Public DeepSeek endpoint
pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
/// Public xAI endpoint
pub const GROK_BASE_URL: &str = "https://api.x.ai/v1";

/// Stateless text backend for any OpenAI-compatible vendor
#[derive(Debug)]
pub struct OpenAiCompatibleProvider {
    name: String,
    base_url: String,
    api_key: String,
    default_model: String,
    client: reqwest::Client,
}

impl OpenAiCompatibleProvider {
    /// Create a provider for an arbitrary OpenAI-compatible endpoint
    pub fn new(
        name: impl Into<String>,
        api_key: String,
        base_url: String,
        default_model: impl Into<String>,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        Ok(Self {
            name: name.into(),
            base_url: normalize_base_url(Some(base_url), OPENAI_BASE_URL),
            api_key,
            default_model: default_model.into(),
            client: http_client(timeout)?,
        })
    }

    /// OpenAI ChatGPT (`gpt-4`)
    pub fn openai(
        api_key: String,
        base_url: Option<String>,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        Self::new(
            "openai",
            api_key,
            normalize_base_url(base_url, OPENAI_BASE_URL),
            "gpt-4",
            timeout,
        )
    }

    /// DeepSeek (`deepseek-chat`)
    pub fn deepseek(
        api_key: String,
        base_url: Option<String>,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        Self::new(
            "deepseek",
            api_key,
            normalize_base_url(base_url, DEEPSEEK_BASE_URL),
            "deepseek-chat",
            timeout,
        )
    }

    /// xAI Grok (`grok-beta`)
    pub fn grok(api_key: String, base_url: Option<String>, timeout: Duration) -> reqwest::Result<Self> {
        Self::new(
            "grok",
            api_key,
            normalize_base_url(base_url, GROK_BASE_URL),
            "grok-beta",
            timeout,
        )
    }

    /// Model used when the options do not name one
    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Convert turns to OpenAI chat message objects
    fn convert_turns(turns: &[Turn]) -> Vec<Value> {
        turns
            .iter()
            .map(|turn| {
                json!({
                    "role": turn.role.as_str(),
                    "content": turn.content,
                })
            })
            .collect()
    }

    async fn complete(
        &self,
        messages: Vec<Value>,
        options: &GenerationOptions,
    ) -> Result<String, BackendFailure> {
        let model = options.model_or(&self.default_model);
        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(
            backend = %self.name,
            model,
            messages = messages.len(),
            temperature = options.temperature,
            max_tokens = options.max_output_units,
            "Sending chat completion request"
        );

        let request_body = json!({
            "model": model,
            "messages": messages,
            "max_tokens": options.max_output_units,
            "temperature": options.temperature,
        });

        let start_time = Instant::now();
        let response = send_json(
            &self.name,
            self.client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&request_body),
        )
        .await?;

        let content = Self::extract_content(&self.name, &response)?;
        tracing::info!(
            backend = %self.name,
            model,
            duration_ms = start_time.elapsed().as_millis() as u64,
            chars = content.len(),
            "Chat completion finished"
        );
        tracing::trace!(backend = %self.name, reply = %preview(&content, 200));
        Ok(content)
    }

    /// Extract `choices[0].message.content` from a completion response
    fn extract_content(backend: &str, response: &Value) -> Result<String, BackendFailure> {
        let choice = response
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .ok_or_else(|| BackendFailure::malformed(backend, "missing choices array"))?;

        if let Some(refusal) = choice.pointer("/message/refusal").and_then(|r| r.as_str()) {
            return Err(BackendFailure::rejected(backend, refusal));
        }

        choice
            .pointer("/message/content")
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| BackendFailure::malformed(backend, "missing message content"))
    }
}

#[async_trait]
impl TextCapability for OpenAiCompatibleProvider {
    async fn generate_text(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, BackendFailure> {
        self.complete(vec![json!({"role": "user", "content": prompt})], options)
            .await
    }

    async fn chat(
        &self,
        history: &[Turn],
        options: &GenerationOptions,
    ) -> Result<String, BackendFailure> {
        self.complete(Self::convert_turns(history), options).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
