//! Google Gemini adapter.
//!
//! Gemini is the continuation-family backend: the orchestrator opens a
//! [`GeminiSession`] seeded with prior turns and then only hands it the newest
//! user message. The session keeps its own `contents` transcript and replays
//! it to `models/{model}:generateContent` on each send.
//!
//! Gemini requires `user` and `model` roles to alternate. Consecutive turns
//! with the same role are merged into one content with several parts, so a
//! history containing an unanswered user turn still goes out intact.

use super::{http_client, normalize_base_url, send_json};
use crate::backend::error::BackendFailure;
use crate::backend::traits::{ChatFamily, ContinuationHandle, TextCapability};
use crate::types::{GenerationOptions, Role, Turn};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Public Gemini endpoint
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const BACKEND: &str = "gemini";
const DEFAULT_MODEL: &str = "gemini-pro";

/// One entry of Gemini's `contents` array
#[derive(Debug, Clone, PartialEq, Eq)]
struct Content {
    role: &'static str,
    parts: Vec<String>,
}

impl Content {
    fn to_json(&self) -> Value {
        json!({
            "role": self.role,
            "parts": self.parts.iter().map(|text| json!({"text": text})).collect::<Vec<_>>(),
        })
    }
}

fn wire_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "model",
    }
}

/// Append a message, merging into the previous content when roles repeat
fn append(contents: &mut Vec<Content>, role: &'static str, text: &str) {
    match contents.last_mut() {
        Some(last) if last.role == role => last.parts.push(text.to_string()),
        _ => contents.push(Content {
            role,
            parts: vec![text.to_string()],
        }),
    }
}

fn to_contents(turns: &[Turn]) -> Vec<Content> {
    let mut contents = Vec::with_capacity(turns.len());
    for turn in turns {
        append(&mut contents, wire_role(turn.role), &turn.content);
    }
    contents
}

/// Shared HTTP plumbing for the provider and its sessions
#[derive(Debug)]
struct GeminiClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiClient {
    async fn generate(
        &self,
        contents: &[Content],
        options: &GenerationOptions,
    ) -> Result<String, BackendFailure> {
        let model = options.model_or(DEFAULT_MODEL);
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        tracing::debug!(
            model,
            contents = contents.len(),
            temperature = options.temperature,
            max_output_tokens = options.max_output_units,
            "Sending Gemini generateContent request"
        );

        let request_body = json!({
            "contents": contents.iter().map(Content::to_json).collect::<Vec<_>>(),
            "generationConfig": {
                "temperature": options.temperature,
                "maxOutputTokens": options.max_output_units,
            }
        });

        let start_time = Instant::now();
        let response = send_json(
            BACKEND,
            self.client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&request_body),
        )
        .await?;

        let text = extract_text(&response)?;
        tracing::info!(
            model,
            duration_ms = start_time.elapsed().as_millis() as u64,
            chars = text.len(),
            "Gemini response received"
        );
        Ok(text)
    }
}

/// Join the text parts of the first candidate
fn extract_text(response: &Value) -> Result<String, BackendFailure> {
    let candidate = response
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first());

    let Some(candidate) = candidate else {
        if let Some(reason) = response
            .pointer("/promptFeedback/blockReason")
            .and_then(|r| r.as_str())
        {
            return Err(BackendFailure::rejected(
                BACKEND,
                format!("prompt blocked ({})", reason),
            ));
        }
        return Err(BackendFailure::malformed(BACKEND, "missing candidates"));
    };

    let text: String = candidate
        .pointer("/content/parts")
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        let reason = candidate
            .get("finishReason")
            .and_then(|r| r.as_str())
            .unwrap_or("UNKNOWN");
        return Err(BackendFailure::rejected(
            BACKEND,
            format!("no text returned (finish reason {})", reason),
        ));
    }
    Ok(text)
}

/// Continuation-family text backend for Google Gemini
#[derive(Debug)]
pub struct GeminiProvider {
    inner: Arc<GeminiClient>,
}

impl GeminiProvider {
    /// Create a provider against the public endpoint or an override
    pub fn new(api_key: String, base_url: Option<String>, timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            inner: Arc::new(GeminiClient {
                base_url: normalize_base_url(base_url, GEMINI_BASE_URL),
                api_key,
                client: http_client(timeout)?,
            }),
        })
    }
}

#[async_trait]
impl TextCapability for GeminiProvider {
    async fn generate_text(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, BackendFailure> {
        let contents = vec![Content {
            role: "user",
            parts: vec![prompt.to_string()],
        }];
        self.inner.generate(&contents, options).await
    }

    async fn chat(
        &self,
        history: &[Turn],
        options: &GenerationOptions,
    ) -> Result<String, BackendFailure> {
        self.inner.generate(&to_contents(history), options).await
    }

    fn family(&self) -> ChatFamily {
        ChatFamily::Continuation
    }

    fn start_session(
        &self,
        seed: &[Turn],
    ) -> Result<Box<dyn ContinuationHandle>, BackendFailure> {
        tracing::debug!(seed_turns = seed.len(), "Starting Gemini chat session");
        Ok(Box::new(GeminiSession {
            client: Arc::clone(&self.inner),
            contents: to_contents(seed),
        }))
    }

    fn name(&self) -> &str {
        BACKEND
    }
}

/// Live Gemini chat session
#[derive(Debug)]
pub struct GeminiSession {
    client: Arc<GeminiClient>,
    contents: Vec<Content>,
}

#[async_trait]
impl ContinuationHandle for GeminiSession {
    async fn send(
        &mut self,
        message: &str,
        options: &GenerationOptions,
    ) -> Result<String, BackendFailure> {
        let mut next = self.contents.clone();
        append(&mut next, "user", message);

        let reply = self.client.generate(&next, options).await?;

        append(&mut next, "model", &reply);
        self.contents = next;
        Ok(reply)
    }
}
