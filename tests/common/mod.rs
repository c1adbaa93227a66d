//! In-process fake backends shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use switchboard::backend::{BackendFailure, ChatFamily, ContinuationHandle, TextCapability};
use switchboard::{GenerationOptions, Turn};

/// Stateless text backend that answers `"<name> #<n>"` and records every
/// history it was handed
#[derive(Debug)]
pub struct EchoBackend {
    name: String,
    pub received: Mutex<Vec<Vec<Turn>>>,
}

impl EchoBackend {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            received: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.received.lock().unwrap().len()
    }
}

#[async_trait]
impl TextCapability for EchoBackend {
    async fn generate_text(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String, BackendFailure> {
        Ok(format!("{}: {}", self.name, prompt))
    }

    async fn chat(
        &self,
        history: &[Turn],
        _options: &GenerationOptions,
    ) -> Result<String, BackendFailure> {
        let mut received = self.received.lock().unwrap();
        received.push(history.to_vec());
        Ok(format!("{} #{}", self.name, received.len()))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Continuation backend whose sessions remember what they were seeded with
#[derive(Debug, Default)]
pub struct SessionBackend {
    /// Seed length of every session started, in order
    pub seeds: Arc<Mutex<Vec<usize>>>,
}

impl SessionBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seeds(&self) -> Vec<usize> {
        self.seeds.lock().unwrap().clone()
    }
}

#[derive(Debug)]
struct Session {
    seen: usize,
}

#[async_trait]
impl ContinuationHandle for Session {
    async fn send(
        &mut self,
        message: &str,
        _options: &GenerationOptions,
    ) -> Result<String, BackendFailure> {
        self.seen += 2;
        Ok(format!("session saw {} turns, last: {}", self.seen, message))
    }
}

#[async_trait]
impl TextCapability for SessionBackend {
    async fn generate_text(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String, BackendFailure> {
        Ok(prompt.to_uppercase())
    }

    async fn chat(
        &self,
        _history: &[Turn],
        _options: &GenerationOptions,
    ) -> Result<String, BackendFailure> {
        Err(BackendFailure::unsupported("session", "stateless chat"))
    }

    fn family(&self) -> ChatFamily {
        ChatFamily::Continuation
    }

    fn start_session(
        &self,
        seed: &[Turn],
    ) -> Result<Box<dyn ContinuationHandle>, BackendFailure> {
        self.seeds.lock().unwrap().push(seed.len());
        Ok(Box::new(Session { seen: seed.len() }))
    }

    fn name(&self) -> &str {
        "session"
    }
}

/// Text backend that always fails with a network error
#[derive(Debug)]
pub struct FailingBackend;

#[async_trait]
impl TextCapability for FailingBackend {
    async fn generate_text(
        &self,
        _prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String, BackendFailure> {
        Err(BackendFailure::network("flaky", "connection refused"))
    }

    async fn chat(
        &self,
        _history: &[Turn],
        _options: &GenerationOptions,
    ) -> Result<String, BackendFailure> {
        Err(BackendFailure::network("flaky", "connection refused"))
    }

    fn name(&self) -> &str {
        "flaky"
    }
}
