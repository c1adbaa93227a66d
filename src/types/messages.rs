//! Turn types for the orchestrated conversation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a turn in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Turn written by the caller
    User,
    /// Turn produced by a backend (or the failure text shown in its place)
    Assistant,
}

impl Role {
    /// Wire name shared by OpenAI-compatible vendors
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single immutable exchange entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Who produced the turn
    pub role: Role,
    /// Text content of the turn
    pub content: String,
    /// When the turn was appended
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a user turn
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant turn
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a turn with the given role
    pub fn new<S: Into<String>>(role: Role, content: S) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

// Timestamps are display-only; two turns are the same turn if role and text match.
impl PartialEq for Turn {
    fn eq(&self, other: &Self) -> bool {
        self.role == other.role && self.content == other.content
    }
}

impl Eq for Turn {}

/// Ordered, append-only turn log with an explicit reset.
///
/// Every reset advances the `epoch`, which lets holders of derived state
/// (continuation handles) detect that the log they were built from is gone.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
    epoch: u64,
}

impl ConversationHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Append a user turn with the given text
    pub fn push_user(&mut self, content: &str) {
        self.push(Turn::user(content));
    }

    /// Append an assistant turn with the given text
    pub fn push_assistant(&mut self, content: &str) {
        self.push(Turn::assistant(content));
    }

    /// All turns in insertion order
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of turns
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the history holds no turns
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Most recent turn
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Reset generation counter
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Drop every turn and start a new epoch
    pub fn clear(&mut self) {
        self.turns.clear();
        self.epoch += 1;
    }
}
