//! Capability kinds partitioning the registry.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Generation domain a backend serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityKind {
    /// Text generation and chat
    Text,
    /// Image generation
    Image,
    /// Video generation
    Video,
}

impl CapabilityKind {
    /// Every kind, in display order
    pub const ALL: [CapabilityKind; 3] = [
        CapabilityKind::Text,
        CapabilityKind::Image,
        CapabilityKind::Video,
    ];

    /// Get string representation of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityKind::Text => "text",
            CapabilityKind::Image => "image",
            CapabilityKind::Video => "video",
        }
    }
}

impl std::fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CapabilityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(CapabilityKind::Text),
            "image" => Ok(CapabilityKind::Image),
            "video" => Ok(CapabilityKind::Video),
            other => Err(format!("unknown capability kind '{}'", other)),
        }
    }
}
