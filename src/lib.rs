//! One conversation, many generation backends.
//!
//! Switchboard puts a single conversational front end over heterogeneous
//! text, image and video generation services. A user talks to one
//! [`Orchestrator`]; it picks a backend per request, keeps one conversation
//! history across backend switches, and turns every vendor failure into a
//! readable message instead of an error.
//!
//! # Quick Start
//!
//! ```no_run
//! use switchboard::{CapabilityKind, GenerationOptions, Orchestrator, SwitchboardConfig};
//!
//! #[tokio::main]
//! async fn main() -> switchboard::Result<()> {
//!     // Credentials and defaults come from the environment
//!     let config = SwitchboardConfig::from_env()?;
//!     let mut orchestrator = Orchestrator::new(&config)?;
//!
//!     println!("{}", orchestrator.chat("What is the capital of France?", None).await);
//!
//!     // Continue the same conversation on another backend
//!     if orchestrator.set_active_selection(CapabilityKind::Text, "gemini") {
//!         println!("{}", orchestrator.chat("And of Italy?", None).await);
//!     }
//!
//!     let path = orchestrator
//!         .generate_image("a lighthouse at dusk", None, &GenerationOptions::default())
//!         .await;
//!     println!("image: {}", path);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture Overview
//!
//! - **[`backend::traits`]** - capability contracts (text, image, video)
//! - **[`backend::providers`]** - one adapter per vendor
//! - **[`backend::Registry`]** - adapters that constructed, per kind
//! - **[`backend::Router`]** - active selection and request routing
//! - **[`conversation::ConversationSession`]** - turn log and continuation handles
//! - **[`Orchestrator`]** - the facade hosts talk to
//!
//! # Feature Flags
//!
//! - `http` - axum web surface ([`web`]) and the `serve` subcommand
//!
//! # Module Organization
//!
//! - [`backend`] - contracts, vendor adapters, registry, router
//! - [`config`] - configuration from TOML files and the environment
//! - [`conversation`] - the conversation state machine
//! - [`orchestrator`] - the public facade
//! - [`types`] - capability kinds, turns, generation options
//! - [`error`] - crate-level error type
//! - [`telemetry`] - logging setup
//! - [`utils`] - credential redaction helpers

pub mod backend;
pub mod config;
pub mod conversation;
pub mod error;
pub mod orchestrator;
pub mod telemetry;
pub mod types;
pub mod utils;

#[cfg(feature = "http")]
pub mod web;

pub use config::SwitchboardConfig;
pub use conversation::{ChatOutcome, ChatReply};
pub use error::{Result, SwitchboardError};
pub use orchestrator::{Orchestrator, Status};
pub use types::*;
