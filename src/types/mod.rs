//! Core type definitions shared by the orchestration layer.
//!
//! This module contains the data model every other layer speaks: capability
//! kinds, conversation turns, and generation options.

pub mod kind;
pub mod messages;
pub mod options;

// Re-export commonly used types
pub use kind::*;
pub use messages::*;
pub use options::*;
