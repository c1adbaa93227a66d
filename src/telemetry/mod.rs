//! Observability for the orchestration layer.
//!
//! Everything in the crate reports through `tracing`; this module owns the
//! subscriber setup used by the binary. Library users install their own.

pub mod logging;

pub use logging::{init_logging, LoggingConfig, LoggingGuard};
