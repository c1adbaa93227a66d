//! Crate-level error handling
//!
//! Most of the orchestration surface is deliberately infallible: chat and the
//! string-returning generation calls render failures as text. Errors only
//! escape through construction (configuration, registry) and the structured
//! `try_*` variants. [`SwitchboardError`] unifies those for callers that want
//! a single error type.
//!
//! # Error Categories
//!
//! - **Input Validation** - caller-provided data is unusable (empty prompt on
//!   the web surface)
//! - **Configuration** - credentials, config files, output directories
//! - **Registry** - a backend could not be registered
//! - **Routing** - no backend could be selected for a request
//! - **Backend** - a vendor call failed
//! - **Io** - local filesystem failures outside of adapters

use crate::backend::{BackendFailure, GenerationError, RegistryError, RoutingError};
use crate::config::ConfigError;
use thiserror::Error;

/// Main error type for the Switchboard library
#[derive(Error, Debug, Clone)]
pub enum SwitchboardError {
    /// Input validation errors (user-provided data is invalid)
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Configuration errors (setup, credentials, etc.)
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    /// Registry bookkeeping errors
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Backend selection errors
    #[error("Routing error: {0}")]
    Routing(#[from] RoutingError),

    /// Vendor call failures
    #[error("Backend error: {0}")]
    Backend(#[from] BackendFailure),

    /// Local filesystem errors
    #[error("IO error: {message}")]
    Io { message: String },
}

impl SwitchboardError {
    /// Create a simple InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a simple ConfigurationError
    pub fn configuration_error(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    /// Create a simple Io error
    pub fn io_error(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Check if the error was caused by the caller's request
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            SwitchboardError::InvalidInput { .. }
                | SwitchboardError::Routing(RoutingError::UnknownBackend { .. })
        )
    }
}

/// Map configuration errors to SwitchboardError
impl From<ConfigError> for SwitchboardError {
    fn from(error: ConfigError) -> Self {
        match error {
            ConfigError::Io(e) => SwitchboardError::io_error(e.to_string()),
            other => SwitchboardError::configuration_error(other.to_string()),
        }
    }
}

impl From<std::io::Error> for SwitchboardError {
    fn from(error: std::io::Error) -> Self {
        SwitchboardError::io_error(error.to_string())
    }
}

impl From<GenerationError> for SwitchboardError {
    fn from(error: GenerationError) -> Self {
        match error {
            GenerationError::Routing(e) => SwitchboardError::Routing(e),
            GenerationError::Backend(e) => SwitchboardError::Backend(e),
        }
    }
}

/// Result type alias for Switchboard operations
pub type Result<T> = std::result::Result<T, SwitchboardError>;
