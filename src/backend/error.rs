//! Error types of the backend layer.
//!
//! Three families live here:
//!
//! - [`BackendFailure`] - anything that goes wrong inside an adapter. Adapters
//!   never panic or propagate transport errors; they hand back one of these.
//! - [`RoutingError`] - the router could not pick a backend for a request.
//! - [`RegistryError`] - a backend entry could not be registered.
//!
//! [`GenerationError`] joins the first two for callers of the stateless
//! generation path that want a structured result instead of display text.

use crate::types::CapabilityKind;
use thiserror::Error;

/// Adapter-internal fault rendered as a human-readable message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendFailure {
    /// Transport-level failure (connect, TLS, timeout)
    #[error("{backend}: network error: {message}")]
    Network { backend: String, message: String },

    /// Vendor rejected the credential
    #[error("{backend}: authentication failed: {message}")]
    Authentication { backend: String, message: String },

    /// Vendor throttled the request
    #[error("{backend}: rate limit exceeded")]
    RateLimited { backend: String },

    /// Any other non-success HTTP status
    #[error("{backend}: HTTP {status}: {body}")]
    Http {
        backend: String,
        status: u16,
        body: String,
    },

    /// Vendor payload did not have the expected shape
    #[error("{backend}: malformed response: {message}")]
    MalformedResponse { backend: String, message: String },

    /// Vendor accepted the request but refused to produce output
    #[error("{backend}: request rejected: {message}")]
    Rejected { backend: String, message: String },

    /// Vendor cannot serve requests at all right now
    #[error("{message}")]
    Unavailable { backend: String, message: String },

    /// Saving a generated artifact failed
    #[error("{backend}: failed to save artifact: {message}")]
    Io { backend: String, message: String },

    /// Operation is not offered by this adapter
    #[error("{backend}: {operation} is not supported")]
    Unsupported { backend: String, operation: String },
}

impl BackendFailure {
    /// Create a Network failure
    pub fn network(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Create a MalformedResponse failure
    pub fn malformed(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Create a Rejected failure
    pub fn rejected(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Create an Unavailable failure
    pub fn unavailable(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Create an Io failure
    pub fn io(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Io {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Create an Unsupported failure
    pub fn unsupported(backend: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Unsupported {
            backend: backend.into(),
            operation: operation.into(),
        }
    }

    /// Map a transport error from the HTTP client
    pub fn from_reqwest(backend: impl Into<String>, error: reqwest::Error) -> Self {
        let message = if error.is_timeout() {
            format!("request timed out: {}", error)
        } else if error.is_decode() {
            return Self::malformed(backend, error.to_string());
        } else {
            error.to_string()
        };
        Self::network(backend, message)
    }

    /// Map a non-success HTTP status and its body
    pub fn from_status(backend: impl Into<String>, status: u16, body: String) -> Self {
        let backend = backend.into();
        match status {
            401 | 403 => Self::Authentication {
                backend,
                message: body,
            },
            429 => Self::RateLimited { backend },
            _ => Self::Http {
                backend,
                status,
                body,
            },
        }
    }

    /// Name of the backend that produced the failure
    pub fn backend(&self) -> &str {
        match self {
            Self::Network { backend, .. }
            | Self::Authentication { backend, .. }
            | Self::RateLimited { backend }
            | Self::Http { backend, .. }
            | Self::MalformedResponse { backend, .. }
            | Self::Rejected { backend, .. }
            | Self::Unavailable { backend, .. }
            | Self::Io { backend, .. }
            | Self::Unsupported { backend, .. } => backend,
        }
    }
}

/// The router could not select a backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// An explicitly requested identity is not registered
    #[error(
        "Provider '{requested}' not available for {kind}. Available providers: {}",
        join_or_none(.available)
    )]
    UnknownBackend {
        kind: CapabilityKind,
        requested: String,
        available: Vec<String>,
    },

    /// The active selection for the kind did not construct at startup
    #[error(
        "Active {kind} provider '{selected}' is not available. Available providers: {}",
        join_or_none(.available)
    )]
    ActiveSelectionUnavailable {
        kind: CapabilityKind,
        selected: String,
        available: Vec<String>,
    },

    /// Nothing on the kind's precedence list is registered
    #[error("No {kind} provider is available")]
    NoBackendAvailable { kind: CapabilityKind },
}

fn join_or_none(identities: &[String]) -> String {
    if identities.is_empty() {
        "none".to_string()
    } else {
        identities.join(", ")
    }
}

/// Registry bookkeeping failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The identity is already registered for the kind
    #[error("{kind} backend '{identity}' is already registered")]
    DuplicateIdentity {
        kind: CapabilityKind,
        identity: String,
    },

    /// The adapter could not be constructed
    #[error("failed to construct {kind} backend '{identity}': {message}")]
    Construction {
        kind: CapabilityKind,
        identity: String,
        message: String,
    },
}

/// Structured result of a stateless generation call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    Backend(#[from] BackendFailure),
}
