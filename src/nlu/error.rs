//! NLU error types

use thiserror::Error;

/// NLU client error with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct NluError {
    pub kind: NluErrorKind,
    pub message: String,
}

impl NluError {
    pub fn new(kind: NluErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(NluErrorKind::Network, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(NluErrorKind::RateLimit, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(NluErrorKind::ServerError, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(NluErrorKind::Auth, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(NluErrorKind::InvalidRequest, message)
    }

    pub fn cancelled() -> Self {
        Self::new(NluErrorKind::Cancelled, "query cancelled")
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(NluErrorKind::Unknown, message)
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NluErrorKind {
    /// Network issues, timeouts
    Network,
    /// Rate limited (429)
    RateLimit,
    /// Server error (5xx)
    ServerError,
    /// Authentication failed (401, 403)
    Auth,
    /// Bad request (400), or a query the service has no answer for
    InvalidRequest,
    /// The caller's cancellation signal fired
    Cancelled,
    Unknown,
}

impl NluErrorKind {
    /// Whether a caller could reasonably try again later
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::RateLimit | Self::ServerError)
    }
}

/// Errors from resolving a query across several NLU clients
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("NLU client '{client}' failed: {source}")]
    Service {
        client: String,
        #[source]
        source: NluError,
    },
    #[error("NLU query cancelled")]
    Cancelled,
}

impl ResolveError {
    pub(crate) fn from_client(client: &str, source: NluError) -> Self {
        if source.kind == NluErrorKind::Cancelled {
            ResolveError::Cancelled
        } else {
            ResolveError::Service {
                client: client.to_string(),
                source,
            }
        }
    }
}
