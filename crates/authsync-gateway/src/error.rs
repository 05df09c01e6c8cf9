//! Error types for remote gateway operations.
//!
//! A "not found" answer from the remote service is not an error: it is
//! reported through [`crate::Lookup::NotFound`].

/// Errors that can occur while talking to the remote auth method service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The request never produced a response (connection refused, timeout,
    /// TLS failure...). Callers may retry under their own policy.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service answered with a structured error.
    #[error("Remote service rejected the request (HTTP {status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Service-reported error kind, if any.
        kind: Option<String>,
        /// Service-reported message, verbatim.
        message: String,
    },

    /// The response body could not be interpreted.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The gateway itself is misconfigured.
    #[error("Invalid gateway configuration: {0}")]
    Config(String),
}

impl GatewayError {
    /// Creates a `Rejected` error.
    #[must_use]
    pub fn rejected(status: u16, kind: Option<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            kind,
            message: message.into(),
        }
    }

    /// Creates a `Transport` error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a `Malformed` error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Returns `true` for transport failures.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns `true` if the service rejected the update because the
    /// supplied version is stale.
    #[must_use]
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, Self::Rejected { status: 409, .. })
    }
}
