//! Reconciliation errors.
//!
//! Remote "not found" answers never show up here when they are part of a
//! normal transition (read of a vanished method, delete of an absent one);
//! they only become [`ReconcileError::NotFound`] when the operation cannot
//! proceed without the method.

use std::fmt;

use authsync_core::CodecError;
use authsync_gateway::GatewayError;

/// Errors surfaced by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    /// A field the operation needs is not set.
    #[error("Missing required field: {0}")]
    MissingRequiredField(String),

    /// The configured type is not a supported auth method type.
    #[error("Invalid auth method type: {0:?}")]
    InvalidMethodType(String),

    /// A configuration value has the wrong shape.
    #[error("Invalid value for {key}: expected {expected}")]
    InvalidConfigValue { key: String, expected: &'static str },

    /// An update tried to change a field that is fixed after create.
    #[error("Field {field} cannot be changed after create (requested {requested:?})")]
    ImmutableFieldChanged {
        field: &'static str,
        requested: String,
    },

    /// The remote service answered with something that cannot be decoded.
    #[error("Malformed response from remote service: {0}")]
    MalformedResponse(String),

    /// The remote service could not be reached.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote service refused the request.
    #[error("{message}")]
    RemoteRejected {
        status: u16,
        kind: Option<String>,
        /// Service-reported message, verbatim.
        message: String,
    },

    /// A read failed for a reason other than absence.
    #[error("Failed to read auth method {id}: {source}")]
    RemoteReadFailed {
        id: String,
        #[source]
        source: Box<ReconcileError>,
    },

    /// The auth method does not exist (locally or remotely).
    #[error("Auth method not found: {0}")]
    NotFound(String),

    /// The caller cancelled the operation.
    #[error("Operation cancelled")]
    Cancelled,

    /// The remote service broke its contract with us.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// The gateway could not be set up.
    #[error("Gateway configuration error: {0}")]
    Configuration(String),
}

impl ReconcileError {
    /// Creates an `ImmutableFieldChanged` error.
    #[must_use]
    pub fn immutable(field: &'static str, requested: impl Into<String>) -> Self {
        Self::ImmutableFieldChanged {
            field,
            requested: requested.into(),
        }
    }

    /// Wraps a failed read.
    #[must_use]
    pub fn read_failed(id: impl Into<String>, source: ReconcileError) -> Self {
        Self::RemoteReadFailed {
            id: id.into(),
            source: Box::new(source),
        }
    }

    /// Creates an `InvariantViolation` error.
    #[must_use]
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }

    /// Returns `true` if the remote service rejected a stale version.
    #[must_use]
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, Self::RemoteRejected { status: 409, .. })
    }

    /// Returns `true` if the operation was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns the error category for logging and diagnostics.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingRequiredField(_)
            | Self::InvalidMethodType(_)
            | Self::InvalidConfigValue { .. }
            | Self::ImmutableFieldChanged { .. } => ErrorCategory::Validation,
            Self::MalformedResponse(_) | Self::InvariantViolation(_) => ErrorCategory::Contract,
            Self::Transport(_) | Self::Configuration(_) => ErrorCategory::Infrastructure,
            Self::RemoteRejected { .. } => ErrorCategory::Remote,
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::Cancelled => ErrorCategory::Cancelled,
            Self::RemoteReadFailed { source, .. } => source.category(),
        }
    }
}

impl From<CodecError> for ReconcileError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::InvalidMethodType(t) => Self::InvalidMethodType(t),
            CodecError::MissingRequiredField(f) => Self::MissingRequiredField(f),
            CodecError::InvalidConfigValue { key, expected } => {
                Self::InvalidConfigValue { key, expected }
            }
            CodecError::MalformedResponse(m) => Self::MalformedResponse(m),
        }
    }
}

impl From<GatewayError> for ReconcileError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Transport(m) => Self::Transport(m),
            GatewayError::Rejected {
                status,
                kind,
                message,
            } => Self::RemoteRejected {
                status,
                kind,
                message,
            },
            GatewayError::Malformed(m) => Self::MalformedResponse(m),
            GatewayError::Config(m) => Self::Configuration(m),
        }
    }
}

/// Error category for grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rejected locally before any network call.
    Validation,
    /// The remote service answered outside its contract.
    Contract,
    /// Connection or setup problems.
    Infrastructure,
    /// Structured rejection by the remote service.
    Remote,
    /// Missing resource.
    NotFound,
    /// Cancelled by the caller.
    Cancelled,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Contract => write!(f, "contract"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Remote => write!(f, "remote"),
            Self::NotFound => write!(f, "not_found"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}
