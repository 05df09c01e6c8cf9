//! Error types for the attribute codec.

/// Errors raised while translating between configuration, typed attributes
/// and remote responses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The auth method type is not one of the supported variants.
    #[error("Invalid auth method type: {0:?}")]
    InvalidMethodType(String),

    /// A required configuration field is absent.
    #[error("Missing required field: {0}")]
    MissingRequiredField(String),

    /// A configuration value has the wrong shape.
    #[error("Invalid value for {key}: expected {expected}")]
    InvalidConfigValue {
        /// The offending configuration key.
        key: String,
        /// Human-readable description of the expected type.
        expected: &'static str,
    },

    /// The remote service returned a field with an unexpected type, or left
    /// out a field it always reports.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl CodecError {
    /// Creates an `InvalidConfigValue` error.
    #[must_use]
    pub fn invalid_value(key: impl Into<String>, expected: &'static str) -> Self {
        Self::InvalidConfigValue {
            key: key.into(),
            expected,
        }
    }

    /// Creates a `MalformedResponse` error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CodecError::InvalidMethodType("ldap".to_string());
        assert_eq!(err.to_string(), "Invalid auth method type: \"ldap\"");

        let err = CodecError::invalid_value("max_age", "unsigned 32-bit integer");
        assert_eq!(
            err.to_string(),
            "Invalid value for max_age: expected unsigned 32-bit integer"
        );

        let err = CodecError::malformed("state is not a string");
        assert_eq!(err.to_string(), "Malformed response: state is not a string");
    }
}
