//! Request and response types exchanged with the remote service.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use authsync_core::{AuthMethodOption, MethodType, keys, options_to_body};

use crate::error::GatewayError;

/// Result of an operation addressed at an existing resource.
///
/// `NotFound` is a normal outcome, not an error: the caller decides whether
/// absence is acceptable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    /// Returns `true` if the resource does not exist remotely.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Converts into an `Option`, dropping the distinction.
    #[must_use]
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound => None,
        }
    }

    /// Maps the found value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Self::Found(value) => Lookup::Found(f(value)),
            Self::NotFound => Lookup::NotFound,
        }
    }
}

/// Concurrency token supplied with an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionToken {
    /// Apply only if the remote version still equals this one.
    Exact(u32),
    /// Let the service resolve the current version.
    Automatic,
}

/// A create request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    pub method_type: MethodType,
    pub scope_id: String,
    pub options: Vec<AuthMethodOption>,
}

impl CreateRequest {
    /// Builds the JSON request body.
    #[must_use]
    pub fn to_body(&self) -> Value {
        let mut body = options_to_body(&self.options);
        body.insert(keys::TYPE.to_string(), Value::from(self.method_type.as_str()));
        body.insert(keys::SCOPE_ID.to_string(), Value::from(self.scope_id.as_str()));
        Value::Object(body)
    }
}

/// An update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    pub id: String,
    pub version: VersionToken,
    pub options: Vec<AuthMethodOption>,
}

impl UpdateRequest {
    /// Builds the JSON request body. An automatic version is left out; the
    /// transport signals it separately.
    #[must_use]
    pub fn to_body(&self) -> Value {
        let mut body = options_to_body(&self.options);
        if let VersionToken::Exact(version) = self.version {
            body.insert(keys::VERSION.to_string(), Value::from(version));
        }
        Value::Object(body)
    }

    /// Returns `true` if the service should resolve the version.
    #[must_use]
    pub fn is_automatic(&self) -> bool {
        self.version == VersionToken::Automatic
    }
}

/// Normalized view of an auth method as reported by the remote service.
///
/// Top-level fields are validated once here; the attribute map stays raw and
/// is decoded by the codec for the reported type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub id: String,
    pub version: u32,
    /// Raw type tag.
    #[serde(rename = "type")]
    pub method_type: String,
    pub scope_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl ResponseEnvelope {
    /// Parses a response body.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Malformed` if a top-level field is missing or
    /// has the wrong type.
    pub fn from_json(value: Value) -> Result<Self, GatewayError> {
        serde_json::from_value(value)
            .map_err(|e| GatewayError::malformed(format!("invalid auth method document: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authsync_core::{Field, FieldValue};
    use serde_json::json;

    #[test]
    fn test_create_body() {
        let request = CreateRequest {
            method_type: MethodType::Password,
            scope_id: "global".to_string(),
            options: vec![AuthMethodOption::set(Field::MinLoginNameLength, FieldValue::Uint(5))],
        };
        assert_eq!(
            request.to_body(),
            json!({
                "type": "password",
                "scope_id": "global",
                "attributes": {"min_login_name_length": 5}
            })
        );
    }

    #[test]
    fn test_update_body_version() {
        let mut request = UpdateRequest {
            id: "ampw_1".to_string(),
            version: VersionToken::Exact(3),
            options: vec![AuthMethodOption::Default(Field::Name)],
        };
        assert_eq!(request.to_body(), json!({"name": null, "version": 3}));
        assert!(!request.is_automatic());

        request.version = VersionToken::Automatic;
        assert_eq!(request.to_body(), json!({"name": null}));
        assert!(request.is_automatic());
    }

    #[test]
    fn test_envelope_parse() {
        let envelope = ResponseEnvelope::from_json(json!({
            "id": "ampw_1234567890",
            "version": 1,
            "type": "password",
            "scope_id": "global",
            "attributes": {"min_login_name_length": 3, "min_password_length": 8}
        }))
        .unwrap();
        assert_eq!(envelope.name, None);
        assert_eq!(envelope.attributes.len(), 2);

        let err =
            ResponseEnvelope::from_json(json!({"id": "ampw_1", "type": "password"})).unwrap_err();
        assert!(matches!(err, GatewayError::Malformed(_)));
    }

    #[test]
    fn test_lookup_helpers() {
        let found: Lookup<u32> = Lookup::Found(2);
        assert_eq!(found.clone().map(|v| v * 2), Lookup::Found(4));
        assert_eq!(found.found(), Some(2));
        assert!(Lookup::<u32>::NotFound.is_not_found());
    }
}
