//! Typed options sent to the remote service on create and update.
//!
//! Each option either sets a field to an explicit value or resets it to the
//! server-side default. On the wire a reset is a JSON `null`.

use std::fmt;

use serde_json::{Map, Value};

use crate::keys;

/// Mutable fields of an auth method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Description,
    MinLoginNameLength,
    MinPasswordLength,
    OidcIssuer,
    OidcClientId,
    OidcClientSecret,
    OidcMaxAge,
    OidcSigningAlgorithms,
    OidcApiUrlPrefix,
    OidcCaCertificates,
    OidcAllowedAudiences,
    OidcDisableDiscoveredConfigValidation,
}

impl Field {
    /// Returns the configuration/wire key of this field.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Self::Name => keys::NAME,
            Self::Description => keys::DESCRIPTION,
            Self::MinLoginNameLength => keys::MIN_LOGIN_NAME_LENGTH,
            Self::MinPasswordLength => keys::MIN_PASSWORD_LENGTH,
            Self::OidcIssuer => keys::OIDC_ISSUER,
            Self::OidcClientId => keys::OIDC_CLIENT_ID,
            Self::OidcClientSecret => keys::OIDC_CLIENT_SECRET,
            Self::OidcMaxAge => keys::OIDC_MAX_AGE,
            Self::OidcSigningAlgorithms => keys::OIDC_SIGNING_ALGORITHMS,
            Self::OidcApiUrlPrefix => keys::OIDC_API_URL_PREFIX,
            Self::OidcCaCertificates => keys::OIDC_CA_CERTIFICATES,
            Self::OidcAllowedAudiences => keys::OIDC_ALLOWED_AUDIENCES,
            Self::OidcDisableDiscoveredConfigValidation => {
                keys::OIDC_DISABLE_DISCOVERED_CONFIG_VALIDATION
            }
        }
    }

    /// Returns `true` if the field lives under `attributes` on the wire.
    #[must_use]
    pub fn is_attribute(&self) -> bool {
        !matches!(self, Self::Name | Self::Description)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A typed field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Str(String),
    Uint(u32),
    Bool(bool),
    List(Vec<String>),
}

impl FieldValue {
    /// Converts the value into JSON.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Str(s) => Value::from(s.as_str()),
            Self::Uint(n) => Value::from(*n),
            Self::Bool(b) => Value::from(*b),
            Self::List(items) => Value::from(items.clone()),
        }
    }
}

/// One create/update option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMethodOption {
    /// Set the field to an explicit value.
    Set { field: Field, value: FieldValue },
    /// Reset the field to the server default.
    Default(Field),
}

impl AuthMethodOption {
    /// Creates a `Set` option.
    #[must_use]
    pub fn set(field: Field, value: FieldValue) -> Self {
        Self::Set { field, value }
    }

    /// Returns the field this option targets.
    #[must_use]
    pub fn field(&self) -> Field {
        match self {
            Self::Set { field, .. } | Self::Default(field) => *field,
        }
    }

    /// Returns `true` for a reset-to-default option.
    #[must_use]
    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default(_))
    }
}

/// Serializes options into a request body fragment.
///
/// Top-level fields land at the root, attribute fields under `attributes`.
/// When several options target the same field the last one wins, so a reset
/// followed by a set leaves the explicit value.
#[must_use]
pub fn options_to_body(options: &[AuthMethodOption]) -> Map<String, Value> {
    let mut body = Map::new();
    let mut attributes = Map::new();

    for option in options {
        let (field, value) = match option {
            AuthMethodOption::Set { field, value } => (*field, value.to_json()),
            AuthMethodOption::Default(field) => (*field, Value::Null),
        };
        let target = if field.is_attribute() {
            &mut attributes
        } else {
            &mut body
        };
        target.insert(field.key().to_string(), value);
    }

    if !attributes.is_empty() {
        body.insert(keys::ATTRIBUTES.to_string(), Value::Object(attributes));
    }
    body
}
