//! Auth method data model.
//!
//! An auth method is polymorphic over its type: the attribute bundle is a sum
//! type whose variant *is* the method type, so a record can never carry
//! password attributes while claiming to be an OIDC method.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CodecError;
use crate::keys;

/// Flat configuration record, keyed by the names in [`crate::keys`].
///
/// JSON `null` is treated exactly like an absent key.
pub type ConfigMap = Map<String, Value>;

/// Supported auth method types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodType {
    Password,
    Oidc,
}

impl MethodType {
    /// Returns the wire name of the type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::Oidc => "oidc",
        }
    }

    /// Returns the attribute keys that belong to this variant.
    #[must_use]
    pub fn attribute_keys(&self) -> &'static [&'static str] {
        match self {
            Self::Password => keys::PASSWORD_KEYS,
            Self::Oidc => keys::OIDC_KEYS,
        }
    }
}

impl fmt::Display for MethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MethodType {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "password" => Ok(Self::Password),
            "oidc" => Ok(Self::Oidc),
            other => Err(CodecError::InvalidMethodType(other.to_string())),
        }
    }
}

/// Attributes of a password auth method.
///
/// Both lengths are optional: when unset the remote service applies its own
/// defaults and reports them back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordAttributes {
    pub min_login_name_length: Option<u32>,
    pub min_password_length: Option<u32>,
}

/// Attributes of an OIDC auth method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OidcAttributes {
    /// Server-observed state (read-only).
    pub state: Option<String>,
    pub issuer: Option<String>,
    /// Derived by the server from the issuer (read-only).
    pub discovery_url: Option<String>,
    pub client_id: Option<String>,
    /// Write-only; the server only ever reports `client_secret_hmac`.
    pub client_secret: Option<String>,
    /// Read-only.
    pub client_secret_hmac: Option<String>,
    pub max_age: Option<u32>,
    /// Ordered; the server's order is preserved.
    pub signing_algorithms: Option<Vec<String>>,
    pub api_url_prefix: Option<String>,
    /// Derived by the server (read-only).
    pub callback_url: Option<String>,
    /// PEM certificates. Compared as a trimmed set.
    pub ca_certificates: Option<Vec<String>>,
    /// Compared as a trimmed set, sent as an ordered list.
    pub allowed_audiences: Option<Vec<String>>,
    pub disable_discovered_config_validation: Option<bool>,
}

/// Variant attribute bundle, tagged by auth method type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMethodAttributes {
    Password(PasswordAttributes),
    Oidc(OidcAttributes),
}

impl AuthMethodAttributes {
    /// Returns an empty bundle for the given type.
    #[must_use]
    pub fn empty(method_type: MethodType) -> Self {
        match method_type {
            MethodType::Password => Self::Password(PasswordAttributes::default()),
            MethodType::Oidc => Self::Oidc(OidcAttributes::default()),
        }
    }

    /// Returns the auth method type this bundle belongs to.
    #[must_use]
    pub fn method_type(&self) -> MethodType {
        match self {
            Self::Password(_) => MethodType::Password,
            Self::Oidc(_) => MethodType::Oidc,
        }
    }

    /// Parses the variant selected by `method_type` out of a flat
    /// configuration map. Keys of the other variant are ignored.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::InvalidConfigValue` if a present value has the
    /// wrong JSON type.
    pub fn from_config(method_type: MethodType, config: &ConfigMap) -> Result<Self, CodecError> {
        let attrs = match method_type {
            MethodType::Password => Self::Password(PasswordAttributes {
                min_login_name_length: config_u32(config, keys::MIN_LOGIN_NAME_LENGTH)?,
                min_password_length: config_u32(config, keys::MIN_PASSWORD_LENGTH)?,
            }),
            MethodType::Oidc => Self::Oidc(OidcAttributes {
                state: config_str(config, keys::OIDC_STATE)?,
                issuer: config_str(config, keys::OIDC_ISSUER)?,
                discovery_url: config_str(config, keys::OIDC_DISCOVERY_URL)?,
                client_id: config_str(config, keys::OIDC_CLIENT_ID)?,
                client_secret: config_str(config, keys::OIDC_CLIENT_SECRET)?,
                client_secret_hmac: config_str(config, keys::OIDC_CLIENT_SECRET_HMAC)?,
                max_age: config_u32(config, keys::OIDC_MAX_AGE)?,
                signing_algorithms: config_list(config, keys::OIDC_SIGNING_ALGORITHMS)?,
                api_url_prefix: config_str(config, keys::OIDC_API_URL_PREFIX)?,
                callback_url: config_str(config, keys::OIDC_CALLBACK_URL)?,
                ca_certificates: config_list(config, keys::OIDC_CA_CERTIFICATES)?,
                allowed_audiences: config_list(config, keys::OIDC_ALLOWED_AUDIENCES)?,
                disable_discovered_config_validation: config_bool(
                    config,
                    keys::OIDC_DISABLE_DISCOVERED_CONFIG_VALIDATION,
                )?,
            }),
        };
        Ok(attrs)
    }

    /// Writes every populated attribute into `config`.
    pub fn write_config(&self, config: &mut ConfigMap) {
        match self {
            Self::Password(p) => {
                put(config, keys::MIN_LOGIN_NAME_LENGTH, p.min_login_name_length.map(Value::from));
                put(config, keys::MIN_PASSWORD_LENGTH, p.min_password_length.map(Value::from));
            }
            Self::Oidc(o) => {
                put(config, keys::OIDC_STATE, o.state.clone().map(Value::from));
                put(config, keys::OIDC_ISSUER, o.issuer.clone().map(Value::from));
                put(config, keys::OIDC_DISCOVERY_URL, o.discovery_url.clone().map(Value::from));
                put(config, keys::OIDC_CLIENT_ID, o.client_id.clone().map(Value::from));
                put(config, keys::OIDC_CLIENT_SECRET, o.client_secret.clone().map(Value::from));
                put(
                    config,
                    keys::OIDC_CLIENT_SECRET_HMAC,
                    o.client_secret_hmac.clone().map(Value::from),
                );
                put(config, keys::OIDC_MAX_AGE, o.max_age.map(Value::from));
                put(
                    config,
                    keys::OIDC_SIGNING_ALGORITHMS,
                    o.signing_algorithms.clone().map(Value::from),
                );
                put(config, keys::OIDC_API_URL_PREFIX, o.api_url_prefix.clone().map(Value::from));
                put(config, keys::OIDC_CALLBACK_URL, o.callback_url.clone().map(Value::from));
                put(
                    config,
                    keys::OIDC_CA_CERTIFICATES,
                    o.ca_certificates.clone().map(Value::from),
                );
                put(
                    config,
                    keys::OIDC_ALLOWED_AUDIENCES,
                    o.allowed_audiences.clone().map(Value::from),
                );
                put(
                    config,
                    keys::OIDC_DISABLE_DISCOVERED_CONFIG_VALIDATION,
                    o.disable_discovered_config_validation.map(Value::from),
                );
            }
        }
    }
}

/// Local desired or observed state of one auth method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthMethodRecord {
    /// Server-assigned identifier; empty until created.
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    /// Immutable after create.
    pub scope_id: String,
    /// Concurrency token reported by the remote service.
    pub version: Option<u32>,
    /// Immutable variant after create.
    pub attributes: AuthMethodAttributes,
}

impl AuthMethodRecord {
    /// Creates an empty, not yet created record.
    #[must_use]
    pub fn new(scope_id: impl Into<String>, attributes: AuthMethodAttributes) -> Self {
        Self {
            id: String::new(),
            name: None,
            description: None,
            scope_id: scope_id.into(),
            version: None,
            attributes,
        }
    }

    /// Sets the name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the auth method type, derived from the attribute variant.
    #[must_use]
    pub fn method_type(&self) -> MethodType {
        self.attributes.method_type()
    }

    /// Returns `true` once the remote service has assigned an id.
    #[must_use]
    pub fn is_created(&self) -> bool {
        !self.id.is_empty()
    }

    /// Returns the password attributes, if this is a password method.
    #[must_use]
    pub fn password(&self) -> Option<&PasswordAttributes> {
        match &self.attributes {
            AuthMethodAttributes::Password(p) => Some(p),
            AuthMethodAttributes::Oidc(_) => None,
        }
    }

    /// Returns the OIDC attributes, if this is an OIDC method.
    #[must_use]
    pub fn oidc(&self) -> Option<&OidcAttributes> {
        match &self.attributes {
            AuthMethodAttributes::Oidc(o) => Some(o),
            AuthMethodAttributes::Password(_) => None,
        }
    }

    /// Builds a record from a flat configuration map.
    ///
    /// `type` and `scope_id` are required. `id` and `version` are picked up
    /// when present so that previously persisted state round-trips.
    ///
    /// # Errors
    ///
    /// Returns `MissingRequiredField` if `type` or `scope_id` is absent,
    /// `InvalidMethodType` for an unknown type, and `InvalidConfigValue` for
    /// values of the wrong shape.
    pub fn from_config(config: &ConfigMap) -> Result<Self, CodecError> {
        let method_type: MethodType = config_str(config, keys::TYPE)?
            .ok_or_else(|| CodecError::MissingRequiredField(keys::TYPE.to_string()))?
            .parse()?;
        let scope_id = config_str(config, keys::SCOPE_ID)?
            .ok_or_else(|| CodecError::MissingRequiredField(keys::SCOPE_ID.to_string()))?;

        Ok(Self {
            id: config_str(config, keys::ID)?.unwrap_or_default(),
            name: config_str(config, keys::NAME)?,
            description: config_str(config, keys::DESCRIPTION)?,
            scope_id,
            version: config_u32(config, keys::VERSION)?,
            attributes: AuthMethodAttributes::from_config(method_type, config)?,
        })
    }

    /// Flattens the record into a configuration map. The id is not included;
    /// hosts track identity separately.
    #[must_use]
    pub fn to_config(&self) -> ConfigMap {
        let mut config = ConfigMap::new();
        put(&mut config, keys::NAME, self.name.clone().map(Value::from));
        put(&mut config, keys::DESCRIPTION, self.description.clone().map(Value::from));
        config.insert(keys::SCOPE_ID.to_string(), Value::from(self.scope_id.clone()));
        config.insert(keys::TYPE.to_string(), Value::from(self.method_type().as_str()));
        put(&mut config, keys::VERSION, self.version.map(Value::from));
        self.attributes.write_config(&mut config);
        config
    }
}

fn put(config: &mut ConfigMap, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        config.insert(key.to_string(), value);
    }
}

fn present<'a>(config: &'a ConfigMap, key: &str) -> Option<&'a Value> {
    config.get(key).filter(|v| !v.is_null())
}

// Scalar zero values count as unset, matching how hosts report optional
// attributes the user never wrote. Lists are the exception: an empty list is
// an explicit value.

/// Reads an optional string; the empty string is treated as unset.
///
/// # Errors
///
/// Returns `InvalidConfigValue` if the value is not a string.
pub fn config_str(config: &ConfigMap, key: &str) -> Result<Option<String>, CodecError> {
    match present(config, key) {
        None => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(CodecError::invalid_value(key, "string")),
    }
}

/// Reads an optional `u32`; zero is treated as unset.
///
/// # Errors
///
/// Returns `InvalidConfigValue` if the value is not a non-negative integer
/// that fits in 32 bits.
pub fn config_u32(config: &ConfigMap, key: &str) -> Result<Option<u32>, CodecError> {
    match present(config, key) {
        None => Ok(None),
        Some(v) => {
            let n = v
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| CodecError::invalid_value(key, "unsigned 32-bit integer"))?;
            Ok((n != 0).then_some(n))
        }
    }
}

/// Reads an optional bool; `false` is treated as unset.
///
/// # Errors
///
/// Returns `InvalidConfigValue` if the value is not a boolean.
pub fn config_bool(config: &ConfigMap, key: &str) -> Result<Option<bool>, CodecError> {
    match present(config, key) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(b.then_some(true)),
        Some(_) => Err(CodecError::invalid_value(key, "boolean")),
    }
}

/// Reads an optional list of strings. An empty list is an explicit value.
///
/// # Errors
///
/// Returns `InvalidConfigValue` if the value is not an array of strings.
pub fn config_list(config: &ConfigMap, key: &str) -> Result<Option<Vec<String>>, CodecError> {
    match present(config, key) {
        None => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| CodecError::invalid_value(key, "list of strings"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(_) => Err(CodecError::invalid_value(key, "list of strings")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(value: Value) -> ConfigMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_method_type_parse() {
        assert_eq!("password".parse::<MethodType>().unwrap(), MethodType::Password);
        assert_eq!("oidc".parse::<MethodType>().unwrap(), MethodType::Oidc);
        assert_eq!(
            "ldap".parse::<MethodType>().unwrap_err(),
            CodecError::InvalidMethodType("ldap".to_string())
        );
        assert_eq!(MethodType::Oidc.to_string(), "oidc");
    }

    #[test]
    fn test_from_config_requires_type_and_scope() {
        let err =
            AuthMethodRecord::from_config(&config(json!({"scope_id": "global"}))).unwrap_err();
        assert_eq!(err, CodecError::MissingRequiredField("type".to_string()));

        let err = AuthMethodRecord::from_config(&config(json!({"type": "password"}))).unwrap_err();
        assert_eq!(err, CodecError::MissingRequiredField("scope_id".to_string()));

        let err = AuthMethodRecord::from_config(&config(json!({
            "type": "kerberos",
            "scope_id": "global"
        })))
        .unwrap_err();
        assert_eq!(err, CodecError::InvalidMethodType("kerberos".to_string()));
    }

    #[test]
    fn test_from_config_selects_variant() {
        let record = AuthMethodRecord::from_config(&config(json!({
            "type": "password",
            "scope_id": "global",
            "name": "local",
            "min_password_length": 12,
            "issuer": "https://ignored.example.com"
        })))
        .unwrap();

        assert_eq!(record.method_type(), MethodType::Password);
        assert_eq!(record.name.as_deref(), Some("local"));
        assert_eq!(
            record.password().unwrap(),
            &PasswordAttributes {
                min_login_name_length: None,
                min_password_length: Some(12),
            }
        );
        assert!(record.oidc().is_none());
    }

    #[test]
    fn test_zero_values_are_unset_but_empty_lists_are_not() {
        let record = AuthMethodRecord::from_config(&config(json!({
            "type": "oidc",
            "scope_id": "o_1234",
            "max_age": 0,
            "api_url_prefix": "",
            "disable_discovered_config_validation": false,
            "idp_ca_certs": [],
            "allowed_audiences": null
        })))
        .unwrap();

        let oidc = record.oidc().unwrap();
        assert_eq!(oidc.max_age, None);
        assert_eq!(oidc.api_url_prefix, None);
        assert_eq!(oidc.disable_discovered_config_validation, None);
        assert_eq!(oidc.ca_certificates, Some(vec![]));
        assert_eq!(oidc.allowed_audiences, None);
    }

    #[test]
    fn test_from_config_rejects_wrong_shapes() {
        let err = AuthMethodRecord::from_config(&config(json!({
            "type": "password",
            "scope_id": "global",
            "min_login_name_length": "three"
        })))
        .unwrap_err();
        assert_eq!(
            err,
            CodecError::invalid_value("min_login_name_length", "unsigned 32-bit integer")
        );

        let err = AuthMethodRecord::from_config(&config(json!({
            "type": "oidc",
            "scope_id": "global",
            "signing_algorithms": ["RS256", 7]
        })))
        .unwrap_err();
        assert_eq!(err, CodecError::invalid_value("signing_algorithms", "list of strings"));
    }

    #[test]
    fn test_to_config_round_trip() {
        let record = AuthMethodRecord::from_config(&config(json!({
            "type": "oidc",
            "scope_id": "o_1234",
            "description": "corporate sso",
            "version": 4,
            "issuer": "https://idp.example.com",
            "client_id": "authsync",
            "signing_algorithms": ["RS256", "ES256"],
            "allowed_audiences": ["api"]
        })))
        .unwrap();

        let flat = record.to_config();
        assert_eq!(flat.get("type"), Some(&json!("oidc")));
        assert_eq!(flat.get("version"), Some(&json!(4)));
        assert!(!flat.contains_key("name"));
        assert!(!flat.contains_key("id"));
        assert_eq!(AuthMethodRecord::from_config(&flat).unwrap(), record);
    }
}
