//! Attribute codec.
//!
//! Translates the typed attribute bundle into remote create options, and the
//! loosely-typed attribute map reported by the remote service back into the
//! typed bundle. Pure; no I/O.
//!
//! The remote service is known to pad list elements (certificates, audiences)
//! with incidental whitespace, so those lists are trimmed on the way out and
//! on the way back in. Trimming is idempotent: re-encoding a decoded value
//! produces the same options.

use serde_json::{Map, Value};

use crate::error::CodecError;
use crate::keys;
use crate::options::{AuthMethodOption, Field, FieldValue};
use crate::types::{
    AuthMethodAttributes, AuthMethodRecord, ConfigMap, MethodType, OidcAttributes,
    PasswordAttributes,
};

/// Attribute map as reported by the remote service.
pub type ResponseAttributes = Map<String, Value>;

/// Trims surrounding whitespace from every element.
#[must_use]
pub fn normalize_list(items: &[String]) -> Vec<String> {
    items.iter().map(|s| s.trim().to_string()).collect()
}

/// Encodes the attribute bundle into "set" options.
///
/// Unset fields produce no option; the remote service applies its defaults.
/// Read-only fields are never emitted.
#[must_use]
pub fn encode(attributes: &AuthMethodAttributes) -> Vec<AuthMethodOption> {
    let mut options = Vec::new();
    match attributes {
        AuthMethodAttributes::Password(p) => {
            push_uint(&mut options, Field::MinLoginNameLength, p.min_login_name_length);
            push_uint(&mut options, Field::MinPasswordLength, p.min_password_length);
        }
        AuthMethodAttributes::Oidc(o) => {
            push_str(&mut options, Field::OidcIssuer, o.issuer.as_ref());
            push_str(&mut options, Field::OidcClientId, o.client_id.as_ref());
            push_str(&mut options, Field::OidcClientSecret, o.client_secret.as_ref());
            push_uint(&mut options, Field::OidcMaxAge, o.max_age);
            push_str(&mut options, Field::OidcApiUrlPrefix, o.api_url_prefix.as_ref());
            if let Some(certs) = &o.ca_certificates {
                options.push(AuthMethodOption::set(
                    Field::OidcCaCertificates,
                    FieldValue::List(normalize_list(certs)),
                ));
            }
            if let Some(audiences) = &o.allowed_audiences {
                options.push(AuthMethodOption::set(
                    Field::OidcAllowedAudiences,
                    FieldValue::List(audiences.clone()),
                ));
            }
            if let Some(disable) = o.disable_discovered_config_validation {
                options.push(AuthMethodOption::set(
                    Field::OidcDisableDiscoveredConfigValidation,
                    FieldValue::Bool(disable),
                ));
            }
            if let Some(algorithms) = &o.signing_algorithms {
                options.push(AuthMethodOption::set(
                    Field::OidcSigningAlgorithms,
                    FieldValue::List(algorithms.clone()),
                ));
            }
        }
    }
    options
}

/// Encodes a flat configuration map for the given type name.
///
/// # Errors
///
/// Returns `InvalidMethodType` if `method_type` is not a supported type and
/// `InvalidConfigValue` if an attribute has the wrong shape.
pub fn encode_config(
    method_type: &str,
    config: &ConfigMap,
) -> Result<Vec<AuthMethodOption>, CodecError> {
    let method_type: MethodType = method_type.parse()?;
    let attributes = AuthMethodAttributes::from_config(method_type, config)?;
    Ok(encode(&attributes))
}

/// Encodes everything a create request carries besides type and scope:
/// name, description and the attribute options.
#[must_use]
pub fn encode_create(record: &AuthMethodRecord) -> Vec<AuthMethodOption> {
    let mut options = Vec::new();
    push_str(&mut options, Field::Name, record.name.as_ref());
    push_str(&mut options, Field::Description, record.description.as_ref());
    options.extend(encode(&record.attributes));
    options
}

/// Decodes a remote attribute map into the typed bundle.
///
/// `previous` supplies values the response may legitimately omit: the
/// write-only client secret and the conditionally reported OIDC fields
/// (`api_url_prefix`, `callback_url`, `disable_discovered_config_validation`).
/// If `previous` is of another variant it is ignored.
///
/// # Errors
///
/// Returns `MalformedResponse` when an always-reported field is missing or
/// any field has an unexpected type.
pub fn decode(
    method_type: MethodType,
    attrs: &ResponseAttributes,
    previous: &AuthMethodAttributes,
) -> Result<AuthMethodAttributes, CodecError> {
    match method_type {
        MethodType::Password => Ok(AuthMethodAttributes::Password(PasswordAttributes {
            min_login_name_length: Some(required_u32(attrs, keys::MIN_LOGIN_NAME_LENGTH)?),
            min_password_length: Some(required_u32(attrs, keys::MIN_PASSWORD_LENGTH)?),
        })),
        MethodType::Oidc => {
            let prev = match previous {
                AuthMethodAttributes::Oidc(o) => o.clone(),
                AuthMethodAttributes::Password(_) => OidcAttributes::default(),
            };
            decode_oidc(attrs, prev).map(AuthMethodAttributes::Oidc)
        }
    }
}

fn decode_oidc(
    attrs: &ResponseAttributes,
    prev: OidcAttributes,
) -> Result<OidcAttributes, CodecError> {
    let mut oidc = OidcAttributes {
        state: non_empty(required_str(attrs, keys::OIDC_STATE)?),
        issuer: non_empty(required_str(attrs, keys::OIDC_ISSUER)?),
        client_id: non_empty(required_str(attrs, keys::OIDC_CLIENT_ID)?),
        client_secret_hmac: non_empty(required_str(attrs, keys::OIDC_CLIENT_SECRET_HMAC)?),
        client_secret: prev.client_secret,
        discovery_url: optional_str(attrs, keys::OIDC_DISCOVERY_URL)?.and_then(non_empty),
        max_age: optional_u32(attrs, keys::OIDC_MAX_AGE)?.filter(|n| *n != 0),
        signing_algorithms: optional_list(attrs, keys::OIDC_SIGNING_ALGORITHMS)?,
        ca_certificates: optional_list(attrs, keys::OIDC_CA_CERTIFICATES)?
            .map(|certs| normalize_list(&certs)),
        allowed_audiences: optional_list(attrs, keys::OIDC_ALLOWED_AUDIENCES)?
            .map(|aud| normalize_list(&aud)),
        api_url_prefix: prev.api_url_prefix,
        callback_url: prev.callback_url,
        disable_discovered_config_validation: prev.disable_discovered_config_validation,
    };

    // Reported only sometimes; keep the last known value otherwise.
    if attrs.contains_key(keys::OIDC_API_URL_PREFIX) {
        oidc.api_url_prefix = optional_str(attrs, keys::OIDC_API_URL_PREFIX)?.and_then(non_empty);
    }
    if attrs.contains_key(keys::OIDC_CALLBACK_URL) {
        oidc.callback_url = optional_str(attrs, keys::OIDC_CALLBACK_URL)?.and_then(non_empty);
    }
    if attrs.contains_key(keys::OIDC_DISABLE_DISCOVERED_CONFIG_VALIDATION) {
        oidc.disable_discovered_config_validation =
            optional_bool(attrs, keys::OIDC_DISABLE_DISCOVERED_CONFIG_VALIDATION)?
                .filter(|b| *b);
    }

    Ok(oidc)
}

fn push_str(options: &mut Vec<AuthMethodOption>, field: Field, value: Option<&String>) {
    if let Some(v) = value {
        options.push(AuthMethodOption::set(field, FieldValue::Str(v.clone())));
    }
}

fn push_uint(options: &mut Vec<AuthMethodOption>, field: Field, value: Option<u32>) {
    if let Some(v) = value {
        options.push(AuthMethodOption::set(field, FieldValue::Uint(v)));
    }
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

fn mismatch(key: &str, expected: &str, got: &Value) -> CodecError {
    CodecError::malformed(format!("attribute {key}: expected {expected}, got {got}"))
}

fn required<'a>(attrs: &'a ResponseAttributes, key: &str) -> Result<&'a Value, CodecError> {
    attrs
        .get(key)
        .filter(|v| !v.is_null())
        .ok_or_else(|| CodecError::malformed(format!("attribute {key} is missing")))
}

fn required_str(attrs: &ResponseAttributes, key: &str) -> Result<String, CodecError> {
    let value = required(attrs, key)?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| mismatch(key, "string", value))
}

fn required_u32(attrs: &ResponseAttributes, key: &str) -> Result<u32, CodecError> {
    let value = required(attrs, key)?;
    as_u32(key, value)
}

fn as_u32(key: &str, value: &Value) -> Result<u32, CodecError> {
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| mismatch(key, "unsigned 32-bit integer", value))
}

fn optional_str(attrs: &ResponseAttributes, key: &str) -> Result<Option<String>, CodecError> {
    match attrs.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(mismatch(key, "string", other)),
    }
}

fn optional_u32(attrs: &ResponseAttributes, key: &str) -> Result<Option<u32>, CodecError> {
    match attrs.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => as_u32(key, value).map(Some),
    }
}

fn optional_bool(attrs: &ResponseAttributes, key: &str) -> Result<Option<bool>, CodecError> {
    match attrs.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(mismatch(key, "boolean", other)),
    }
}

fn optional_list(attrs: &ResponseAttributes, key: &str) -> Result<Option<Vec<String>>, CodecError> {
    match attrs.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| mismatch(key, "list of strings", item))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(other) => Err(mismatch(key, "list of strings", other)),
    }
}
