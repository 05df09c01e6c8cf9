//! Host contract.
//!
//! A host (a CLI, a plugin runtime...) owns the local state of each auth
//! method and exposes it through [`ResourceData`]. [`AuthMethodResource`]
//! maps the four lifecycle entry points plus import onto the
//! [`Reconciler`], reporting failures as [`Diagnostic`]s rather than errors.

use std::fmt;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use authsync_core::fields::FIELD_DESCRIPTORS;
use authsync_core::{AuthMethodRecord, Comparison, ConfigMap, codec, keys};

use crate::diff::diff_fields;
use crate::error::ReconcileError;
use crate::reconciler::{ReadOutcome, Reconciler};

/// Read-only keys the service computes. Their last observed value is kept
/// instead of being treated as removed.
pub const COMPUTED_KEYS: &[&str] = &[
    keys::VERSION,
    keys::OIDC_STATE,
    keys::OIDC_DISCOVERY_URL,
    keys::OIDC_CLIENT_SECRET_HMAC,
    keys::OIDC_CALLBACK_URL,
];

/// Optional keys the service defaults when unset. An observed value is only
/// kept while it still equals the default; any other value was set by the
/// user, and leaving it out of the configuration resets it.
pub const DEFAULTED_KEYS: &[(&str, u32)] = &[
    (keys::MIN_LOGIN_NAME_LENGTH, keys::DEFAULT_MIN_LOGIN_NAME_LENGTH),
    (keys::MIN_PASSWORD_LENGTH, keys::DEFAULT_MIN_PASSWORD_LENGTH),
];

/// Errors raised by a host when storing a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("Unknown field: {0}")]
    UnknownField(String),
}

/// Local state accessor for one resource instance.
pub trait ResourceData: Send {
    /// Identity of the instance; empty when not created.
    fn id(&self) -> String;

    /// Returns the current value of `key`, or `None` if unset.
    fn get_field(&self, key: &str) -> Option<Value>;

    /// Returns `true` if `key` differs from the last persisted state.
    fn has_changed(&self, key: &str) -> bool;

    /// Stores an observed value. `Value::Null` clears the field.
    ///
    /// # Errors
    ///
    /// Returns a `HostError` if the host cannot store the value.
    fn set_field(&mut self, key: &str, value: Value) -> Result<(), HostError>;

    /// Sets the identity; an empty id marks the instance as gone.
    fn set_identity(&mut self, id: &str);
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// One message reported back to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
}

impl Diagnostic {
    #[must_use]
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.summary, self.detail)
    }
}

/// Diagnostics of one operation; empty means success.
pub type Diagnostics = Vec<Diagnostic>;

/// Returns `true` if any diagnostic is an error.
#[must_use]
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(|d| d.severity == Severity::Error)
}

fn failed(summary: &str, err: &ReconcileError) -> Diagnostics {
    warn!(category = %err.category(), error = %err, "{summary}");
    vec![Diagnostic::error(summary, err.to_string())]
}

/// Lifecycle entry points for the auth method resource.
#[derive(Clone)]
pub struct AuthMethodResource {
    reconciler: Reconciler,
}

impl AuthMethodResource {
    #[must_use]
    pub fn new(reconciler: Reconciler) -> Self {
        Self { reconciler }
    }

    /// Creates the remote method described by `data` and stores the result.
    pub async fn create(
        &self,
        cancel: &CancellationToken,
        data: &mut dyn ResourceData,
    ) -> Diagnostics {
        let result = async {
            let desired = desired_record(data)?;
            let created = self.reconciler.create(cancel, &desired).await?;
            store_record(data, &created)?;
            data.set_identity(&created.id);
            Ok::<_, ReconcileError>(())
        }
        .await;

        match result {
            Ok(()) => Diagnostics::new(),
            Err(err) => failed("Error creating auth method", &err),
        }
    }

    /// Refreshes `data` from the remote method. A vanished method clears the
    /// identity without reporting an error.
    pub async fn read(
        &self,
        cancel: &CancellationToken,
        data: &mut dyn ResourceData,
    ) -> Diagnostics {
        match self.refresh(cancel, data).await {
            Ok(_) => Diagnostics::new(),
            Err(err) => failed("Error reading auth method", &err),
        }
    }

    /// Sends the fields that changed in `data` since the last persisted
    /// state.
    pub async fn update(
        &self,
        cancel: &CancellationToken,
        data: &mut dyn ResourceData,
    ) -> Diagnostics {
        let result = async {
            for key in [keys::SCOPE_ID, keys::TYPE] {
                if data.has_changed(key) {
                    let requested = match data.get_field(key) {
                        Some(Value::String(s)) => s,
                        Some(other) => other.to_string(),
                        None => String::new(),
                    };
                    return Err(ReconcileError::immutable(key, requested));
                }
            }

            let desired = desired_record(data)?;
            let plan = diff_fields(&desired, |d| data.has_changed(d.key()));
            debug!(changed = plan.options.len(), "planned update from host changes");

            let previous = desired.clone();
            let updated = self.reconciler.apply(cancel, &previous, &desired, plan).await?;
            store_record(data, &updated)?;
            Ok::<_, ReconcileError>(())
        }
        .await;

        match result {
            Ok(()) => Diagnostics::new(),
            Err(err) => failed("Error updating auth method", &err),
        }
    }

    /// Deletes the remote method and clears the identity.
    pub async fn delete(
        &self,
        cancel: &CancellationToken,
        data: &mut dyn ResourceData,
    ) -> Diagnostics {
        match self.reconciler.delete(cancel, &data.id()).await {
            Ok(()) => {
                data.set_identity("");
                Diagnostics::new()
            }
            Err(err) => failed("Error deleting auth method", &err),
        }
    }

    /// Attaches an existing remote method to `data`, whose identity the host
    /// has already set to the imported id.
    pub async fn import(
        &self,
        cancel: &CancellationToken,
        data: &mut dyn ResourceData,
    ) -> Diagnostics {
        let id = data.id();
        match self.refresh(cancel, data).await {
            Ok(ReadOutcome::Present(_)) => Diagnostics::new(),
            Ok(ReadOutcome::Absent) => vec![Diagnostic::error(
                "Error importing auth method",
                format!("auth method {id:?} does not exist"),
            )],
            Err(err) => failed("Error importing auth method", &err),
        }
    }

    async fn refresh(
        &self,
        cancel: &CancellationToken,
        data: &mut dyn ResourceData,
    ) -> Result<ReadOutcome, ReconcileError> {
        let id = data.id();
        // Import starts without any local fields; nothing to carry over then.
        let previous = desired_record(data).ok();
        let outcome = self.reconciler.read(cancel, &id, previous.as_ref()).await?;
        match &outcome {
            ReadOutcome::Present(record) => store_record(data, record)?,
            ReadOutcome::Absent => data.set_identity(""),
        }
        Ok(outcome)
    }
}

impl From<HostError> for ReconcileError {
    fn from(err: HostError) -> Self {
        Self::invariant(format!("host rejected state: {err}"))
    }
}

/// Builds the desired record from the host's current fields.
fn desired_record(data: &dyn ResourceData) -> Result<AuthMethodRecord, ReconcileError> {
    let mut config = ConfigMap::new();
    for key in all_keys() {
        if let Some(value) = data.get_field(key) {
            config.insert(key.to_string(), value);
        }
    }
    let mut record = AuthMethodRecord::from_config(&config)?;
    record.id = data.id();
    Ok(record)
}

/// Writes every field of `record` to the host, clearing the ones it lacks.
fn store_record(data: &mut dyn ResourceData, record: &AuthMethodRecord) -> Result<(), HostError> {
    let mut config = record.to_config();
    for key in keys::COMMON_KEYS
        .iter()
        .chain([&keys::VERSION])
        .chain(record.method_type().attribute_keys())
    {
        let value = config.remove(*key).unwrap_or(Value::Null);
        data.set_field(key, value)?;
    }
    Ok(())
}

fn all_keys() -> impl Iterator<Item = &'static str> {
    keys::COMMON_KEYS
        .iter()
        .chain([&keys::VERSION])
        .chain(keys::PASSWORD_KEYS)
        .chain(keys::OIDC_KEYS)
        .copied()
}

/// In-memory [`ResourceData`] backed by a persisted state map and the
/// configuration the user wants.
#[derive(Debug, Clone, Default)]
pub struct MapResourceData {
    id: String,
    prior: ConfigMap,
    current: ConfigMap,
}

impl MapResourceData {
    /// Creates resource data from persisted state and the desired
    /// configuration. Values the service computes or defaults are kept from
    /// `prior` when the configuration does not mention them.
    #[must_use]
    pub fn new(id: impl Into<String>, prior: ConfigMap, config: ConfigMap) -> Self {
        let mut current = config;
        for key in COMPUTED_KEYS {
            if current.get(*key).is_none_or(Value::is_null)
                && let Some(value) = prior.get(*key)
            {
                current.insert((*key).to_string(), value.clone());
            }
        }
        for (key, default) in DEFAULTED_KEYS {
            if current.get(*key).is_none_or(Value::is_null)
                && let Some(value) = prior.get(*key)
                && value.as_u64() == Some(u64::from(*default))
            {
                current.insert((*key).to_string(), value.clone());
            }
        }
        Self {
            id: id.into(),
            prior,
            current,
        }
    }

    /// Resource data for an instance the host only knows by id (import).
    #[must_use]
    pub fn for_import(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Current field values, as they should be persisted.
    #[must_use]
    pub fn state(&self) -> &ConfigMap {
        &self.current
    }

    /// Consumes the data, returning the identity and the state to persist.
    #[must_use]
    pub fn into_state(self) -> (String, ConfigMap) {
        (self.id, self.current)
    }
}

impl ResourceData for MapResourceData {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn get_field(&self, key: &str) -> Option<Value> {
        self.current.get(key).filter(|v| !v.is_null()).cloned()
    }

    fn has_changed(&self, key: &str) -> bool {
        let trimmed_set = FIELD_DESCRIPTORS
            .iter()
            .any(|d| d.key() == key && d.comparison == Comparison::TrimmedSet);
        normalize(self.prior.get(key), trimmed_set) != normalize(self.current.get(key), trimmed_set)
    }

    fn set_field(&mut self, key: &str, value: Value) -> Result<(), HostError> {
        if !all_keys().any(|k| k == key) {
            return Err(HostError::UnknownField(key.to_string()));
        }
        if value.is_null() {
            self.current.remove(key);
        } else {
            self.current.insert(key.to_string(), value);
        }
        Ok(())
    }

    fn set_identity(&mut self, id: &str) {
        self.id = id.to_string();
        if id.is_empty() {
            self.current.clear();
        }
    }
}

/// Canonical form for change detection: zero values read as unset, and
/// trimmed-set lists ignore order and surrounding whitespace.
fn normalize(value: Option<&Value>, trimmed_set: bool) -> Option<Value> {
    match value? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) if n.as_u64() == Some(0) => None,
        Value::Bool(false) => None,
        Value::Array(items) if trimmed_set => {
            let items: Vec<String> = items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect();
            let mut items = codec::normalize_list(&items);
            items.sort();
            items.dedup();
            Some(Value::from(items))
        }
        other => Some(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> ConfigMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_has_changed_normalizes() {
        let data = MapResourceData::new(
            "amoidc_1",
            map(json!({
                "type": "oidc",
                "scope_id": "global",
                "max_age": 0,
                "idp_ca_certs": ["A", "B"],
                "signing_algorithms": ["RS256", "ES256"]
            })),
            map(json!({
                "type": "oidc",
                "scope_id": "global",
                "idp_ca_certs": ["B\n", " A"],
                "signing_algorithms": ["ES256", "RS256"]
            })),
        );
        assert!(!data.has_changed("max_age"));
        assert!(!data.has_changed("idp_ca_certs"));
        assert!(data.has_changed("signing_algorithms"));
        assert!(!data.has_changed("scope_id"));
    }

    #[test]
    fn test_computed_keys_survive_config() {
        let data = MapResourceData::new(
            "ampw_1",
            map(json!({
                "type": "password",
                "scope_id": "global",
                "version": 3,
                "min_login_name_length": 3
            })),
            map(json!({"type": "password", "scope_id": "global"})),
        );
        assert_eq!(data.get_field("version"), Some(json!(3)));
        assert_eq!(data.get_field("min_login_name_length"), Some(json!(3)));
        assert!(!data.has_changed("min_login_name_length"));
    }

    #[test]
    fn test_explicit_length_dropped_from_config_is_a_change() {
        let data = MapResourceData::new(
            "ampw_1",
            map(json!({
                "type": "password",
                "scope_id": "global",
                "version": 1,
                "min_login_name_length": 3,
                "min_password_length": 12
            })),
            map(json!({"type": "password", "scope_id": "global"})),
        );
        assert_eq!(data.get_field("min_password_length"), None);
        assert!(data.has_changed("min_password_length"));
        assert!(!data.has_changed("min_login_name_length"));
    }

    #[test]
    fn test_set_field_and_identity() {
        let mut data = MapResourceData::for_import("ampw_1");
        data.set_field("name", json!("primary")).unwrap();
        assert_eq!(data.get_field("name"), Some(json!("primary")));
        data.set_field("name", Value::Null).unwrap();
        assert_eq!(data.get_field("name"), None);
        assert_eq!(
            data.set_field("bogus", json!(1)),
            Err(HostError::UnknownField("bogus".to_string()))
        );

        data.set_field("scope_id", json!("global")).unwrap();
        data.set_identity("");
        assert!(data.state().is_empty());
        assert_eq!(data.id(), "");
    }

    #[test]
    fn test_diagnostics() {
        let diags = failed("Error reading auth method", &ReconcileError::Cancelled);
        assert!(has_errors(&diags));
        assert_eq!(diags[0].to_string(), "error: Error reading auth method: Operation cancelled");
        assert!(!has_errors(&[Diagnostic::warning("drift", "version moved")]));
    }
}
