//! In-process implementation of the remote auth method service.
//!
//! Behaves like the real service closely enough to exercise reconciliation
//! end to end: it assigns ids, applies server defaults, derives read-only
//! OIDC fields, never echoes the client secret, enforces exact versions and
//! (optionally) pads list elements with whitespace the way the real service
//! does. It also counts calls and records update requests so tests can assert
//! on network traffic.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use url::Url;

use authsync_core::{MethodType, keys};

use crate::error::GatewayError;
use crate::traits::AuthMethodGateway;
use crate::types::{CreateRequest, Lookup, ResponseEnvelope, UpdateRequest, VersionToken};

/// Snapshot of how many calls reached the gateway.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub create: usize,
    pub read: usize,
    pub update: usize,
    pub delete: usize,
}

impl CallCounts {
    /// Total number of calls.
    #[must_use]
    pub fn total(&self) -> usize {
        self.create + self.read + self.update + self.delete
    }
}

#[derive(Debug, Default)]
struct Counters {
    create: AtomicUsize,
    read: AtomicUsize,
    update: AtomicUsize,
    delete: AtomicUsize,
}

#[derive(Debug, Clone)]
struct StoredMethod {
    id: String,
    version: u32,
    method_type: MethodType,
    scope_id: String,
    name: Option<String>,
    description: Option<String>,
    /// Writable attributes as last set by a client.
    attributes: Map<String, Value>,
    client_secret: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    methods: HashMap<String, StoredMethod>,
    next_id: u64,
    fail_next: Option<GatewayError>,
    empty_next: bool,
    updates: Vec<UpdateRequest>,
}

/// In-memory auth method service.
#[derive(Debug)]
pub struct MemoryGateway {
    state: Mutex<State>,
    counters: Counters,
    inject_whitespace: bool,
    latency: Option<Duration>,
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGateway {
    /// Creates an empty service.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 1_000_000_000,
                ..State::default()
            }),
            counters: Counters::default(),
            inject_whitespace: false,
            latency: None,
        }
    }

    /// Pads every certificate and audience in responses with a trailing
    /// newline, as the real service sometimes does.
    #[must_use]
    pub fn with_whitespace_injection(mut self, inject: bool) -> Self {
        self.inject_whitespace = inject;
        self
    }

    /// Delays every call, to exercise cancellation.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Returns how many calls reached the service so far.
    #[must_use]
    pub fn calls(&self) -> CallCounts {
        CallCounts {
            create: self.counters.create.load(Ordering::SeqCst),
            read: self.counters.read.load(Ordering::SeqCst),
            update: self.counters.update.load(Ordering::SeqCst),
            delete: self.counters.delete.load(Ordering::SeqCst),
        }
    }

    /// Returns every update request received, oldest first.
    pub async fn update_requests(&self) -> Vec<UpdateRequest> {
        self.state.lock().await.updates.clone()
    }

    /// Makes the next call fail with `err`.
    pub async fn fail_next(&self, err: GatewayError) {
        self.state.lock().await.fail_next = Some(err);
    }

    /// Makes the next successful create or update answer without a body.
    pub async fn respond_empty_next(&self) {
        self.state.lock().await.empty_next = true;
    }

    /// Simulates a concurrent modification by another client.
    ///
    /// Returns the new version, or `None` if the id does not exist.
    pub async fn bump_version(&self, id: &str) -> Option<u32> {
        let mut state = self.state.lock().await;
        let method = state.methods.get_mut(id)?;
        method.version += 1;
        Some(method.version)
    }

    /// Removes a method behind the reconciler's back.
    pub async fn remove(&self, id: &str) -> bool {
        self.state.lock().await.methods.remove(id).is_some()
    }

    /// Returns the current rendering of a stored method.
    pub async fn get(&self, id: &str) -> Option<ResponseEnvelope> {
        let state = self.state.lock().await;
        state.methods.get(id).map(|m| self.render(m))
    }

    /// Number of stored methods.
    pub async fn len(&self) -> usize {
        self.state.lock().await.methods.len()
    }

    /// Returns `true` if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn enter(&self, counter: &AtomicUsize) -> Result<(), GatewayError> {
        counter.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        match self.state.lock().await.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn render(&self, method: &StoredMethod) -> ResponseEnvelope {
        let mut attributes = method.attributes.clone();
        attributes.remove(keys::OIDC_CLIENT_SECRET);

        match method.method_type {
            MethodType::Password => {
                attributes
                    .entry(keys::MIN_LOGIN_NAME_LENGTH)
                    .or_insert_with(|| Value::from(keys::DEFAULT_MIN_LOGIN_NAME_LENGTH));
                attributes
                    .entry(keys::MIN_PASSWORD_LENGTH)
                    .or_insert_with(|| Value::from(keys::DEFAULT_MIN_PASSWORD_LENGTH));
            }
            MethodType::Oidc => self.render_oidc(method, &mut attributes),
        }

        ResponseEnvelope {
            id: method.id.clone(),
            version: method.version,
            method_type: method.method_type.as_str().to_string(),
            scope_id: method.scope_id.clone(),
            name: method.name.clone(),
            description: method.description.clone(),
            attributes,
        }
    }

    fn render_oidc(&self, method: &StoredMethod, attributes: &mut Map<String, Value>) {
        let text = |key: &str| attributes.get(key).and_then(Value::as_str).map(str::to_string);
        let issuer = text(keys::OIDC_ISSUER);
        let client_id = text(keys::OIDC_CLIENT_ID);
        let api_url_prefix = text(keys::OIDC_API_URL_PREFIX);

        let configured = issuer.is_some() && client_id.is_some() && method.client_secret.is_some();
        let state = if configured { "active-private" } else { "inactive" };
        let hmac = method
            .client_secret
            .as_deref()
            .map(|secret| secret_digest(&method.id, secret))
            .unwrap_or_default();

        if let Some(discovery) = issuer.as_deref().and_then(discovery_url) {
            attributes.insert(keys::OIDC_DISCOVERY_URL.to_string(), Value::from(discovery));
        }
        if let Some(prefix) = api_url_prefix {
            let callback = format!(
                "{}/v1/auth-methods/oidc:authenticate:callback",
                prefix.trim_end_matches('/')
            );
            attributes.insert(keys::OIDC_CALLBACK_URL.to_string(), Value::from(callback));
        }

        attributes.insert(keys::OIDC_STATE.to_string(), Value::from(state));
        attributes.insert(keys::OIDC_ISSUER.to_string(), Value::from(issuer.unwrap_or_default()));
        attributes.insert(
            keys::OIDC_CLIENT_ID.to_string(),
            Value::from(client_id.unwrap_or_default()),
        );
        attributes.insert(keys::OIDC_CLIENT_SECRET_HMAC.to_string(), Value::from(hmac));

        if self.inject_whitespace {
            for key in [keys::OIDC_CA_CERTIFICATES, keys::OIDC_ALLOWED_AUDIENCES] {
                if let Some(Value::Array(items)) = attributes.get_mut(key) {
                    for item in items.iter_mut() {
                        if let Value::String(s) = item {
                            s.push('\n');
                        }
                    }
                }
            }
        }
    }
}

/// Derives the discovery document location from an issuer.
fn discovery_url(issuer: &str) -> Option<String> {
    let mut url = Url::parse(issuer).ok()?;
    let path = url.path().trim_end_matches('/').to_string();
    url.set_path(&format!("{path}/.well-known/openid-configuration"));
    Some(url.to_string())
}

fn secret_digest(id: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(id.as_bytes());
    hasher.update(b":");
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Applies a request body to a stored method. `null` resets a field.
fn apply_body(method: &mut StoredMethod, body: &Value) -> Result<(), GatewayError> {
    let Some(body) = body.as_object() else {
        return Err(GatewayError::rejected(
            400,
            Some("InvalidArgument".to_string()),
            "body must be an object",
        ));
    };

    for (key, target) in [
        (keys::NAME, &mut method.name),
        (keys::DESCRIPTION, &mut method.description),
    ] {
        match body.get(key) {
            None => {}
            Some(Value::Null) => *target = None,
            Some(Value::String(s)) => *target = Some(s.clone()),
            Some(_) => {
                return Err(GatewayError::rejected(
                    400,
                    Some("InvalidArgument".to_string()),
                    format!("{key} must be a string"),
                ));
            }
        }
    }

    let Some(attributes) = body.get(keys::ATTRIBUTES).and_then(Value::as_object) else {
        return Ok(());
    };

    let allowed = method.method_type.attribute_keys();
    for (key, value) in attributes {
        if !allowed.contains(&key.as_str()) {
            return Err(GatewayError::rejected(
                400,
                Some("InvalidArgument".to_string()),
                format!("unknown attribute {key} for {} auth method", method.method_type),
            ));
        }
        if key == keys::OIDC_CLIENT_SECRET {
            method.client_secret = value.as_str().map(str::to_string);
            continue;
        }
        if value.is_null() {
            method.attributes.remove(key);
        } else {
            method.attributes.insert(key.clone(), value.clone());
        }
    }
    Ok(())
}

#[async_trait]
impl AuthMethodGateway for MemoryGateway {
    async fn create(
        &self,
        request: &CreateRequest,
    ) -> Result<Option<ResponseEnvelope>, GatewayError> {
        self.enter(&self.counters.create).await?;
        let mut state = self.state.lock().await;

        state.next_id += 1;
        let prefix = match request.method_type {
            MethodType::Password => "ampw",
            MethodType::Oidc => "amoidc",
        };
        let mut method = StoredMethod {
            id: format!("{prefix}_{}", state.next_id),
            version: 1,
            method_type: request.method_type,
            scope_id: request.scope_id.clone(),
            name: None,
            description: None,
            attributes: Map::new(),
            client_secret: None,
        };
        apply_body(&mut method, &request.to_body())?;

        let rendered = self.render(&method);
        state.methods.insert(method.id.clone(), method);
        if std::mem::take(&mut state.empty_next) {
            return Ok(None);
        }
        Ok(Some(rendered))
    }

    async fn read(&self, id: &str) -> Result<Lookup<ResponseEnvelope>, GatewayError> {
        self.enter(&self.counters.read).await?;
        let state = self.state.lock().await;
        Ok(match state.methods.get(id) {
            Some(method) => Lookup::Found(self.render(method)),
            None => Lookup::NotFound,
        })
    }

    async fn update(
        &self,
        request: &UpdateRequest,
    ) -> Result<Lookup<Option<ResponseEnvelope>>, GatewayError> {
        self.enter(&self.counters.update).await?;
        let mut state = self.state.lock().await;
        state.updates.push(request.clone());

        let Some(current) = state.methods.get(&request.id) else {
            return Ok(Lookup::NotFound);
        };
        if let VersionToken::Exact(version) = request.version
            && version != current.version
        {
            return Err(GatewayError::rejected(
                409,
                Some("FailedPrecondition".to_string()),
                format!(
                    "Version mismatch: supplied {version}, current {}.",
                    current.version
                ),
            ));
        }

        let mut updated = current.clone();
        apply_body(&mut updated, &request.to_body())?;
        updated.version += 1;

        let rendered = self.render(&updated);
        state.methods.insert(updated.id.clone(), updated);
        if std::mem::take(&mut state.empty_next) {
            return Ok(Lookup::Found(None));
        }
        Ok(Lookup::Found(Some(rendered)))
    }

    async fn delete(&self, id: &str) -> Result<Lookup<()>, GatewayError> {
        self.enter(&self.counters.delete).await?;
        Ok(match self.state.lock().await.methods.remove(id) {
            Some(_) => Lookup::Found(()),
            None => Lookup::NotFound,
        })
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
