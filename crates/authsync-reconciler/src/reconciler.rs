//! Auth method lifecycle.
//!
//! Each operation performs at most one remote write and never caches state
//! between calls: the caller owns the record and hands it back in.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use authsync_core::{AuthMethodAttributes, AuthMethodRecord, MethodType, codec, keys};
use authsync_gateway::{AuthMethodGateway, CreateRequest, Lookup, ResponseEnvelope, UpdateRequest};

use crate::config::ReconcilerConfig;
use crate::diff::{UpdatePlan, plan_update};
use crate::error::ReconcileError;
use crate::version::VersionGuard;

/// Result of a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The method exists; this is its current state.
    Present(AuthMethodRecord),
    /// The method does not exist remotely. Local state should be cleared.
    Absent,
}

impl ReadOutcome {
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    #[must_use]
    pub fn into_record(self) -> Option<AuthMethodRecord> {
        match self {
            Self::Present(record) => Some(record),
            Self::Absent => None,
        }
    }
}

/// Drives create/read/update/delete of auth methods against a gateway.
#[derive(Clone)]
pub struct Reconciler {
    gateway: Arc<dyn AuthMethodGateway>,
    guard: VersionGuard,
}

impl Reconciler {
    #[must_use]
    pub fn new(gateway: Arc<dyn AuthMethodGateway>, config: ReconcilerConfig) -> Self {
        Self {
            gateway,
            guard: VersionGuard::new(config.version_policy),
        }
    }

    /// Creates the remote counterpart of `desired`.
    ///
    /// The returned record carries the server-assigned id and version and
    /// every server default.
    ///
    /// # Errors
    ///
    /// Returns `MissingRequiredField` before any network call if the scope is
    /// empty, `InvariantViolation` if the service acknowledges without a
    /// body, and gateway or decode failures otherwise.
    #[instrument(
        skip(self, cancel, desired),
        fields(method_type = %desired.method_type(), scope_id = %desired.scope_id)
    )]
    pub async fn create(
        &self,
        cancel: &CancellationToken,
        desired: &AuthMethodRecord,
    ) -> Result<AuthMethodRecord, ReconcileError> {
        if desired.scope_id.is_empty() {
            return Err(ReconcileError::MissingRequiredField(keys::SCOPE_ID.to_string()));
        }

        let request = CreateRequest {
            method_type: desired.method_type(),
            scope_id: desired.scope_id.clone(),
            options: codec::encode_create(desired),
        };
        debug!(
            options = request.options.len(),
            backend = self.gateway.backend_name(),
            "creating auth method"
        );

        let envelope = cancellable(cancel, self.gateway.create(&request))
            .await?
            .ok_or_else(|| {
                ReconcileError::invariant("create returned neither a result nor an error")
            })?;

        let record = record_from_envelope(envelope, Some(desired))?;
        if record.method_type() != desired.method_type() {
            return Err(ReconcileError::invariant(format!(
                "created {} auth method but requested {}",
                record.method_type(),
                desired.method_type()
            )));
        }

        info!(id = %record.id, version = ?record.version, "auth method created");
        Ok(record)
    }

    /// Reads the current state of `id`.
    ///
    /// `previous` supplies what the service never reports (the client
    /// secret) or reports only sometimes. An empty id reads as absent
    /// without a network call.
    ///
    /// # Errors
    ///
    /// Returns `Cancelled` if `cancel` fires, `MalformedResponse` if the
    /// service reports attributes that do not decode, and `RemoteReadFailed`
    /// for any other failure except absence.
    #[instrument(skip(self, cancel, previous))]
    pub async fn read(
        &self,
        cancel: &CancellationToken,
        id: &str,
        previous: Option<&AuthMethodRecord>,
    ) -> Result<ReadOutcome, ReconcileError> {
        if id.is_empty() {
            return Ok(ReadOutcome::Absent);
        }

        let lookup = cancellable(cancel, self.gateway.read(id))
            .await
            .map_err(|e| match e {
                ReconcileError::Cancelled => e,
                other => ReconcileError::read_failed(id, other),
            })?;

        match lookup {
            Lookup::Found(envelope) => {
                let record = record_from_envelope(envelope, previous)?;
                debug!(version = ?record.version, "auth method read");
                Ok(ReadOutcome::Present(record))
            }
            Lookup::NotFound => {
                warn!("auth method no longer exists remotely, clearing local state");
                Ok(ReadOutcome::Absent)
            }
        }
    }

    /// Brings the remote method from `previous` to `desired`.
    ///
    /// Only changed fields are sent. If nothing changed, `previous` is
    /// returned as is and the service is not contacted.
    ///
    /// # Errors
    ///
    /// Returns `ImmutableFieldChanged` before any network call if scope or
    /// type differ, `NotFound` if the method does not exist, and gateway or
    /// decode failures otherwise.
    #[instrument(skip(self, cancel, previous, desired), fields(id = %previous.id))]
    pub async fn update(
        &self,
        cancel: &CancellationToken,
        previous: &AuthMethodRecord,
        desired: &AuthMethodRecord,
    ) -> Result<AuthMethodRecord, ReconcileError> {
        let plan = plan_update(previous, desired)?;
        self.apply(cancel, previous, desired, plan).await
    }

    /// Sends an already computed plan. Hosts that track changes themselves
    /// build the plan with [`crate::diff_fields`].
    ///
    /// # Errors
    ///
    /// Same as [`Reconciler::update`], minus the immutability check.
    pub async fn apply(
        &self,
        cancel: &CancellationToken,
        previous: &AuthMethodRecord,
        desired: &AuthMethodRecord,
        plan: UpdatePlan,
    ) -> Result<AuthMethodRecord, ReconcileError> {
        if !previous.is_created() {
            return Err(ReconcileError::NotFound("(not created)".to_string()));
        }
        if plan.is_empty() {
            debug!("no changes, skipping update");
            return Ok(previous.clone());
        }

        let id = previous.id.as_str();
        let version = cancellable(
            cancel,
            self.guard.resolve(self.gateway.as_ref(), id, previous.version),
        )
        .await?;

        let request = UpdateRequest {
            id: id.to_string(),
            version,
            options: plan.options,
        };
        debug!(
            fields = ?request.options.iter().map(|o| o.field().key()).collect::<Vec<_>>(),
            version = ?request.version,
            "updating auth method"
        );

        let envelope = match cancellable(cancel, self.gateway.update(&request)).await? {
            Lookup::Found(Some(envelope)) => envelope,
            Lookup::Found(None) => {
                return Err(ReconcileError::invariant(
                    "update returned neither a result nor an error",
                ));
            }
            Lookup::NotFound => return Err(ReconcileError::NotFound(id.to_string())),
        };

        let record = record_from_envelope(envelope, Some(desired))?;
        info!(version = ?record.version, "auth method updated");
        Ok(record)
    }

    /// Deletes `id`. Deleting a method that is already gone succeeds.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an empty id and gateway failures otherwise.
    #[instrument(skip(self, cancel))]
    pub async fn delete(&self, cancel: &CancellationToken, id: &str) -> Result<(), ReconcileError> {
        if id.is_empty() {
            return Err(ReconcileError::NotFound("(not created)".to_string()));
        }

        match cancellable(cancel, self.gateway.delete(id)).await? {
            Lookup::Found(()) => info!("auth method deleted"),
            Lookup::NotFound => warn!("auth method already absent"),
        }
        Ok(())
    }
}

/// Runs a gateway call unless `cancel` fires first.
async fn cancellable<T, E>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T, E>>,
) -> Result<T, ReconcileError>
where
    E: Into<ReconcileError>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ReconcileError::Cancelled),
        result = fut => result.map_err(Into::into),
    }
}

/// Converts a response into a record, filling what the service leaves out
/// from `previous`.
fn record_from_envelope(
    envelope: ResponseEnvelope,
    previous: Option<&AuthMethodRecord>,
) -> Result<AuthMethodRecord, ReconcileError> {
    if envelope.id.is_empty() {
        return Err(ReconcileError::invariant("response carries an empty id"));
    }
    let method_type: MethodType = envelope.method_type.parse().map_err(|_| {
        ReconcileError::MalformedResponse(format!(
            "unknown auth method type {:?}",
            envelope.method_type
        ))
    })?;

    let previous_attributes = previous
        .map(|p| p.attributes.clone())
        .unwrap_or_else(|| AuthMethodAttributes::empty(method_type));
    let attributes = codec::decode(method_type, &envelope.attributes, &previous_attributes)?;

    Ok(AuthMethodRecord {
        id: envelope.id,
        name: envelope.name.filter(|s| !s.is_empty()),
        description: envelope.description.filter(|s| !s.is_empty()),
        scope_id: envelope.scope_id,
        version: Some(envelope.version),
        attributes,
    })
}
