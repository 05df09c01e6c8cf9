//! The gateway trait every remote backend implements.

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::types::{CreateRequest, Lookup, ResponseEnvelope, UpdateRequest};

/// Create/read/update/delete access to remote auth methods.
///
/// Each call is a single request to the remote service. Implementations do
/// not retry; retry policy belongs to whoever drives the gateway.
///
/// # Example
///
/// ```ignore
/// use authsync_gateway::{AuthMethodGateway, Lookup};
///
/// async fn exists(gateway: &dyn AuthMethodGateway, id: &str) -> Result<bool, GatewayError> {
///     Ok(!gateway.read(id).await?.is_not_found())
/// }
/// ```
#[async_trait]
pub trait AuthMethodGateway: Send + Sync {
    /// Creates an auth method.
    ///
    /// Returns `None` if the service acknowledged the request without a
    /// body, which breaks the service contract; callers decide how to treat it.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Rejected` if the service refuses the request
    /// (including an unknown scope) and `GatewayError::Transport` if it
    /// cannot be reached.
    async fn create(
        &self,
        request: &CreateRequest,
    ) -> Result<Option<ResponseEnvelope>, GatewayError>;

    /// Reads an auth method by id.
    ///
    /// # Errors
    ///
    /// Returns an error for anything other than success or "not found".
    async fn read(&self, id: &str) -> Result<Lookup<ResponseEnvelope>, GatewayError>;

    /// Applies update options to an auth method.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Rejected` with status 409 if an exact version
    /// no longer matches.
    async fn update(
        &self,
        request: &UpdateRequest,
    ) -> Result<Lookup<Option<ResponseEnvelope>>, GatewayError>;

    /// Deletes an auth method.
    ///
    /// # Errors
    ///
    /// Returns an error for anything other than success or "not found".
    async fn delete(&self, id: &str) -> Result<Lookup<()>, GatewayError>;

    /// Returns the name of this backend for logging.
    fn backend_name(&self) -> &'static str;
}
