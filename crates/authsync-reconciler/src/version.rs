//! Version guard.
//!
//! The remote service bumps an auth method's version on every write. A
//! version cached at read time goes stale as soon as somebody else writes,
//! so updates never send the cached value: they either let the service
//! resolve the version or fetch the authoritative one right before writing.

use authsync_gateway::{AuthMethodGateway, Lookup, VersionToken};

use crate::error::ReconcileError;

/// How update requests obtain their version token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VersionPolicy {
    /// Ask the service to resolve the current version. No extra round trip.
    #[default]
    Automatic,
    /// Read the current version right before writing and send it exactly.
    /// A concurrent write in between fails the update with a conflict.
    ReadBeforeWrite,
}

/// Resolves the version token for an update.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionGuard {
    policy: VersionPolicy,
}

impl VersionGuard {
    #[must_use]
    pub fn new(policy: VersionPolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub fn policy(&self) -> VersionPolicy {
        self.policy
    }

    /// Returns the token to send with an update of `id`.
    ///
    /// `cached` is the version the caller last observed; it is only used to
    /// report drift.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the method vanished, or the gateway error of the
    /// read.
    pub async fn resolve(
        &self,
        gateway: &dyn AuthMethodGateway,
        id: &str,
        cached: Option<u32>,
    ) -> Result<VersionToken, ReconcileError> {
        match self.policy {
            VersionPolicy::Automatic => Ok(VersionToken::Automatic),
            VersionPolicy::ReadBeforeWrite => {
                let current = match gateway.read(id).await? {
                    Lookup::Found(envelope) => envelope.version,
                    Lookup::NotFound => return Err(ReconcileError::NotFound(id.to_string())),
                };
                if let Some(cached) = cached
                    && cached != current
                {
                    tracing::warn!(
                        id,
                        cached,
                        current,
                        "auth method version drifted since last read"
                    );
                }
                Ok(VersionToken::Exact(current))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authsync_core::MethodType;
    use authsync_gateway::{CreateRequest, MemoryGateway};

    async fn seeded() -> (MemoryGateway, String) {
        let gateway = MemoryGateway::new();
        let created = gateway
            .create(&CreateRequest {
                method_type: MethodType::Password,
                scope_id: "global".to_string(),
                options: vec![],
            })
            .await
            .unwrap()
            .unwrap();
        (gateway, created.id)
    }

    #[test]
    fn test_automatic_needs_no_read() {
        tokio_test::block_on(async {
            let (gateway, id) = seeded().await;
            let token = VersionGuard::default()
                .resolve(&gateway, &id, Some(1))
                .await
                .unwrap();
            assert_eq!(token, VersionToken::Automatic);
            assert_eq!(gateway.calls().read, 0);
        });
    }

    #[test]
    fn test_read_before_write_uses_current_version() {
        tokio_test::block_on(async {
            let (gateway, id) = seeded().await;
            gateway.bump_version(&id).await;
            gateway.bump_version(&id).await;

            let guard = VersionGuard::new(VersionPolicy::ReadBeforeWrite);
            let token = guard.resolve(&gateway, &id, Some(1)).await.unwrap();
            assert_eq!(token, VersionToken::Exact(3));
            assert_eq!(gateway.calls().read, 1);
        });
    }

    #[test]
    fn test_read_before_write_vanished() {
        tokio_test::block_on(async {
            let (gateway, id) = seeded().await;
            gateway.remove(&id).await;

            let guard = VersionGuard::new(VersionPolicy::ReadBeforeWrite);
            let err = guard.resolve(&gateway, &id, Some(1)).await.unwrap_err();
            assert_eq!(err, ReconcileError::NotFound(id));
        });
    }
}
