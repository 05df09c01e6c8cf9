//! Reconciler configuration.

use crate::version::VersionPolicy;

/// Configuration for [`crate::Reconciler`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// How updates obtain their version token (default: automatic).
    pub version_policy: VersionPolicy,
}

impl ReconcilerConfig {
    /// Sets the version policy.
    #[must_use]
    pub fn with_version_policy(mut self, policy: VersionPolicy) -> Self {
        self.version_policy = policy;
        self
    }
}
