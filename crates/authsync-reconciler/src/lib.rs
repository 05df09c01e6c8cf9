//! # authsync-reconciler
//!
//! Reconciles declared auth methods with the remote service.
//!
//! ## Overview
//!
//! - [`Reconciler`]: create/read/update/delete with cooperative cancellation
//! - [`VersionGuard`]: picks the version token sent with updates
//! - [`plan_update`] / [`diff_fields`]: field-level update planning
//! - [`AuthMethodResource`]: the same lifecycle expressed against a host's
//!   [`ResourceData`], reporting [`Diagnostics`]
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use authsync_gateway::MemoryGateway;
//! use authsync_reconciler::{Reconciler, ReconcilerConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let reconciler = Reconciler::new(Arc::new(MemoryGateway::new()), ReconcilerConfig::default());
//! let created = reconciler.create(&CancellationToken::new(), &desired).await?;
//! ```

mod config;
mod diff;
mod error;
pub mod host;
mod reconciler;
mod version;

pub use config::ReconcilerConfig;
pub use diff::{UpdatePlan, check_immutable, diff_fields, plan_update};
pub use error::{ErrorCategory, ReconcileError};
pub use host::{
    AuthMethodResource, Diagnostic, Diagnostics, HostError, MapResourceData, ResourceData,
    Severity, has_errors,
};
pub use reconciler::{ReadOutcome, Reconciler};
pub use version::{VersionGuard, VersionPolicy};
