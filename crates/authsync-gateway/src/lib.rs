//! # authsync-gateway
//!
//! Access to the remote auth method service.
//!
//! Every backend implements [`AuthMethodGateway`] and normalizes the
//! service's answers into three shapes:
//!
//! - a [`ResponseEnvelope`] on success
//! - [`Lookup::NotFound`] when the addressed method does not exist
//! - a [`GatewayError`] for transport failures and structured rejections
//!
//! Two backends are provided: [`HttpGateway`] for a real deployment and
//! [`MemoryGateway`], an in-process stand-in used by tests and dry runs.

mod config;
mod error;
mod http;
mod memory;
mod traits;
mod types;

pub use config::{DEFAULT_ADDR, GatewayConfig};
pub use error::GatewayError;
pub use http::HttpGateway;
pub use memory::{CallCounts, MemoryGateway};
pub use traits::AuthMethodGateway;
pub use types::{CreateRequest, Lookup, ResponseEnvelope, UpdateRequest, VersionToken};
