//! # authsync-core
//!
//! Data model and attribute codec for auth method reconciliation.
//!
//! ## Overview
//!
//! An auth method is either password based or OIDC based, and the two carry
//! incompatible attribute schemas. This crate provides:
//!
//! - [`AuthMethodRecord`] and the [`AuthMethodAttributes`] sum type
//! - [`AuthMethodOption`]: typed create/update options and their wire form
//! - [`codec`]: translation between configuration, typed attributes and the
//!   remote service's attribute map
//! - [`fields`]: the descriptor table that drives update diffing
//!
//! Nothing in here performs I/O.
//!
//! ## Example
//!
//! ```ignore
//! use authsync_core::{AuthMethodRecord, codec};
//! use serde_json::json;
//!
//! let config = json!({"type": "password", "scope_id": "global"});
//! let record = AuthMethodRecord::from_config(config.as_object().unwrap())?;
//! assert!(codec::encode(&record.attributes).is_empty());
//! ```

pub mod codec;
mod error;
pub mod fields;
pub mod keys;
mod options;
mod types;

pub use error::CodecError;
pub use fields::{Comparison, FieldDescriptor, descriptors_for};
pub use options::{AuthMethodOption, Field, FieldValue, options_to_body};
pub use types::{
    AuthMethodAttributes, AuthMethodRecord, ConfigMap, MethodType, OidcAttributes,
    PasswordAttributes, config_bool, config_list, config_str, config_u32,
};
