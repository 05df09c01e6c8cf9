//! Configuration and wire keys.
//!
//! The flat configuration map, the local state written back to the host, and
//! the remote service's JSON documents all use the same snake_case keys.

pub const ID: &str = "id";
pub const NAME: &str = "name";
pub const DESCRIPTION: &str = "description";
pub const SCOPE_ID: &str = "scope_id";
pub const TYPE: &str = "type";
pub const VERSION: &str = "version";
pub const ATTRIBUTES: &str = "attributes";

// Password auth method
pub const MIN_LOGIN_NAME_LENGTH: &str = "min_login_name_length";
pub const MIN_PASSWORD_LENGTH: &str = "min_password_length";

/// Server default for `min_login_name_length`.
pub const DEFAULT_MIN_LOGIN_NAME_LENGTH: u32 = 3;
/// Server default for `min_password_length`.
pub const DEFAULT_MIN_PASSWORD_LENGTH: u32 = 8;

// OIDC auth method
pub const OIDC_STATE: &str = "state";
pub const OIDC_ISSUER: &str = "issuer";
pub const OIDC_DISCOVERY_URL: &str = "discovery_url";
pub const OIDC_CLIENT_ID: &str = "client_id";
pub const OIDC_CLIENT_SECRET: &str = "client_secret";
pub const OIDC_CLIENT_SECRET_HMAC: &str = "client_secret_hmac";
pub const OIDC_MAX_AGE: &str = "max_age";
pub const OIDC_SIGNING_ALGORITHMS: &str = "signing_algorithms";
pub const OIDC_API_URL_PREFIX: &str = "api_url_prefix";
pub const OIDC_CALLBACK_URL: &str = "callback_url";
pub const OIDC_CA_CERTIFICATES: &str = "idp_ca_certs";
pub const OIDC_ALLOWED_AUDIENCES: &str = "allowed_audiences";
pub const OIDC_DISABLE_DISCOVERED_CONFIG_VALIDATION: &str = "disable_discovered_config_validation";

/// Keys of the password variant, in schema order.
pub const PASSWORD_KEYS: &[&str] = &[MIN_LOGIN_NAME_LENGTH, MIN_PASSWORD_LENGTH];

/// Keys of the OIDC variant, in schema order.
pub const OIDC_KEYS: &[&str] = &[
    OIDC_STATE,
    OIDC_ISSUER,
    OIDC_DISCOVERY_URL,
    OIDC_CLIENT_ID,
    OIDC_CLIENT_SECRET,
    OIDC_CLIENT_SECRET_HMAC,
    OIDC_MAX_AGE,
    OIDC_SIGNING_ALGORITHMS,
    OIDC_API_URL_PREFIX,
    OIDC_CALLBACK_URL,
    OIDC_CA_CERTIFICATES,
    OIDC_ALLOWED_AUDIENCES,
    OIDC_DISABLE_DISCOVERED_CONFIG_VALIDATION,
];

/// Top-level keys shared by every auth method type.
pub const COMMON_KEYS: &[&str] = &[NAME, DESCRIPTION, SCOPE_ID, TYPE];
