//! Configuration for the HTTP gateway.

use std::time::Duration;

/// Default address of the remote auth method service.
pub const DEFAULT_ADDR: &str = "http://127.0.0.1:9200";

/// Configuration for [`crate::HttpGateway`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base address of the service, e.g. `https://auth.example.com`.
    pub addr: String,

    /// Bearer token sent with every request.
    pub token: Option<String>,

    /// Per-request timeout (default: 30 seconds).
    pub request_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            token: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl GatewayConfig {
    /// Creates a configuration pointing at `addr`.
    #[must_use]
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            ..Self::default()
        }
    }

    /// Sets the bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_builders() {
        let config = GatewayConfig::default();
        assert_eq!(config.addr, DEFAULT_ADDR);
        assert_eq!(config.request_timeout, Duration::from_secs(30));

        let config = GatewayConfig::new("https://auth.example.com")
            .with_token("at_123")
            .with_request_timeout(Duration::from_secs(5));
        assert_eq!(config.token.as_deref(), Some("at_123"));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }
}
