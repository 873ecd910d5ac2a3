//! Server configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default bind address (localhost:3000).
pub const DEFAULT_BIND_ADDRESS: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V4(Ipv4Addr::LOCALHOST),
    3000,
);

/// Default PIN attempts per client address per window.
pub const DEFAULT_MAX_PIN_ATTEMPTS: u32 = 5;

/// Default PIN attempt window (15 minutes).
pub const DEFAULT_PIN_ATTEMPT_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Default max body size for REST requests (64 KB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 64 * 1024;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind_address: SocketAddr,

    /// Enable the global API rate limit.
    pub rate_limiting: bool,

    /// Rate limit: requests per minute across all API endpoints.
    pub api_rpm: u32,

    /// Enable request logging.
    pub request_logging: bool,

    /// Take the client address from the first `X-Forwarded-For` hop.
    /// Only enable behind a reverse proxy that sets the header.
    pub trust_proxy: bool,

    /// CORS allowed origins (empty = no CORS).
    pub cors_origins: Vec<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Security settings
    // ─────────────────────────────────────────────────────────────────────────
    /// PIN attempts allowed per client address within `pin_attempt_window`.
    /// Always enforced, independent of `rate_limiting`.
    pub max_pin_attempts: u32,

    /// Window over which `max_pin_attempts` is counted.
    pub pin_attempt_window: Duration,

    /// Maximum REST request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS,
            rate_limiting: true,
            api_rpm: 120,
            request_logging: true,
            trust_proxy: false,
            cors_origins: Vec::new(),
            max_pin_attempts: DEFAULT_MAX_PIN_ATTEMPTS,
            pin_attempt_window: DEFAULT_PIN_ATTEMPT_WINDOW,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

impl ServerConfig {
    /// Create a new server config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bind address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Enable or disable the global API rate limit.
    pub fn with_rate_limiting(mut self, enabled: bool) -> Self {
        self.rate_limiting = enabled;
        self
    }

    /// Set the API rate limit (requests per minute).
    pub fn with_api_rpm(mut self, rpm: u32) -> Self {
        self.api_rpm = rpm;
        self
    }

    /// Enable or disable request logging.
    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.request_logging = enabled;
        self
    }

    /// Trust `X-Forwarded-For` for the client address.
    pub fn with_trust_proxy(mut self, trust: bool) -> Self {
        self.trust_proxy = trust;
        self
    }

    /// Set CORS allowed origins.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    /// Set the PIN attempt quota and window.
    pub fn with_pin_attempts(mut self, max_attempts: u32, window: Duration) -> Self {
        self.max_pin_attempts = max_attempts;
        self.pin_attempt_window = window;
        self
    }

    /// Set the maximum REST request body size.
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address.to_string(), "127.0.0.1:3000");
        assert_eq!(config.max_pin_attempts, 5);
        assert_eq!(config.pin_attempt_window, Duration::from_secs(900));
        assert!(!config.trust_proxy);
    }

    #[test]
    fn test_builder() {
        let config = ServerConfig::new()
            .with_bind_address("0.0.0.0:9000".parse().unwrap())
            .with_rate_limiting(false)
            .with_request_logging(false)
            .with_trust_proxy(true)
            .with_pin_attempts(3, Duration::from_secs(60));

        assert_eq!(config.bind_address.port(), 9000);
        assert!(!config.rate_limiting);
        assert!(!config.request_logging);
        assert!(config.trust_proxy);
        assert_eq!(config.max_pin_attempts, 3);
        assert_eq!(config.pin_attempt_window, Duration::from_secs(60));
    }
}
