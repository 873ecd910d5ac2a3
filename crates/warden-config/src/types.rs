//! Configuration types mapping to the TOML schema.
//!
//! Top-level config:
//! ```toml
//! [server]     # bind address, rate limits, request logging
//! [auth]       # PIN hash, salt, token lifetime, attempt quota
//! [logging]    # log file settings
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default port for the HTTP server.
pub const DEFAULT_PORT: u16 = 3000;

/// Default bind address.
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Default global API budget, requests per minute.
pub const DEFAULT_API_RPM: u32 = 120;

/// Default session lifetime in milliseconds (8 hours).
pub const DEFAULT_TOKEN_TTL_MS: u64 = 8 * 60 * 60 * 1000;

/// Default sweep interval in milliseconds (1 minute).
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 60 * 1000;

/// Default PIN attempts allowed per address per window.
pub const DEFAULT_MAX_PIN_ATTEMPTS: u32 = 5;

/// Default PIN attempt window in seconds (15 minutes).
pub const DEFAULT_PIN_WINDOW_SECS: u64 = 15 * 60;

/// Environment variable overriding `auth.token_ttl_ms`.
pub const TOKEN_TTL_ENV: &str = "WARDEN_TOKEN_TTL_MS";

/// Environment variable overriding `server.port`.
pub const PORT_ENV: &str = "WARDEN_PORT";

/// Environment variable overriding `server.bind`.
pub const BIND_ENV: &str = "WARDEN_BIND";

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    /// HTTP server configuration.
    pub server: Option<ServerConfig>,

    /// Supervisor authentication configuration.
    pub auth: Option<AuthConfig>,

    /// Log output configuration.
    pub logging: Option<LoggingConfig>,
}

impl WardenConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: WardenConfig) {
        if other.server.is_some() {
            self.server = other.server;
        }

        if other.auth.is_some() {
            self.auth = other.auth;
        }

        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    /// Server section, or defaults if absent.
    pub fn server_or_default(&self) -> ServerConfig {
        self.server.clone().unwrap_or_default()
    }

    /// Auth section, or defaults if absent.
    pub fn auth_or_default(&self) -> AuthConfig {
        self.auth.clone().unwrap_or_default()
    }

    /// Logging section, or defaults if absent.
    pub fn logging_or_default(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }

    /// Apply scalar overrides from the process environment.
    ///
    /// Returns warnings for values that could not be parsed.
    pub fn apply_env_overrides(&mut self) -> Vec<String> {
        self.apply_env_overrides_with(|name| std::env::var(name).ok())
    }

    /// Apply scalar overrides using a custom variable lookup.
    pub fn apply_env_overrides_with<F>(&mut self, lookup: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut warnings = Vec::new();

        if let Some(raw) = lookup(TOKEN_TTL_ENV).filter(|v| !v.is_empty()) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => self.auth.get_or_insert_with(AuthConfig::default).token_ttl_ms = ms,
                Err(_) => warnings.push(format!("Ignoring {TOKEN_TTL_ENV}={raw}: not a number")),
            }
        }

        if let Some(raw) = lookup(PORT_ENV).filter(|v| !v.is_empty()) {
            match raw.trim().parse::<u16>() {
                Ok(port) => self.server.get_or_insert_with(ServerConfig::default).port = port,
                Err(_) => warnings.push(format!("Ignoring {PORT_ENV}={raw}: not a valid port")),
            }
        }

        if let Some(bind) = lookup(BIND_ENV).filter(|v| !v.is_empty()) {
            self.server.get_or_insert_with(ServerConfig::default).bind = bind;
        }

        warnings
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Server Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Address to bind to.
    pub bind: String,
    /// Enable the global API rate limit.
    pub rate_limiting: bool,
    /// Global API rate limit: requests per minute.
    pub api_rpm: u32,
    /// Enable request logging.
    pub request_logging: bool,
    /// Take the client address from `X-Forwarded-For` (behind a reverse proxy).
    pub trust_proxy: bool,
    /// CORS allowed origins (empty = no CORS).
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            rate_limiting: true,
            api_rpm: DEFAULT_API_RPM,
            request_logging: true,
            trust_proxy: false,
            cors_origins: Vec::new(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Supervisor authentication section.
///
/// Either `pin_hash` (preferred) or `pin` must be resolvable, together with
/// `salt`. See [`crate::secrets`] for the resolution order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Hex SHA-256 of `pin || salt`.
    pub pin_hash: Option<String>,
    /// Raw PIN, hashed at startup. Not recommended in files.
    pub pin: Option<String>,
    /// Salt mixed into the PIN hash.
    pub salt: Option<String>,
    /// Session lifetime in milliseconds.
    pub token_ttl_ms: u64,
    /// Interval between expiry sweeps in milliseconds.
    pub sweep_interval_ms: u64,
    /// PIN attempts allowed per client address per window.
    pub max_pin_attempts: u32,
    /// Length of the PIN attempt window in seconds.
    pub pin_window_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            pin_hash: None,
            pin: None,
            salt: None,
            token_ttl_ms: DEFAULT_TOKEN_TTL_MS,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
            max_pin_attempts: DEFAULT_MAX_PIN_ATTEMPTS,
            pin_window_secs: DEFAULT_PIN_WINDOW_SECS,
        }
    }
}

impl AuthConfig {
    /// Whether the section carries a raw PIN.
    pub fn has_plaintext_pin(&self) -> bool {
        self.pin.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Session lifetime.
    pub fn token_ttl(&self) -> Duration {
        Duration::from_millis(self.token_ttl_ms)
    }

    /// Sweep interval.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// PIN attempt window.
    pub fn pin_window(&self) -> Duration {
        Duration::from_secs(self.pin_window_secs)
    }

    /// Check numeric settings that must be positive.
    pub fn validate(&self) -> crate::Result<()> {
        let checks = [
            ("auth.token_ttl_ms", self.token_ttl_ms == 0),
            ("auth.sweep_interval_ms", self.sweep_interval_ms == 0),
            ("auth.max_pin_attempts", self.max_pin_attempts == 0),
            ("auth.pin_window_secs", self.pin_window_secs == 0),
        ];

        for (field, is_zero) in checks {
            if is_zero {
                return Err(crate::ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Write a rolling JSON log file in addition to the console.
    pub file: bool,
    /// Directory for log files (default: `<config dir>/logs`).
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: true,
            dir: None,
        }
    }
}
