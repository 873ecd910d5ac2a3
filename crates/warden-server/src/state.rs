//! Application state shared across handlers.

use std::sync::Arc;

use warden_session::{Authenticator, SessionTokenStore};

use crate::config::ServerConfig;
use crate::ratelimit::{
    SharedPinRateLimiter, SharedRateLimiter, create_pin_rate_limiter, create_rate_limiter,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// PIN check plus the token store behind it.
    pub auth: Authenticator,

    /// Server configuration.
    pub config: Arc<ServerConfig>,

    /// Per-address limiter for PIN attempts.
    pub pin_limiter: SharedPinRateLimiter,

    /// Global limiter for the rest of the API.
    pub api_limiter: SharedRateLimiter,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Limiters are built from `config` and belong to this state, so two
    /// servers in one process never share quota.
    pub fn new(auth: Authenticator, config: ServerConfig) -> Self {
        let pin_limiter =
            create_pin_rate_limiter(config.max_pin_attempts, config.pin_attempt_window);
        let api_limiter = create_rate_limiter(config.api_rpm);

        Self {
            auth,
            config: Arc::new(config),
            pin_limiter,
            api_limiter,
        }
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the session token store.
    pub fn store(&self) -> &SessionTokenStore {
        self.auth.store()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("store", self.auth.store())
            .finish_non_exhaustive()
    }
}
