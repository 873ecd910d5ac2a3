//! Configuration for the session token store.

use std::time::Duration;

/// Default session lifetime (8 hours).
pub const DEFAULT_TTL: Duration = Duration::from_secs(8 * 60 * 60);

/// Default interval between background sweeps (1 minute).
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Configuration for the session token store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Lifetime of every issued session, measured from issuance.
    pub ttl: Duration,

    /// Interval for the background sweep task.
    pub sweep_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl StoreConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the session lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the session lifetime in milliseconds.
    pub fn with_ttl_ms(self, ttl_ms: u64) -> Self {
        self.with_ttl(Duration::from_millis(ttl_ms))
    }

    /// Set the sweep interval.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Reject configurations that would break session invariants.
    ///
    /// A zero TTL would issue sessions with `expires_at == issued_at`, and a
    /// zero interval would make the sweep task spin.
    pub fn validate(&self) -> crate::Result<()> {
        if self.ttl.is_zero() {
            return Err(crate::Error::Config("token TTL must be positive".into()));
        }
        if chrono::Duration::from_std(self.ttl).is_err() {
            return Err(crate::Error::Config("token TTL is out of range".into()));
        }
        if self.sweep_interval.is_zero() {
            return Err(crate::Error::Config("sweep interval must be positive".into()));
        }
        Ok(())
    }
}
