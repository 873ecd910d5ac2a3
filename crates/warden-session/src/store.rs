//! Session token store with lazy expiry and a background sweep.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::TryRngCore;
use rand::rngs::OsRng;
use tracing::{debug, info, trace};

use crate::clock::{SharedClock, SystemClock};
use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::session::{IssuedToken, Session, Validation};
use crate::sweeper::SweeperHandle;

/// Random bytes per token (256 bits of entropy, 64 hex chars).
pub const TOKEN_BYTES: usize = 32;

/// State shared between store handles and the sweep task.
pub(crate) struct StoreInner {
    /// Live (and not yet swept) sessions keyed by token.
    sessions: Mutex<HashMap<String, Session>>,

    /// Time source for issuance and expiry checks.
    clock: SharedClock,

    config: StoreConfig,

    /// Running sweep task, if started.
    sweeper: Mutex<Option<SweeperHandle>>,
}

impl StoreInner {
    /// Remove every session with `now >= expires_at`.
    pub(crate) fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now));
        let removed = before - sessions.len();

        if removed > 0 {
            debug!(
                removed,
                remaining = sessions.len(),
                "Swept expired sessions"
            );
        } else {
            trace!(remaining = sessions.len(), "Sweep found nothing to remove");
        }

        removed
    }
}

/// In-memory map from bearer tokens to supervisor sessions.
///
/// The store is a cheap handle around shared state: clone it into the HTTP
/// layer, the sweep task, and tests. Every operation takes the lock once and
/// never suspends while holding it, so a `validate` after an `issue` or
/// `revoke` always observes the new state.
///
/// Expired sessions are treated as absent by [`validate`](Self::validate)
/// whether or not the sweep has run; the sweep only bounds memory.
#[derive(Clone)]
pub struct SessionTokenStore {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for SessionTokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokenStore")
            .field("sessions", &self.len())
            .field("config", &self.inner.config)
            .field("running", &self.is_running())
            .finish()
    }
}

impl SessionTokenStore {
    /// Create a store that reads the system clock.
    pub fn new(config: StoreConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a store with an explicit time source.
    pub fn with_clock(config: StoreConfig, clock: SharedClock) -> Self {
        let inner = StoreInner {
            sessions: Mutex::new(HashMap::new()),
            clock,
            config,
            sweeper: Mutex::new(None),
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Get the store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Session lifetime.
    pub fn ttl(&self) -> Duration {
        self.inner.config.ttl
    }

    /// Current time according to the store's clock.
    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.inner.clock.now()
    }

    /// Number of stored sessions, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.inner.sessions.lock().len()
    }

    /// Check if the store holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.inner.sessions.lock().is_empty()
    }

    /// Issue a new session for a caller that already proved the PIN.
    ///
    /// Fails only if the OS random source fails or the TTL cannot be added
    /// to the current time; there is no weaker fallback.
    pub fn issue(&self, origin: IpAddr) -> Result<IssuedToken> {
        let ttl = chrono::Duration::from_std(self.inner.config.ttl)
            .map_err(|e| Error::Config(format!("token TTL out of range: {e}")))?;
        let issued_at = self.inner.clock.now();
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .ok_or_else(|| Error::Config("token expiry overflows the calendar".into()))?;
        if expires_at <= issued_at {
            return Err(Error::Config("token TTL must be positive".into()));
        }

        let mut sessions = self.inner.sessions.lock();
        let token = loop {
            let candidate = generate_token()?;
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
        };

        sessions.insert(
            token.clone(),
            Session {
                token: token.clone(),
                issued_at,
                expires_at,
                origin_address: origin,
            },
        );

        debug!(
            token = %fingerprint(&token),
            origin = %origin,
            expires_at = %expires_at,
            active = sessions.len(),
            "Session issued"
        );

        Ok(IssuedToken { token, expires_at })
    }

    /// Check a token, deleting it on the spot if it has expired.
    pub fn validate(&self, token: &str) -> Validation {
        let now = self.inner.clock.now();
        let mut sessions = self.inner.sessions.lock();

        let expired = match sessions.get(token) {
            None => return Validation::Invalid,
            Some(session) => session.is_expired_at(now),
        };

        if expired {
            sessions.remove(token);
            debug!(token = %fingerprint(token), "Session expired, removed on access");
            return Validation::Invalid;
        }

        match sessions.get(token) {
            Some(session) => Validation::Valid(session.clone()),
            None => Validation::Invalid,
        }
    }

    /// Delete a session. Unknown tokens are ignored.
    pub fn revoke(&self, token: &str) {
        if self.inner.sessions.lock().remove(token).is_some() {
            debug!(token = %fingerprint(token), "Session revoked");
        }
    }

    /// Remove all expired sessions and return how many were removed.
    ///
    /// Runs automatically once the store is [`start`](Self::start)ed, but can
    /// also be called directly.
    pub fn sweep(&self) -> usize {
        self.inner.sweep()
    }

    /// Start the background sweep task on the current tokio runtime.
    ///
    /// Calling `start` on a running store is a no-op.
    pub fn start(&self) -> Result<()> {
        let mut sweeper = self.inner.sweeper.lock();
        if sweeper.as_ref().is_some_and(|s| !s.is_finished()) {
            return Ok(());
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::Config(format!("sweep task needs a tokio runtime: {e}")))?;
        let handle = SweeperHandle::spawn(
            &runtime,
            Arc::downgrade(&self.inner),
            self.inner.config.sweep_interval,
        );
        *sweeper = Some(handle);

        info!(
            interval_ms = self.inner.config.sweep_interval.as_millis() as u64,
            ttl_ms = self.inner.config.ttl.as_millis() as u64,
            "Session sweep started"
        );
        Ok(())
    }

    /// Stop the background sweep task. No-op if it is not running.
    pub fn stop(&self) {
        if let Some(handle) = self.inner.sweeper.lock().take() {
            handle.cancel();
            info!("Session sweep stopped");
        }
    }

    /// Whether the background sweep task is running.
    pub fn is_running(&self) -> bool {
        self.inner
            .sweeper
            .lock()
            .as_ref()
            .is_some_and(|s| !s.is_finished())
    }
}

/// Draw a fresh token from the OS random source.
fn generate_token() -> Result<String> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| Error::RandomSource(e.to_string()))?;
    Ok(hex::encode(bytes))
}

/// Short, non-secret prefix of a token for log lines.
pub(crate) fn fingerprint(token: &str) -> &str {
    token.get(..8).unwrap_or("<short>")
}
