//! PIN check that gates token issuance.

use std::net::IpAddr;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::pin::PinVerifier;
use crate::session::{IssuedToken, Validation};
use crate::store::SessionTokenStore;

/// Verifies supervisor PINs and issues sessions from the shared store.
///
/// Brute-force protection is not done here: the HTTP layer must rate-limit
/// attempts per address before calling [`verify_pin`](Self::verify_pin).
#[derive(Debug, Clone)]
pub struct Authenticator {
    verifier: PinVerifier,
    store: SessionTokenStore,
}

impl Authenticator {
    pub fn new(verifier: PinVerifier, store: SessionTokenStore) -> Self {
        Self { verifier, store }
    }

    /// Get the underlying token store.
    pub fn store(&self) -> &SessionTokenStore {
        &self.store
    }

    /// Check a PIN and, on a match, issue a session for `origin`.
    ///
    /// Mismatches are logged with the requesting address; malformed input
    /// is not treated as a security event.
    pub fn verify_pin(&self, pin: &str, origin: IpAddr) -> Result<IssuedToken> {
        match self.verifier.verify(pin) {
            Ok(()) => self.store.issue(origin),
            Err(Error::InvalidFormat) => {
                debug!(origin = %origin, "Rejected malformed PIN");
                Err(Error::InvalidFormat)
            }
            Err(Error::InvalidCredential) => {
                warn!(origin = %origin, "Invalid PIN attempt");
                Err(Error::InvalidCredential)
            }
            Err(e) => Err(e),
        }
    }

    /// Validate a bearer token.
    pub fn validate(&self, token: &str) -> Validation {
        self.store.validate(token)
    }

    /// Log out. Always succeeds.
    pub fn logout(&self, token: &str) {
        self.store.revoke(token);
    }
}
