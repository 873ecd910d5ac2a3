//! Session records and validation outcomes.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One authenticated supervisor session.
///
/// Sessions are immutable once issued; the only transitions are
/// live -> absent (revoked, lazily expired, or swept).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque bearer token (map key).
    pub token: String,
    /// When the session was issued.
    pub issued_at: DateTime<Utc>,
    /// Instant from which the session is no longer valid.
    pub expires_at: DateTime<Utc>,
    /// Address that authenticated. Informational only.
    pub origin_address: IpAddr,
}

impl Session {
    /// Whether the session has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Time left before expiry, clamped at zero.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> chrono::Duration {
        (self.expires_at - now).max(chrono::Duration::zero())
    }
}

/// Token and expiry handed back to the client after a successful PIN check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Outcome of [`SessionTokenStore::validate`](crate::SessionTokenStore::validate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// The token maps to a live session.
    Valid(Session),
    /// The token is unknown, revoked or expired. The cases are not distinguished.
    Invalid,
}

impl Validation {
    /// Check if the token was valid.
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid(_))
    }

    /// Get the session if the token was valid.
    pub fn session(&self) -> Option<&Session> {
        match self {
            Validation::Valid(session) => Some(session),
            Validation::Invalid => None,
        }
    }

    /// Convert into the session, mapping the invalid case to `Unauthorized`.
    pub fn into_session(self) -> crate::Result<Session> {
        match self {
            Validation::Valid(session) => Ok(session),
            Validation::Invalid => Err(crate::Error::Unauthorized),
        }
    }
}
