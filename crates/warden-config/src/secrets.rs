//! PIN credential resolution.
//!
//! Resolution order:
//! 1. `WARDEN_PIN_HASH` environment variable
//! 2. `WARDEN_PIN` environment variable (raw PIN, hashed at startup)
//! 3. `[auth] pin_hash` in the config file
//! 4. `[auth] pin` in the config file (with warning)
//!
//! The salt comes from `WARDEN_PIN_SALT`, then `[auth] salt`.

use crate::types::AuthConfig;
use crate::{ConfigError, Result};

/// Environment variable holding the salted PIN hash.
pub const PIN_HASH_ENV: &str = "WARDEN_PIN_HASH";

/// Environment variable holding a raw PIN.
pub const PIN_ENV: &str = "WARDEN_PIN";

/// Environment variable holding the salt.
pub const PIN_SALT_ENV: &str = "WARDEN_PIN_SALT";

/// The supervisor credential in one of its accepted shapes.
#[derive(Clone, PartialEq, Eq)]
pub enum PinCredential {
    /// Pre-computed hex hash of `pin || salt`.
    Hash { hash: String, salt: String },
    /// Raw PIN to hash locally with `salt`.
    Plain { pin: String, salt: String },
}

impl std::fmt::Debug for PinCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PinCredential::Hash { .. } => write!(f, "PinCredential::Hash(<redacted>)"),
            PinCredential::Plain { .. } => write!(f, "PinCredential::Plain(<redacted>)"),
        }
    }
}

/// Where a secret was resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretSource {
    /// Environment variable.
    EnvVar(String),
    /// Config file (plaintext PIN is not recommended).
    ConfigFile,
}

impl std::fmt::Display for SecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretSource::EnvVar(var) => write!(f, "env var {}", var),
            SecretSource::ConfigFile => write!(f, "config file"),
        }
    }
}

/// Result of credential resolution with provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCredential {
    pub credential: PinCredential,
    pub source: SecretSource,
}

impl ResolvedCredential {
    /// Whether the credential is a raw PIN.
    pub fn is_plaintext(&self) -> bool {
        matches!(self.credential, PinCredential::Plain { .. })
    }
}

/// Resolve the PIN credential from the process environment and `auth`.
pub fn resolve_pin_credential(auth: &AuthConfig) -> Result<ResolvedCredential> {
    resolve_pin_credential_with(auth, |name| std::env::var(name).ok())
}

/// Resolve the PIN credential using a custom variable lookup.
pub fn resolve_pin_credential_with<F>(auth: &AuthConfig, lookup: F) -> Result<ResolvedCredential>
where
    F: Fn(&str) -> Option<String>,
{
    let env = |name: &str| lookup(name).filter(|v| !v.is_empty());

    let salt = env(PIN_SALT_ENV)
        .or_else(|| auth.salt.clone().filter(|s| !s.is_empty()))
        .ok_or_else(|| ConfigError::MissingField {
            field: "salt".to_string(),
            context: format!("[auth] (or set {PIN_SALT_ENV})"),
        })?;

    if let Some(hash) = env(PIN_HASH_ENV) {
        return Ok(ResolvedCredential {
            credential: PinCredential::Hash { hash, salt },
            source: SecretSource::EnvVar(PIN_HASH_ENV.to_string()),
        });
    }

    if let Some(pin) = env(PIN_ENV) {
        return Ok(ResolvedCredential {
            credential: PinCredential::Plain { pin, salt },
            source: SecretSource::EnvVar(PIN_ENV.to_string()),
        });
    }

    if let Some(hash) = auth.pin_hash.clone().filter(|h| !h.is_empty()) {
        return Ok(ResolvedCredential {
            credential: PinCredential::Hash { hash, salt },
            source: SecretSource::ConfigFile,
        });
    }

    if let Some(pin) = auth.pin.clone().filter(|p| !p.is_empty()) {
        return Ok(ResolvedCredential {
            credential: PinCredential::Plain { pin, salt },
            source: SecretSource::ConfigFile,
        });
    }

    Err(ConfigError::PinNotFound {
        hash_var: PIN_HASH_ENV.to_string(),
        pin_var: PIN_ENV.to_string(),
    })
}
