//! Salted PIN hashing and verification.
//!
//! The reference PIN is only ever held as `hex(SHA-256(pin || salt))`.
//! Comparison uses constant-time equality to avoid leaking how many bytes
//! of the digest matched.

use rand::TryRngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::{Error, Result};

/// Number of digits in a PIN.
pub const PIN_LENGTH: usize = 4;

/// Random bytes in a generated salt.
const SALT_BYTES: usize = 16;

/// Check that `pin` is exactly four ASCII digits.
pub fn check_pin_format(pin: &str) -> Result<()> {
    if pin.len() == PIN_LENGTH && pin.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(Error::InvalidFormat)
    }
}

/// Hash a PIN with a salt, returning lowercase hex.
pub fn hash_pin(pin: &str, salt: &str) -> String {
    hex::encode(digest(pin, salt))
}

/// Generate a random salt (32 hex chars).
pub fn generate_salt() -> Result<String> {
    let mut bytes = [0u8; SALT_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| Error::RandomSource(e.to_string()))?;
    Ok(hex::encode(bytes))
}

fn digest(pin: &str, salt: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(pin.as_bytes());
    hasher.update(salt.as_bytes());
    hasher.finalize().into()
}

/// Holds the salted reference hash and checks candidate PINs against it.
#[derive(Clone)]
pub struct PinVerifier {
    salt: String,
    reference: [u8; 32],
}

impl std::fmt::Debug for PinVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinVerifier")
            .field("salt", &"<redacted>")
            .field("reference", &"<redacted>")
            .finish()
    }
}

impl PinVerifier {
    /// Build a verifier from a stored hex hash and its salt.
    pub fn from_hash(hash_hex: &str, salt: &str) -> Result<Self> {
        let bytes = hex::decode(hash_hex.trim())
            .map_err(|e| Error::Config(format!("PIN hash is not valid hex: {e}")))?;
        let reference: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            Error::Config(format!(
                "PIN hash must be a 32-byte SHA-256 digest, got {} bytes",
                b.len()
            ))
        })?;

        Ok(Self {
            salt: salt.to_string(),
            reference,
        })
    }

    /// Build a verifier by hashing a raw PIN locally.
    pub fn from_pin(pin: &str, salt: &str) -> Result<Self> {
        check_pin_format(pin)
            .map_err(|_| Error::Config("configured PIN must be exactly 4 digits".into()))?;

        Ok(Self {
            salt: salt.to_string(),
            reference: digest(pin, salt),
        })
    }

    /// Verify a candidate PIN.
    ///
    /// The format is checked before any hashing takes place.
    pub fn verify(&self, candidate: &str) -> Result<()> {
        check_pin_format(candidate)?;

        let computed = digest(candidate, &self.salt);
        if bool::from(computed.ct_eq(&self.reference)) {
            Ok(())
        } else {
            Err(Error::InvalidCredential)
        }
    }
}
