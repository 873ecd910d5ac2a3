//! Bearer token sessions for supervisor PIN authentication.
//!
//! This crate provides the in-memory session layer with:
//! - Opaque tokens drawn from the OS random source
//! - Fixed-TTL sessions with lazy expiry on every validation
//! - A cancellable background sweep that bounds memory growth
//! - Salted PIN hashing with constant-time comparison
//!
//! # Example
//!
//! ```rust,ignore
//! use warden_session::{Authenticator, PinVerifier, SessionTokenStore, StoreConfig};
//!
//! let store = SessionTokenStore::new(StoreConfig::default().with_ttl(Duration::from_secs(3600)));
//! store.start();
//!
//! let verifier = PinVerifier::from_pin("4698", "pepper")?;
//! let auth = Authenticator::new(verifier, store.clone());
//! let issued = auth.verify_pin("4698", "10.0.0.7".parse()?)?;
//!
//! assert!(store.validate(&issued.token).is_valid());
//! ```

mod authenticator;
mod clock;
mod config;
mod error;
mod pin;
mod session;
mod store;
mod sweeper;

pub use authenticator::Authenticator;
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::{DEFAULT_SWEEP_INTERVAL, DEFAULT_TTL, StoreConfig};
pub use error::{Error, Result};
pub use pin::{PIN_LENGTH, PinVerifier, check_pin_format, generate_salt, hash_pin};
pub use session::{IssuedToken, Session, Validation};
pub use store::{SessionTokenStore, TOKEN_BYTES};
