//! Error types for session and PIN operations.

/// Error type for session and PIN operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// PIN input is not exactly four ASCII digits.
    #[error("PIN must be exactly 4 digits")]
    InvalidFormat,

    /// PIN hash did not match the reference hash.
    #[error("Invalid PIN")]
    InvalidCredential,

    /// Token is missing, unknown or expired.
    #[error("Unauthorized")]
    Unauthorized,

    /// The OS random source failed to produce bytes.
    #[error("Random source failure: {0}")]
    RandomSource(String),

    /// Store or credential configuration is unusable.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error is the caller's fault (4xx) rather than ours.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidFormat | Error::InvalidCredential | Error::Unauthorized
        )
    }
}

/// Result type for session and PIN operations.
pub type Result<T> = std::result::Result<T, Error>;
