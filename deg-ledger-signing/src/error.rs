//! Error types for signing operations

use thiserror::Error;

/// Errors that can occur while building or checking an Authorization header
#[derive(Error, Debug)]
pub enum SigningError {
    /// Identity or key material is missing or malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// The ed25519 signing operation failed
    #[error("Failed to sign: {0}")]
    Sign(String),

    /// Header could not be parsed
    #[error("Invalid authorization header: {0}")]
    InvalidHeader(String),

    /// Signature or digest does not match the payload
    #[error("Signature verification failed: {0}")]
    SignatureInvalid(String),

    /// Current time is at or past the expiry timestamp
    #[error("Signature expired at {expires} (now {now})")]
    Expired { expires: i64, now: i64 },

    /// Current time is before the creation timestamp
    #[error("Signature not valid before {created} (now {now})")]
    NotYetValid { created: i64, now: i64 },
}

impl SigningError {
    /// Whether this error was raised at construction time
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
