//! Recorder error types.

use deg_ledger_client::LedgerClientError;
use deg_ledger_config::ConfigError;
use deg_ledger_signing::SigningError;
use thiserror::Error;

/// Result type for recorder operations.
pub type Result<T> = std::result::Result<T, RecorderError>;

/// Recorder errors.
///
/// Delivery failures never surface here; they are logged by the delivery
/// task that hit them.
#[derive(Debug, Error)]
pub enum RecorderError {
    /// Invalid recorder configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Signing key material is unusable.
    #[error("Signing error: {0}")]
    Signing(#[from] SigningError),

    /// Ledger client could not be built.
    #[error("Ledger client error: {0}")]
    Client(#[from] LedgerClientError),

    /// Callback payload could not be mapped to ledger records.
    #[error("Payload error: {0}")]
    Payload(String),

    /// No Tokio runtime to run deliveries on.
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl RecorderError {
    pub fn payload(message: impl Into<String>) -> Self {
        Self::Payload(message.into())
    }
}

impl From<serde_json::Error> for RecorderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Payload(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraps_config_error() {
        let err: RecorderError = ConfigError::Required("ledgerHost").into();
        assert!(matches!(err, RecorderError::Config(_)));
        assert!(err.to_string().starts_with("Configuration error:"));
    }

    #[test]
    fn test_runtime_error_message() {
        let err = RecorderError::Runtime("no reactor running".into());
        assert_eq!(err.to_string(), "Runtime error: no reactor running");
    }

    #[test]
    fn test_json_error_is_payload() {
        let err: RecorderError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, RecorderError::Payload(_)));
    }
}
