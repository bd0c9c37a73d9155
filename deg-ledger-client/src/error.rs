//! Ledger client error types.

use deg_ledger_signing::SigningError;
use std::time::Duration;
use thiserror::Error;

/// HTTP statuses treated as transient.
pub const RETRYABLE_STATUS_CODES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Result type for ledger client operations.
pub type Result<T> = std::result::Result<T, LedgerClientError>;

/// Ledger client errors.
#[derive(Debug, Error)]
pub enum LedgerClientError {
    /// Request failed after all retries exhausted.
    #[error("Request failed after {attempts} attempts: {message}")]
    RetryExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Last error message.
        message: String,
    },

    /// Request timed out.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Ledger answered with a non-success status.
    #[error("Response error: {status} - {message}")]
    Response {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        message: String,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Authorization header could not be generated.
    #[error("Signing error: {0}")]
    Signing(#[from] SigningError),

    /// Request could not be built.
    #[error("Failed to build request: {0}")]
    RequestBuild(String),

    /// Client configuration is unusable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The client was closed during shutdown.
    #[error("Ledger client is closed")]
    Closed,

    /// Underlying HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl LedgerClientError {
    /// Whether the failure is transient.
    ///
    /// Timeouts, connection failures and [`RETRYABLE_STATUS_CODES`] responses
    /// are transient. Everything else would fail the same way on a second
    /// attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Connection(_) => true,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Response { status, .. } => RETRYABLE_STATUS_CODES.contains(status),
            _ => false,
        }
    }

    /// Classify a reqwest error by what went wrong.
    pub(crate) fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else {
            Self::Http(err)
        }
    }
}

impl From<serde_json::Error> for LedgerClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(LedgerClientError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(LedgerClientError::Connection("refused".into()).is_retryable());

        for status in [408, 429, 500, 502, 503, 504] {
            let err = LedgerClientError::Response {
                status,
                message: String::new(),
            };
            assert!(err.is_retryable(), "{} should be retryable", status);
        }

        for status in [400, 401, 403, 404, 409, 422, 501, 505] {
            let err = LedgerClientError::Response {
                status,
                message: String::new(),
            };
            assert!(!err.is_retryable(), "{} should not be retryable", status);
        }

        assert!(!LedgerClientError::Closed.is_retryable());
        assert!(!LedgerClientError::Json("eof".into()).is_retryable());
        assert!(
            !LedgerClientError::Signing(SigningError::Sign("boom".into())).is_retryable()
        );
    }

    #[test]
    fn test_display() {
        let err = LedgerClientError::RetryExhausted {
            attempts: 3,
            message: "Response error: 503 - unavailable".into(),
        };
        assert_eq!(
            err.to_string(),
            "Request failed after 3 attempts: Response error: 503 - unavailable"
        );
    }
}
