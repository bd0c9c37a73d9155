//! Retry configuration for ledger calls.
//!
//! One logical delivery is `1 + max_retries` attempts at most. Only transient
//! failures (see [`LedgerClientError::is_retryable`]) are retried.

use crate::LedgerClientError;
use crate::error::RETRYABLE_STATUS_CODES;
use std::time::Duration;

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Backoff strategy.
    pub backoff: BackoffStrategy,
    /// Status codes that should trigger a retry.
    pub retry_status_codes: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            backoff: BackoffStrategy::Exponential {
                initial: Duration::from_millis(100),
                max: Duration::from_secs(5),
                multiplier: 2.0,
            },
            retry_status_codes: RETRYABLE_STATUS_CODES.to_vec(),
        }
    }
}

impl RetryConfig {
    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self::default()
    }

    /// Exponential backoff with the given retry count.
    pub fn from_retry_count(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Set the backoff strategy.
    pub fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Replace the status codes that trigger a retry.
    pub fn with_status_codes(mut self, codes: Vec<u16>) -> Self {
        self.retry_status_codes = codes;
        self
    }

    /// Upper bound on attempts for one logical call.
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Whether the error class is transient under this policy.
    pub fn is_retryable(&self, error: &LedgerClientError) -> bool {
        match error {
            LedgerClientError::Response { status, .. } => self.retry_status_codes.contains(status),
            other => other.is_retryable(),
        }
    }

    /// Whether another attempt should follow `attempts_made` failed ones.
    pub fn should_retry(&self, attempts_made: u32, error: &LedgerClientError) -> bool {
        attempts_made < self.total_attempts() && self.is_retryable(error)
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        self.backoff.delay_for_attempt(retry.saturating_sub(1))
    }
}

/// Backoff strategy for retries.
#[derive(Debug, Clone)]
pub enum BackoffStrategy {
    /// No delay between retries.
    None,
    /// Constant delay between retries.
    Constant(Duration),
    /// Exponential backoff: delay multiplies each attempt.
    Exponential {
        /// Initial delay.
        initial: Duration,
        /// Maximum delay.
        max: Duration,
        /// Multiplier (typically 2.0).
        multiplier: f64,
    },
}

impl BackoffStrategy {
    /// Calculate delay for a given attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Constant(d) => *d,
            Self::Exponential {
                initial,
                max,
                multiplier,
            } => {
                let factor = multiplier.powi(attempt as i32);
                let millis = (initial.as_millis() as f64 * factor) as u64;
                Duration::from_millis(millis).min(*max)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> LedgerClientError {
        LedgerClientError::Response {
            status,
            message: String::new(),
        }
    }

    #[test]
    fn test_exponential_backoff() {
        let strategy = BackoffStrategy::Exponential {
            initial: Duration::from_millis(100),
            max: Duration::from_secs(5),
            multiplier: 2.0,
        };

        assert_eq!(strategy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(strategy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(strategy.delay_for_attempt(2), Duration::from_millis(400));
        assert_eq!(strategy.delay_for_attempt(10), Duration::from_secs(5));
    }

    #[test]
    fn test_constant_backoff() {
        let strategy = BackoffStrategy::Constant(Duration::from_millis(250));
        assert_eq!(strategy.delay_for_attempt(0), Duration::from_millis(250));
        assert_eq!(strategy.delay_for_attempt(7), Duration::from_millis(250));
        assert_eq!(BackoffStrategy::None.delay_for_attempt(3), Duration::ZERO);
    }

    #[test]
    fn test_no_retries() {
        let policy = RetryConfig::none();
        assert_eq!(policy.total_attempts(), 1);
        assert!(!policy.should_retry(1, &response(503)));
    }

    #[test]
    fn test_attempt_budget() {
        let policy = RetryConfig::from_retry_count(2);
        assert_eq!(policy.total_attempts(), 3);
        assert!(policy.should_retry(1, &response(503)));
        assert!(policy.should_retry(2, &response(503)));
        assert!(!policy.should_retry(3, &response(503)));
    }

    #[test]
    fn test_only_transient_errors_retried() {
        let policy = RetryConfig::from_retry_count(5);
        assert!(policy.should_retry(1, &LedgerClientError::Timeout(Duration::from_secs(1))));
        assert!(policy.should_retry(1, &response(429)));
        assert!(!policy.should_retry(1, &response(400)));
        assert!(!policy.should_retry(1, &LedgerClientError::Closed));
    }

    #[test]
    fn test_default_policy_agrees_with_error_classification() {
        let policy = RetryConfig::from_retry_count(1);
        for status in 400..600 {
            let err = response(status);
            assert_eq!(
                policy.is_retryable(&err),
                err.is_retryable(),
                "status {} classified differently",
                status
            );
        }
        assert!(!policy.is_retryable(&response(501)));
    }

    #[test]
    fn test_custom_status_codes() {
        let policy = RetryConfig::from_retry_count(1).with_status_codes(vec![409]);
        assert!(policy.should_retry(1, &response(409)));
        assert!(!policy.should_retry(1, &response(503)));
    }

    #[test]
    fn test_first_retry_uses_initial_delay() {
        let policy = RetryConfig::from_retry_count(3);
        assert_eq!(policy.delay_for_retry(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for_retry(2), Duration::from_millis(200));
    }
}
