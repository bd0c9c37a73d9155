//! Configuration for the ledger client

use crate::RetryConfig;
use std::time::Duration;

/// Configuration for [`HttpLedgerClient`](crate::HttpLedgerClient)
#[derive(Debug, Clone)]
pub struct LedgerClientConfig {
    /// Ledger service base URL, e.g. `https://ledger.example.org`
    pub base_url: String,

    /// Per-attempt request timeout
    pub timeout: Duration,

    /// Retry policy for transient failures
    pub retry: RetryConfig,

    /// User-Agent header for outgoing requests
    pub user_agent: String,

    /// Log request and response bodies at debug level
    pub debug_logging: bool,
}

impl Default for LedgerClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout: Duration::from_secs(5),
            retry: RetryConfig::default(),
            user_agent: format!("deg-ledger-recorder/{}", env!("CARGO_PKG_VERSION")),
            debug_logging: false,
        }
    }
}

impl LedgerClientConfig {
    /// Configuration with defaults for the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Create a builder for custom configuration
    pub fn builder(base_url: impl Into<String>) -> LedgerClientConfigBuilder {
        LedgerClientConfigBuilder::new(base_url)
    }
}

/// Builder for LedgerClientConfig
#[derive(Debug, Clone)]
pub struct LedgerClientConfigBuilder {
    config: LedgerClientConfig,
}

impl LedgerClientConfigBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            config: LedgerClientConfig::new(base_url),
        }
    }

    /// Set the per-attempt timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the retry policy
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    /// Retry transient failures `count` times with the default backoff
    pub fn retry_count(mut self, count: u32) -> Self {
        self.config.retry = RetryConfig::from_retry_count(count);
        self
    }

    /// Set the User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn debug_logging(mut self, enabled: bool) -> Self {
        self.config.debug_logging = enabled;
        self
    }

    /// Build the configuration
    pub fn build(self) -> LedgerClientConfig {
        self.config
    }
}
