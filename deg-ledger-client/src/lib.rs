//! DEG ledger delivery client.
//!
//! Sends trade records and meter readings to the DEG ledger service over
//! HTTPS. Requests are authenticated either with a Beckn `Signature`
//! Authorization header or a static API key, and transient failures are
//! retried with exponential backoff.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use deg_ledger_client::{
//!     HttpLedgerClient, LedgerClient, LedgerClientConfig, LedgerPutRequest, RequestAuth,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = LedgerClientConfig::builder("https://ledger.example.org")
//!     .retry_count(2)
//!     .build();
//! let auth = RequestAuth::resolve(None, Some("secret"), "X-API-Key")?;
//! let client = HttpLedgerClient::new(config, auth)?;
//!
//! let record = LedgerPutRequest::new("BUYER", "txn-1", "order-item-1");
//! let response = client.put(&record).await?;
//! println!("recorded as {}", response.record_id);
//! # Ok(())
//! # }
//! ```

mod auth;
mod client;
mod config;
mod error;
mod records;
mod retry;

pub use auth::{AuthMode, RequestAuth};
pub use client::{HttpLedgerClient, LedgerClient};
pub use config::{LedgerClientConfig, LedgerClientConfigBuilder};
pub use error::{LedgerClientError, RETRYABLE_STATUS_CODES, Result};
pub use records::{
    LedgerPutRequest, LedgerRecord, LedgerRecordRequest, LedgerResponse, RecordKind, TradeDetail,
    ValidationMetric,
};
pub use retry::{BackoffStrategy, RetryConfig};
