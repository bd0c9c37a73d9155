//! Ledger delivery client

use crate::{
    AuthMode, LedgerClientConfig, LedgerClientError, LedgerPutRequest, LedgerRecordRequest,
    LedgerResponse, RequestAuth, Result,
};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};
use url::Url;

/// Maximum number of response body characters kept in error messages.
const MAX_ERROR_BODY: usize = 512;

/// Operations the ledger service offers.
///
/// Implementations handle retries internally: one call is one logical
/// delivery.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Create or update the trade record for an order item.
    async fn put(&self, record: &LedgerPutRequest) -> Result<LedgerResponse>;

    /// Append meter readings to an existing order item.
    async fn record_actuals(&self, record: &LedgerRecordRequest) -> Result<LedgerResponse>;

    /// Release resources. Later calls fail with [`LedgerClientError::Closed`].
    async fn close(&self);
}

/// reqwest-backed [`LedgerClient`]
#[derive(Debug)]
pub struct HttpLedgerClient {
    config: LedgerClientConfig,
    http_client: Client,
    auth: RequestAuth,
    put_url: Url,
    record_url: Url,
    closed: AtomicBool,
}

impl HttpLedgerClient {
    /// Create a client for `config.base_url`
    pub fn new(config: LedgerClientConfig, auth: RequestAuth) -> Result<Self> {
        let base = config.base_url.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(LedgerClientError::Config(
                "ledger base URL is required".to_string(),
            ));
        }

        let put_url = Url::parse(&format!("{}/ledger/put", base))?;
        let record_url = Url::parse(&format!("{}/ledger/record", base))?;

        let http_client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| LedgerClientError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
            auth,
            put_url,
            record_url,
            closed: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &LedgerClientConfig {
        &self.config
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.auth.mode()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// POST `payload` as JSON, retrying transient failures.
    async fn post_json<T>(&self, url: &Url, payload: &T) -> Result<LedgerResponse>
    where
        T: Serialize + ?Sized + Sync,
    {
        if self.is_closed() {
            return Err(LedgerClientError::Closed);
        }

        // Every attempt signs and sends these exact bytes
        let body = Bytes::from(serde_json::to_vec(payload)?);
        if self.config.debug_logging {
            debug!(url = %url, body = %String::from_utf8_lossy(&body), "Ledger request");
        }

        let policy = &self.config.retry;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let err = match self.send_once(url, &body).await {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };

            if policy.should_retry(attempt, &err) {
                let delay = policy.delay_for_retry(attempt);
                warn!(
                    url = %url,
                    attempt,
                    max_attempts = policy.total_attempts(),
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Ledger request failed, retrying"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            if attempt > 1 && policy.is_retryable(&err) {
                return Err(LedgerClientError::RetryExhausted {
                    attempts: attempt,
                    message: err.to_string(),
                });
            }

            return Err(err);
        }
    }

    async fn send_once(&self, url: &Url, body: &Bytes) -> Result<LedgerResponse> {
        let mut request = self
            .http_client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body.clone());

        if let Some((name, value)) = self.auth.header_for(body)? {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LedgerClientError::from_transport(e, self.config.timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LedgerClientError::from_transport(e, self.config.timeout))?;

        if self.config.debug_logging {
            debug!(url = %url, status = status.as_u16(), body = %text, "Ledger response");
        }

        if !status.is_success() {
            return Err(LedgerClientError::Response {
                status: status.as_u16(),
                message: truncate(&text, MAX_ERROR_BODY),
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn put(&self, record: &LedgerPutRequest) -> Result<LedgerResponse> {
        self.post_json(&self.put_url, record).await
    }

    async fn record_actuals(&self, record: &LedgerRecordRequest) -> Result<LedgerResponse> {
        self.post_json(&self.record_url, record).await
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            info!(base_url = %self.config.base_url, "Ledger client closed");
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
