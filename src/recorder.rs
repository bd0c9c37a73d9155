//! Pipeline step that records Beckn callbacks on the DEG ledger.

use crate::error::{RecorderError, Result};
use crate::dispatcher::Dispatcher;
use deg_ledger_client::{
    AuthMode, HttpLedgerClient, LedgerClient, LedgerClientConfig, LedgerPutRequest, LedgerRecord,
    LedgerRecordRequest, RequestAuth,
};
use deg_ledger_config::{Action, RecorderConfig, Role, SigningSource};
use deg_ledger_signing::Signer;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

/// Raw callback handed to the step
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    /// Request URL path, e.g. `/bap/receiver/on_confirm`
    pub path: &'a str,
    /// Raw JSON body
    pub body: &'a [u8],
}

impl<'a> StepContext<'a> {
    pub fn new(path: &'a str, body: &'a [u8]) -> Self {
        Self { path, body }
    }
}

/// Turns callback payloads into ledger records, one per order item.
pub trait RecordMapper: Send + Sync {
    /// Trade records from an `on_confirm` payload
    fn map_on_confirm(&self, body: &[u8], role: Role) -> Result<Vec<LedgerPutRequest>>;

    /// Meter readings from an `on_status` payload
    fn map_on_status(&self, body: &[u8], role: Role) -> Result<Vec<LedgerRecordRequest>>;
}

/// Beckn action name for a callback.
///
/// Taken from the last path segment, or from `context.action` in the body
/// when the path has none.
pub fn extract_action(path: &str, body: &[u8]) -> Option<String> {
    let segment = path
        .split(['?', '#'])
        .next()
        .and_then(|p| p.trim_end_matches('/').rsplit('/').next())
        .filter(|s| !s.is_empty());

    if let Some(segment) = segment {
        return Some(segment.to_string());
    }

    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value
        .pointer("/context/action")
        .and_then(|a| a.as_str())
        .filter(|a| !a.is_empty())
        .map(str::to_string)
}

/// Records confirmed trades and meter readings on the ledger without
/// blocking the pipeline.
pub struct LedgerRecorder {
    config: RecorderConfig,
    mapper: Arc<dyn RecordMapper>,
    dispatcher: Dispatcher,
    closing: AtomicBool,
}

impl LedgerRecorder {
    /// Build the signer, HTTP client and dispatcher from `config`.
    ///
    /// Deliveries run on the current Tokio runtime; fails with
    /// [`RecorderError::Runtime`] when called outside one. Use
    /// [`new_in`](Self::new_in) to pick the runtime explicitly.
    pub fn new(config: RecorderConfig, mapper: Arc<dyn RecordMapper>) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|err| {
            RecorderError::Runtime(format!(
                "ledger recorder must be built inside a Tokio runtime: {}",
                err
            ))
        })?;
        Self::new_in(config, mapper, runtime)
    }

    /// Like [`new`](Self::new), delivering on `runtime`.
    pub fn new_in(
        config: RecorderConfig,
        mapper: Arc<dyn RecordMapper>,
        runtime: Handle,
    ) -> Result<Self> {
        let signer = if config.signing_configured() {
            Some(Arc::new(Signer::new(
                config.subscriber_id.clone(),
                config.unique_key_id.clone(),
                &config.signing_private_key,
                config.signature_validity_secs,
            )?))
        } else {
            None
        };

        let auth = RequestAuth::resolve(signer, config.api_key(), &config.auth_header)?;
        log_auth(&config, auth.mode());

        let client_config = LedgerClientConfig::builder(config.ledger_host.as_str())
            .timeout(config.async_timeout)
            .retry_count(config.retry_count)
            .debug_logging(config.debug_logging)
            .build();
        let client = HttpLedgerClient::new(client_config, auth)?;

        Ok(Self::with_client(config, mapper, Arc::new(client), runtime))
    }

    /// Use `client` instead of building an HTTP client.
    pub fn with_client(
        config: RecorderConfig,
        mapper: Arc<dyn RecordMapper>,
        client: Arc<dyn LedgerClient>,
        runtime: Handle,
    ) -> Self {
        let actions: Vec<&str> = config.actions.iter().map(Action::as_str).collect();
        info!(
            actions = %actions.join(", "),
            role = %config.role,
            ledger_host = %config.ledger_host,
            enabled = config.enabled,
            "Ledger recorder configured"
        );

        Self {
            dispatcher: Dispatcher::new(client, config.async_timeout, runtime),
            config,
            mapper,
            closing: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Deliveries still running
    pub fn in_flight(&self) -> u64 {
        self.dispatcher.in_flight()
    }

    pub fn is_closing(&self) -> bool {
        self.closing.load(Ordering::Acquire)
    }

    /// Handle one callback.
    ///
    /// Mapping problems are logged and skipped. Deliveries happen in the
    /// background, so this never reports a ledger failure. Safe to call from
    /// threads outside the recorder's runtime.
    pub fn run(&self, ctx: &StepContext<'_>) -> Result<()> {
        if !self.config.enabled {
            debug!("Ledger recorder disabled, skipping");
            return Ok(());
        }
        if self.is_closing() {
            warn!(path = ctx.path, "Ledger recorder is closing, skipping");
            return Ok(());
        }

        let Some(name) = extract_action(ctx.path, ctx.body) else {
            debug!(path = ctx.path, "No action found, skipping");
            return Ok(());
        };

        let action = match name.parse::<Action>() {
            Ok(action) if self.config.is_action_enabled(action) => action,
            _ => {
                debug!(action = %name, "Action not enabled, skipping");
                return Ok(());
            }
        };

        if self.config.debug_logging {
            debug!(
                action = %action,
                body = %String::from_utf8_lossy(ctx.body),
                "Ledger recorder payload"
            );
        }

        let records = match action {
            Action::OnConfirm => self.map_on_confirm(ctx.body),
            Action::OnStatus => self.map_on_status(ctx.body),
        };

        if let Some(records) = records {
            self.dispatcher.submit_batch(records);
        }
        Ok(())
    }

    fn map_on_confirm(&self, body: &[u8]) -> Option<Vec<LedgerRecord>> {
        info!("Processing on_confirm");

        let records = match self.mapper.map_on_confirm(body, self.config.role) {
            Ok(records) => records,
            Err(err) => {
                warn!(error = %err, "Failed to map on_confirm payload");
                return None;
            }
        };

        if records.is_empty() {
            warn!("No order items found in on_confirm, skipping ledger recording");
            return None;
        }

        for record in &records {
            debug!(
                transaction_id = %record.transaction_id,
                order_item_id = %record.order_item_id,
                platform_id_buyer = %record.platform_id_buyer,
                platform_id_seller = %record.platform_id_seller,
                "Mapped ledger put record"
            );
        }
        info!(
            records = records.len(),
            transaction_id = %records[0].transaction_id,
            "Mapped ledger records from on_confirm"
        );

        Some(records.into_iter().map(LedgerRecord::Put).collect())
    }

    fn map_on_status(&self, body: &[u8]) -> Option<Vec<LedgerRecord>> {
        info!("Processing on_status");

        if !self.config.role.is_discom() {
            warn!(
                role = %self.config.role,
                "on_status requires BUYER_DISCOM or SELLER_DISCOM role, skipping"
            );
            return None;
        }

        let records = match self.mapper.map_on_status(body, self.config.role) {
            Ok(records) => records,
            Err(err) => {
                warn!(error = %err, "Failed to map on_status payload");
                return None;
            }
        };

        if records.is_empty() {
            warn!("No meter readings found in on_status, skipping ledger recording");
            return None;
        }

        for record in &records {
            debug!(
                transaction_id = %record.transaction_id,
                order_item_id = %record.order_item_id,
                metrics = record.metric_count(),
                "Mapped ledger actuals record"
            );
        }
        info!(
            records = records.len(),
            transaction_id = %records[0].transaction_id,
            "Mapped ledger record requests from on_status"
        );

        Some(records.into_iter().map(LedgerRecord::RecordActuals).collect())
    }

    /// Stop accepting callbacks and wait for in-flight deliveries.
    pub async fn close(&self) {
        self.closing.store(true, Ordering::Release);
        self.dispatcher.drain().await;
    }

    /// Like [`close`](Self::close), giving up after `timeout`.
    pub async fn close_timeout(&self, timeout: Duration) -> bool {
        self.closing.store(true, Ordering::Release);
        self.dispatcher.drain_timeout(timeout).await
    }
}

impl std::fmt::Debug for LedgerRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerRecorder")
            .field("config", &self.config)
            .field("dispatcher", &self.dispatcher)
            .field("closing", &self.is_closing())
            .finish()
    }
}

fn log_auth(config: &RecorderConfig, mode: AuthMode) {
    match mode {
        AuthMode::Signature => {
            let source = match config.signing_source() {
                Some(SigningSource::Environment) => "environment",
                _ => "explicit config",
            };
            info!(
                subscriber_id = %config.subscriber_id,
                key_id = %config.unique_key_id,
                source,
                "Beckn signing enabled"
            );
        }
        AuthMode::ApiKey => info!(header = %config.auth_header, "API key authentication enabled"),
        AuthMode::None => warn!("No authentication configured for ledger API calls"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_from_path() {
        assert_eq!(
            extract_action("/bap/receiver/on_confirm", b"").as_deref(),
            Some("on_confirm")
        );
        assert_eq!(
            extract_action("/bpp/caller/on_status/", b"").as_deref(),
            Some("on_status")
        );
        assert_eq!(
            extract_action("/receiver/on_status?trace=1", b"").as_deref(),
            Some("on_status")
        );
    }

    #[test]
    fn test_action_from_body() {
        let body = br#"{"context":{"action":"on_confirm","transaction_id":"t"}}"#;
        assert_eq!(extract_action("/", body).as_deref(), Some("on_confirm"));
        assert_eq!(extract_action("", body).as_deref(), Some("on_confirm"));
    }

    #[test]
    fn test_no_action() {
        assert_eq!(extract_action("/", b"not json"), None);
        assert_eq!(extract_action("", br#"{"context":{}}"#), None);
        assert_eq!(extract_action("", br#"{"context":{"action":""}}"#), None);
    }
}
