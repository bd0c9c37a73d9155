//! Fire-and-forget delivery of ledger records.
//!
//! [`Dispatcher::submit_batch`] spawns one detached task per record and
//! returns straight away. Each task carries its own deadline and an
//! [`InFlightGuard`] so [`Dispatcher::drain`] can wait for stragglers at
//! shutdown.

use crate::tracker::{InFlightGuard, InFlightTracker};
use deg_ledger_client::{LedgerClient, LedgerClientError, LedgerRecord};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

/// How one delivery ended
#[derive(Debug)]
pub enum DeliveryOutcome {
    /// The ledger accepted the record
    Succeeded { record_id: String },
    /// The client gave up, after its own retries
    Failed(LedgerClientError),
    /// The deadline expired before the client finished
    TimedOut(Duration),
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded { record_id } => write!(f, "succeeded (record_id={})", record_id),
            Self::Failed(err) => write!(f, "failed: {}", err),
            Self::TimedOut(after) => write!(f, "timed out after {:?}", after),
        }
    }
}

/// Spawns and tracks ledger deliveries
pub struct Dispatcher {
    client: Arc<dyn LedgerClient>,
    async_timeout: Duration,
    runtime: Handle,
    tracker: InFlightTracker,
    client_closed: AtomicBool,
}

impl Dispatcher {
    /// `async_timeout` bounds each delivery, client retries included.
    ///
    /// Deliveries run on `runtime`, so batches can be submitted from threads
    /// outside it.
    pub fn new(client: Arc<dyn LedgerClient>, async_timeout: Duration, runtime: Handle) -> Self {
        Self {
            client,
            async_timeout,
            runtime,
            tracker: InFlightTracker::new(),
            client_closed: AtomicBool::new(false),
        }
    }

    pub fn async_timeout(&self) -> Duration {
        self.async_timeout
    }

    /// Deliveries submitted and not yet finished
    pub fn in_flight(&self) -> u64 {
        self.tracker.active_count()
    }

    /// Spawn one detached delivery per record.
    ///
    /// Returns the number of spawned tasks. Never waits on I/O.
    pub fn submit_batch(&self, records: Vec<LedgerRecord>) -> usize {
        let count = records.len();
        for record in records {
            // Registered before the task exists so a concurrent drain sees it
            let guard = self.tracker.register();
            self.spawn_delivery(record, guard);
        }

        debug!(
            records = count,
            in_flight = self.in_flight(),
            "Submitted ledger batch"
        );
        count
    }

    fn spawn_delivery(&self, record: LedgerRecord, guard: InFlightGuard) {
        let client = Arc::clone(&self.client);
        let timeout = self.async_timeout;

        self.runtime.spawn(async move {
            let _guard = guard;
            let outcome = deliver(client.as_ref(), &record, timeout).await;
            log_outcome(&record, &outcome);
        });
    }

    /// Wait for every in-flight delivery, then close the client.
    ///
    /// The client is closed at most once; later calls only wait.
    pub async fn drain(&self) {
        let pending = self.in_flight();
        if pending > 0 {
            info!(in_flight = pending, "Waiting for in-flight ledger deliveries");
        }

        self.tracker.wait_idle().await;
        self.close_client().await;
    }

    /// Like [`drain`](Self::drain), bounded by `timeout`.
    ///
    /// Returns false if deliveries were still running when the timeout
    /// expired; the client is left open in that case.
    pub async fn drain_timeout(&self, timeout: Duration) -> bool {
        if !self.tracker.wait_idle_timeout(timeout).await {
            warn!(
                in_flight = self.in_flight(),
                timeout_ms = timeout.as_millis() as u64,
                "Ledger drain timed out"
            );
            return false;
        }

        self.close_client().await;
        true
    }

    async fn close_client(&self) {
        if !self.client_closed.swap(true, Ordering::AcqRel) {
            self.client.close().await;
            info!("Ledger dispatcher drained");
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("async_timeout", &self.async_timeout)
            .field("in_flight", &self.in_flight())
            .field("client_closed", &self.client_closed.load(Ordering::Acquire))
            .finish()
    }
}

/// Deliver one record under a fresh deadline.
pub(crate) async fn deliver(
    client: &dyn LedgerClient,
    record: &LedgerRecord,
    timeout: Duration,
) -> DeliveryOutcome {
    let call = async {
        match record {
            LedgerRecord::Put(put) => client.put(put).await,
            LedgerRecord::RecordActuals(actuals) => client.record_actuals(actuals).await,
        }
    };

    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(response)) => DeliveryOutcome::Succeeded {
            record_id: response.record_id,
        },
        Ok(Err(err)) => DeliveryOutcome::Failed(err),
        Err(_) => DeliveryOutcome::TimedOut(timeout),
    }
}

fn log_outcome(record: &LedgerRecord, outcome: &DeliveryOutcome) {
    match outcome {
        DeliveryOutcome::Succeeded { record_id } => info!(
            transaction_id = record.transaction_id(),
            order_item_id = record.order_item_id(),
            kind = %record.kind(),
            record_id = %record_id,
            "Ledger record delivered"
        ),
        DeliveryOutcome::Failed(err) => error!(
            transaction_id = record.transaction_id(),
            order_item_id = record.order_item_id(),
            kind = %record.kind(),
            error = %err,
            "Ledger delivery failed"
        ),
        DeliveryOutcome::TimedOut(after) => error!(
            transaction_id = record.transaction_id(),
            order_item_id = record.order_item_id(),
            kind = %record.kind(),
            error = %outcome,
            timeout_ms = after.as_millis() as u64,
            "Ledger delivery failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use deg_ledger_client::{LedgerPutRequest, LedgerRecordRequest, LedgerResponse};
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct StubClient {
        delay: Duration,
        fail: bool,
        closes: AtomicUsize,
    }

    impl StubClient {
        async fn answer(&self, id: &str) -> deg_ledger_client::Result<LedgerResponse> {
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(LedgerClientError::Response {
                    status: 400,
                    message: "rejected".into(),
                });
            }
            Ok(LedgerResponse {
                record_id: format!("rec-{}", id),
                status: None,
                message: None,
            })
        }
    }

    #[async_trait]
    impl LedgerClient for StubClient {
        async fn put(&self, record: &LedgerPutRequest) -> deg_ledger_client::Result<LedgerResponse> {
            self.answer(&record.order_item_id).await
        }

        async fn record_actuals(
            &self,
            record: &LedgerRecordRequest,
        ) -> deg_ledger_client::Result<LedgerResponse> {
            self.answer(&record.order_item_id).await
        }

        async fn close(&self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn put(item: &str) -> LedgerRecord {
        LedgerPutRequest::new("BUYER", "txn-1", item).into()
    }

    #[tokio::test(start_paused = true)]
    async fn test_deliver_success() {
        let client = StubClient::default();
        let outcome = deliver(&client, &put("a"), Duration::from_secs(1)).await;
        assert!(outcome.is_success());
        assert_eq!(outcome.to_string(), "succeeded (record_id=rec-a)");
    }

    #[tokio::test(start_paused = true)]
    async fn test_deliver_record_actuals() {
        let client = StubClient::default();
        let record: LedgerRecord = LedgerRecordRequest::new("BUYER_DISCOM", "t", "m1").into();
        match deliver(&client, &record, Duration::from_secs(1)).await {
            DeliveryOutcome::Succeeded { record_id } => assert_eq!(record_id, "rec-m1"),
            other => panic!("unexpected outcome: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_deliver_failure() {
        let client = StubClient {
            fail: true,
            ..Default::default()
        };
        let outcome = deliver(&client, &put("a"), Duration::from_secs(1)).await;
        assert!(matches!(outcome, DeliveryOutcome::Failed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deliver_timeout() {
        let client = StubClient {
            delay: Duration::from_secs(10),
            ..Default::default()
        };
        let outcome = deliver(&client, &put("a"), Duration::from_millis(200)).await;
        assert!(matches!(outcome, DeliveryOutcome::TimedOut(d) if d == Duration::from_millis(200)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_returns_before_delivery() {
        let client = Arc::new(StubClient {
            delay: Duration::from_secs(1),
            ..Default::default()
        });
        let dispatcher = Dispatcher::new(client.clone(), Duration::from_secs(5), Handle::current());

        assert_eq!(dispatcher.submit_batch(vec![put("a"), put("b")]), 2);
        assert_eq!(dispatcher.in_flight(), 2);

        dispatcher.drain().await;
        assert_eq!(dispatcher.in_flight(), 0);
        assert_eq!(client.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_closes_once() {
        let client = Arc::new(StubClient::default());
        let dispatcher = Dispatcher::new(client.clone(), Duration::from_secs(5), Handle::current());

        dispatcher.drain().await;
        dispatcher.drain().await;
        assert!(dispatcher.drain_timeout(Duration::from_millis(10)).await);
        assert_eq!(client.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_timeout_leaves_client_open() {
        let client = Arc::new(StubClient {
            delay: Duration::from_secs(60),
            ..Default::default()
        });
        let dispatcher =
            Dispatcher::new(client.clone(), Duration::from_secs(120), Handle::current());
        dispatcher.submit_batch(vec![put("slow")]);

        assert!(!dispatcher.drain_timeout(Duration::from_secs(1)).await);
        assert_eq!(dispatcher.in_flight(), 1);
        assert_eq!(client.closes.load(Ordering::SeqCst), 0);

        dispatcher.drain().await;
        assert_eq!(client.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_batch() {
        let dispatcher = Dispatcher::new(
            Arc::new(StubClient::default()),
            Duration::from_secs(1),
            Handle::current(),
        );
        assert_eq!(dispatcher.submit_batch(Vec::new()), 0);
        assert_eq!(dispatcher.in_flight(), 0);
    }
}
