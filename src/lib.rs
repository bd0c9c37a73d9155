//! # DEG Ledger Recorder
//!
//! Records Beckn energy-trading callbacks on the DEG ledger.
//!
//! A [`LedgerRecorder`] sits in a message-processing pipeline. For every
//! `on_confirm` (trade) or `on_status` (meter reading) callback it maps the
//! payload to ledger records and hands them to a [`Dispatcher`], which
//! delivers each record in its own background task. Requests are
//! authenticated with a Beckn ed25519 `Signature` header when a signing key
//! is configured.
//!
//! ## Crates
//!
//! - [`signing`]: Beckn Authorization header generation and verification
//! - [`config`]: recorder configuration, settings files and environment
//! - [`client`]: the [`LedgerClient`] contract and its reqwest implementation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deg_ledger::prelude::*;
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! struct Mapper;
//!
//! impl RecordMapper for Mapper {
//!     fn map_on_confirm(&self, _body: &[u8], role: Role) -> Result<Vec<LedgerPutRequest>> {
//!         Ok(vec![LedgerPutRequest::new(role.as_str(), "txn-1", "item-1")])
//!     }
//!
//!     fn map_on_status(&self, _body: &[u8], _role: Role) -> Result<Vec<LedgerRecordRequest>> {
//!         Ok(Vec::new())
//!     }
//! }
//!
//! # async fn example() -> Result<()> {
//! deg_ledger::logging::init(LogConfig::from_env());
//!
//! let settings = HashMap::from([("ledgerHost".to_string(), "https://ledger.example.org".to_string())]);
//! let config = RecorderConfig::parse(&settings, &EnvSnapshot::capture())?;
//! let recorder = LedgerRecorder::new(config, Arc::new(Mapper))?;
//!
//! recorder.run(&StepContext::new("/bap/receiver/on_confirm", b"{}"))?;
//! recorder.close().await;
//! # Ok(())
//! # }
//! ```

pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod recorder;
pub mod tracker;

pub use dispatcher::{DeliveryOutcome, Dispatcher};
pub use error::{RecorderError, Result};
pub use logging::LogConfig;
pub use recorder::{LedgerRecorder, RecordMapper, StepContext, extract_action};
pub use tracker::{InFlightGuard, InFlightTracker};

pub use deg_ledger_client::LedgerClient;
pub use deg_ledger_client as client;
pub use deg_ledger_config as config;
pub use deg_ledger_signing as signing;

/// Common imports
pub mod prelude {
    pub use crate::{
        DeliveryOutcome, Dispatcher, LedgerRecorder, LogConfig, RecordMapper, RecorderError,
        Result, StepContext,
    };
    pub use deg_ledger_client::{
        LedgerClient, LedgerPutRequest, LedgerRecord, LedgerRecordRequest, LedgerResponse,
    };
    pub use deg_ledger_config::{Action, EnvSnapshot, RecorderConfig, Role};
    pub use deg_ledger_signing::Signer;
}
