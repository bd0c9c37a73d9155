//! Ledger record types sent to the DEG ledger

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trade record for one order item, sent to `/ledger/put` after `on_confirm`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerPutRequest {
    /// Ledger role of the submitting platform (BUYER, SELLER, ...)
    pub role: String,

    pub transaction_id: String,

    pub order_item_id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub platform_id_buyer: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub platform_id_seller: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub discom_id_buyer: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub discom_id_seller: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub buyer_id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub seller_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_start_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_end_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trade_details: Vec<TradeDetail>,

    /// Caller-chosen correlation ID echoed back by the ledger
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_reference: Option<String>,
}

impl LedgerPutRequest {
    pub fn new(
        role: impl Into<String>,
        transaction_id: impl Into<String>,
        order_item_id: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            transaction_id: transaction_id.into(),
            order_item_id: order_item_id.into(),
            platform_id_buyer: String::new(),
            platform_id_seller: String::new(),
            discom_id_buyer: String::new(),
            discom_id_seller: String::new(),
            buyer_id: String::new(),
            seller_id: String::new(),
            trade_time: None,
            delivery_start_time: None,
            delivery_end_time: None,
            trade_details: Vec::new(),
            client_reference: None,
        }
    }

    /// Set the buyer and seller platform IDs
    pub fn with_platforms(mut self, buyer: impl Into<String>, seller: impl Into<String>) -> Self {
        self.platform_id_buyer = buyer.into();
        self.platform_id_seller = seller.into();
        self
    }

    /// Set the buyer and seller distribution companies
    pub fn with_discoms(mut self, buyer: impl Into<String>, seller: impl Into<String>) -> Self {
        self.discom_id_buyer = buyer.into();
        self.discom_id_seller = seller.into();
        self
    }

    /// Set the delivery window
    pub fn with_delivery_window(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.delivery_start_time = Some(start);
        self.delivery_end_time = Some(end);
        self
    }

    pub fn with_trade_detail(mut self, detail: TradeDetail) -> Self {
        self.trade_details.push(detail);
        self
    }
}

/// Traded quantity for one commodity line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeDetail {
    pub trade_type: String,
    pub trade_qty: f64,
    pub trade_unit: String,
}

/// Meter readings for one order item, sent to `/ledger/record` after
/// `on_status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRecordRequest {
    pub role: String,

    pub transaction_id: String,

    pub order_item_id: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buyer_fulfillment_validation_metrics: Vec<ValidationMetric>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub seller_fulfillment_validation_metrics: Vec<ValidationMetric>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_reference: Option<String>,
}

impl LedgerRecordRequest {
    pub fn new(
        role: impl Into<String>,
        transaction_id: impl Into<String>,
        order_item_id: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            transaction_id: transaction_id.into(),
            order_item_id: order_item_id.into(),
            buyer_fulfillment_validation_metrics: Vec::new(),
            seller_fulfillment_validation_metrics: Vec::new(),
            status: None,
            client_reference: None,
        }
    }

    pub fn with_buyer_metric(mut self, metric: ValidationMetric) -> Self {
        self.buyer_fulfillment_validation_metrics.push(metric);
        self
    }

    pub fn with_seller_metric(mut self, metric: ValidationMetric) -> Self {
        self.seller_fulfillment_validation_metrics.push(metric);
        self
    }

    /// Number of readings carried by this record
    pub fn metric_count(&self) -> usize {
        self.buyer_fulfillment_validation_metrics.len()
            + self.seller_fulfillment_validation_metrics.len()
    }
}

/// One fulfilment measurement, e.g. delivered energy in kWh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationMetric {
    pub validation_metric_type: String,
    pub validation_metric_value: f64,
}

impl ValidationMetric {
    pub fn new(metric_type: impl Into<String>, value: f64) -> Self {
        Self {
            validation_metric_type: metric_type.into(),
            validation_metric_value: value,
        }
    }
}

/// Successful ledger answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerResponse {
    /// Stable identifier of the created or updated ledger entry
    pub record_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Which ledger operation a record is delivered through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Put,
    RecordActuals,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Put => "put",
            Self::RecordActuals => "record_actuals",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record ready for delivery
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerRecord {
    Put(LedgerPutRequest),
    RecordActuals(LedgerRecordRequest),
}

impl LedgerRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Put(_) => RecordKind::Put,
            Self::RecordActuals(_) => RecordKind::RecordActuals,
        }
    }

    pub fn transaction_id(&self) -> &str {
        match self {
            Self::Put(r) => &r.transaction_id,
            Self::RecordActuals(r) => &r.transaction_id,
        }
    }

    pub fn order_item_id(&self) -> &str {
        match self {
            Self::Put(r) => &r.order_item_id,
            Self::RecordActuals(r) => &r.order_item_id,
        }
    }
}

impl From<LedgerPutRequest> for LedgerRecord {
    fn from(record: LedgerPutRequest) -> Self {
        Self::Put(record)
    }
}

impl From<LedgerRecordRequest> for LedgerRecord {
    fn from(record: LedgerRecordRequest) -> Self {
        Self::RecordActuals(record)
    }
}
