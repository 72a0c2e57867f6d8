//! Payload shapes of the emitted order lifecycle events.
//!
//! These are the bodies stored in the outbox `payload` column and delivered
//! verbatim to consumers, who deduplicate by the outbox record id.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Body of an `OrderConfirmed` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderConfirmedPayload {
    pub order_id: i64,
    pub user_id: i64,
    pub event_id: i64,
    pub event_title: String,
    pub order_total: Decimal,
    pub seat_ids: Vec<String>,
    pub confirmed_at: DateTime<Utc>,
    pub correlation_id: String,
}

/// Body of an `OrderCancelled` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCancelledPayload {
    pub order_id: i64,
    pub user_id: i64,
    pub event_id: i64,
    pub reason: String,
    pub cancelled_at: DateTime<Utc>,
    pub correlation_id: String,
}

/// Body of an `OrderRefunded` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRefundedPayload {
    pub order_id: i64,
    pub user_id: i64,
    pub event_id: i64,
    pub amount: Decimal,
    pub reason: String,
    pub refunded_at: DateTime<Utc>,
    pub correlation_id: String,
}
