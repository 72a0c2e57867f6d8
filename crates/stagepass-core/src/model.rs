//! Domain entities: orders, tickets, and outbox records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::StoreError;

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Persisted but not yet paid.
    Created,
    /// Paid, seats allocated, tickets issued.
    Confirmed,
    /// Terminated without a successful payment, or cancelled after one
    /// whose refund was refused.
    Cancelled,
    /// Previously confirmed; the payment has been returned.
    Refunded,
    /// Payment succeeded but fulfillment and its compensating refund both
    /// failed. Operator-owned; no further automatic transitions.
    PaymentCompletedButFulfillmentFailed,
}

impl OrderStatus {
    /// Database TEXT representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Confirmed => "CONFIRMED",
            Self::Cancelled => "CANCELLED",
            Self::Refunded => "REFUNDED",
            Self::PaymentCompletedButFulfillmentFailed => {
                "PAYMENT_COMPLETED_BUT_FULFILLMENT_FAILED"
            }
        }
    }

    /// Parses the database TEXT representation.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "CREATED" => Some(Self::Created),
            "CONFIRMED" => Some(Self::Confirmed),
            "CANCELLED" => Some(Self::Cancelled),
            "REFUNDED" => Some(Self::Refunded),
            "PAYMENT_COMPLETED_BUT_FULFILLMENT_FAILED" => {
                Some(Self::PaymentCompletedButFulfillmentFailed)
            }
            _ => None,
        }
    }
}

/// Payment progress of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// Database TEXT representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::Refunded => "REFUNDED",
        }
    }

    /// Parses the database TEXT representation.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(Self::Pending),
            "SUCCESS" => Some(Self::Success),
            "FAILED" => Some(Self::Failed),
            "REFUNDED" => Some(Self::Refunded),
            _ => None,
        }
    }
}

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Server-assigned dense identifier.
    pub order_id: i64,
    pub user_id: i64,
    pub event_id: i64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    /// Seat subtotal plus tax, fixed-point with 2 decimals.
    pub order_total: Decimal,
    pub created_at: DateTime<Utc>,
    /// Caller-supplied deduplication token; unique among orders when present.
    pub idempotency_key: Option<String>,
}

/// An order awaiting its server-assigned id.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: i64,
    pub event_id: i64,
    pub order_total: Decimal,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A persisted ticket, issued when its order is confirmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub ticket_id: i64,
    pub order_id: i64,
    pub event_id: i64,
    /// Opaque seat identifier assigned by the seating service.
    pub seat_id: String,
    pub price_paid: Decimal,
}

/// A ticket awaiting its server-assigned id.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub order_id: i64,
    pub event_id: i64,
    pub seat_id: String,
    pub price_paid: Decimal,
}

/// Kind of an emitted order lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboxEventType {
    OrderConfirmed,
    OrderCancelled,
    OrderRefunded,
}

impl OutboxEventType {
    /// Database TEXT representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderConfirmed => "OrderConfirmed",
            Self::OrderCancelled => "OrderCancelled",
            Self::OrderRefunded => "OrderRefunded",
        }
    }

    /// Parses the database TEXT representation.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "OrderConfirmed" => Some(Self::OrderConfirmed),
            "OrderCancelled" => Some(Self::OrderCancelled),
            "OrderRefunded" => Some(Self::OrderRefunded),
            _ => None,
        }
    }
}

/// A persisted outbox row, written in the same transaction as the order
/// mutation that produced it and drained later by the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxRecord {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: OutboxEventType,
    /// Serialized event body; consumers deserialize by `event_type`.
    pub payload: Value,
    pub correlation_id: String,
    pub created_at: DateTime<Utc>,
    pub dispatched: bool,
}

/// An outbox row awaiting persistence.
#[derive(Debug, Clone)]
pub struct NewOutboxRecord {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: OutboxEventType,
    pub payload: Value,
    pub correlation_id: String,
    pub created_at: DateTime<Utc>,
}

impl NewOutboxRecord {
    /// Builds an order-aggregate outbox record with a fresh id, serializing
    /// `payload` into the stored JSON form.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the payload cannot be serialized.
    pub fn order_event<P: Serialize>(
        order_id: i64,
        event_type: OutboxEventType,
        payload: &P,
        correlation_id: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Self, StoreError> {
        let payload = serde_json::to_value(payload).map_err(|e| {
            StoreError::Database(format!("outbox payload serialization failed: {e}"))
        })?;
        Ok(Self {
            id: Uuid::new_v4(),
            aggregate_type: "Order".to_owned(),
            aggregate_id: order_id.to_string(),
            event_type,
            payload,
            correlation_id: correlation_id.to_owned(),
            created_at,
        })
    }
}

/// Aggregate counts served by the statistics endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatistics {
    pub total_orders: i64,
    pub confirmed: i64,
    pub cancelled: i64,
    pub refunded: i64,
    pub fulfillment_failed: i64,
    /// Summed order totals of confirmed orders.
    pub total_revenue: Decimal,
}
