//! Contracts of the external services the orchestrator talks to.
//!
//! Each upstream is a narrow capability trait wired in by construction;
//! mock and real variants share nothing but the contract. Every call takes
//! the request context so the correlation id travels with it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::correlation::RequestContext;
use crate::error::ClientError;
use crate::model::OutboxRecord;

/// Sales state of a catalog event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    OnSale,
    SoldOut,
    Cancelled,
    /// Any state this service does not recognize; never sellable.
    #[serde(other)]
    Unknown,
}

impl EventStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnSale => "ON_SALE",
            Self::SoldOut => "SOLD_OUT",
            Self::Cancelled => "CANCELLED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Catalog view of an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventInfo {
    pub event_id: i64,
    pub title: String,
    pub status: EventStatus,
    pub event_date: DateTime<Utc>,
    pub venue_id: i64,
    pub venue_name: String,
    pub city: String,
    pub base_price: Decimal,
}

/// A sellable seat as listed by the seating service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    /// Opaque identifier; compared verbatim, never parsed.
    pub seat_id: String,
    pub section: String,
    pub row: String,
    pub seat_number: i32,
    pub price: Decimal,
    pub event_id: i64,
}

/// Request to hold seats ahead of payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatHold {
    pub event_id: i64,
    pub user_id: i64,
    pub seat_ids: Vec<String>,
    /// The seating service releases the hold when this expires.
    pub ttl_seconds: u32,
}

/// Outcome of a reservation attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatReservation {
    pub success: bool,
    pub message: String,
    pub reserved_seats: Option<Vec<String>>,
}

/// Seats addressed by an allocation or release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatAssignment {
    pub event_id: i64,
    pub user_id: i64,
    pub seat_ids: Vec<String>,
}

/// Charge instruction for the payment service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeRequest {
    pub order_id: i64,
    pub user_id: i64,
    pub amount: Decimal,
    /// The payment service dedupes by this token.
    pub idempotency_key: String,
}

/// Terminal state reported for a charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChargeStatus {
    Success,
    Failed,
}

/// Outcome of a charge attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeOutcome {
    pub success: bool,
    pub payment_id: Option<String>,
    pub status: ChargeStatus,
    pub message: String,
    pub transaction_reference: Option<String>,
}

/// Refund instruction for the payment service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRequest {
    pub order_id: i64,
    pub amount: Decimal,
    pub reason: String,
}

/// Outcome of a refund attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundOutcome {
    pub success: bool,
    pub message: String,
}

/// Read access to the event catalog.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetches an event; `Ok(None)` when the catalog does not know it.
    async fn get_event(
        &self,
        ctx: &RequestContext,
        event_id: i64,
    ) -> Result<Option<EventInfo>, ClientError>;
}

/// Seat inventory operations.
#[async_trait]
pub trait SeatingClient: Send + Sync {
    /// Lists the sellable seats of an event; empty when none.
    async fn get_seats(
        &self,
        ctx: &RequestContext,
        event_id: i64,
    ) -> Result<Vec<Seat>, ClientError>;

    /// Holds seats for the duration of the hold's TTL.
    async fn reserve_seats(
        &self,
        ctx: &RequestContext,
        hold: &SeatHold,
    ) -> Result<SeatReservation, ClientError>;

    /// Converts a hold into a sale. Idempotent for a set already allocated
    /// to the same user.
    async fn allocate_seats(
        &self,
        ctx: &RequestContext,
        assignment: &SeatAssignment,
    ) -> Result<bool, ClientError>;

    /// Releases held seats. Safe on unknown or already-released ids.
    async fn release_seats(
        &self,
        ctx: &RequestContext,
        assignment: &SeatAssignment,
    ) -> Result<(), ClientError>;
}

/// Payment operations.
#[async_trait]
pub trait PaymentClient: Send + Sync {
    async fn charge(
        &self,
        ctx: &RequestContext,
        request: &ChargeRequest,
    ) -> Result<ChargeOutcome, ClientError>;

    async fn refund(
        &self,
        ctx: &RequestContext,
        request: &RefundRequest,
    ) -> Result<RefundOutcome, ClientError>;
}

/// Fan-out target for drained outbox records.
#[async_trait]
pub trait NotificationClient: Send + Sync {
    /// Delivers one outbox record. Must only succeed on a 2xx-equivalent
    /// answer; any other outcome is an error so the record stays queued.
    async fn send_event(&self, record: &OutboxRecord) -> Result<(), ClientError>;
}
