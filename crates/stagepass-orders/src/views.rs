//! Read-side response snapshots.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stagepass_core::model::{Order, OrderStatus, PaymentStatus, Ticket};

/// Snapshot of an order including its issued tickets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub order_id: i64,
    pub user_id: i64,
    pub event_id: i64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub order_total: Decimal,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    pub tickets: Vec<TicketResponse>,
}

impl OrderResponse {
    /// Assembles the snapshot from a persisted order and its tickets.
    #[must_use]
    pub fn from_parts(order: Order, tickets: Vec<Ticket>) -> Self {
        Self {
            order_id: order.order_id,
            user_id: order.user_id,
            event_id: order.event_id,
            status: order.status,
            payment_status: order.payment_status,
            order_total: order.order_total,
            created_at: order.created_at,
            idempotency_key: order.idempotency_key,
            tickets: tickets.into_iter().map(TicketResponse::from).collect(),
        }
    }
}

/// Snapshot of a single ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketResponse {
    pub ticket_id: i64,
    pub order_id: i64,
    pub event_id: i64,
    pub seat_id: String,
    pub price_paid: Decimal,
}

impl From<Ticket> for TicketResponse {
    fn from(ticket: Ticket) -> Self {
        Self {
            ticket_id: ticket.ticket_id,
            order_id: ticket.order_id,
            event_id: ticket.event_id,
            seat_id: ticket.seat_id,
            price_paid: ticket.price_paid,
        }
    }
}

/// Page metadata for the order listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub total_pages: u64,
}

/// One page of orders with its metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedOrders {
    pub data: Vec<OrderResponse>,
    pub pagination: Pagination,
}

/// Outcome of one event-cancellation refund batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCancellationSummary {
    pub event_id: i64,
    pub refunded: u32,
    pub failed: u32,
    pub total_refunded: Decimal,
}
