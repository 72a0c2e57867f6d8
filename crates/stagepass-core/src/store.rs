//! Store abstractions for orders, tickets, and the outbox.
//!
//! The three state transitions (`confirm_order`, `cancel_order`,
//! `refund_order`) each commit the order mutation, its side rows, and the
//! matching outbox record as a single unit, so an event can never be
//! published for a transition that did not happen, nor the reverse.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{
    NewOrder, NewOutboxRecord, NewTicket, Order, OrderStatistics, OutboxRecord, PaymentStatus,
    Ticket,
};

/// One page of the order listing.
#[derive(Debug, Clone)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    /// Total number of orders across all pages.
    pub total: u64,
}

/// Durable persistence for orders and tickets. Mutations are owned by the
/// orchestrator; everything else reads.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Round-trips to the backing database; used by the readiness probe.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Persists a new order with a server-assigned id.
    ///
    /// Fails with `StoreError::DuplicateIdempotencyKey` if another order
    /// already carries the same key.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError>;

    async fn find_order(&self, order_id: i64) -> Result<Option<Order>, StoreError>;

    async fn find_order_by_idempotency_key(&self, key: &str)
        -> Result<Option<Order>, StoreError>;

    async fn find_orders_by_user(&self, user_id: i64) -> Result<Vec<Order>, StoreError>;

    async fn find_orders_by_event(&self, event_id: i64) -> Result<Vec<Order>, StoreError>;

    async fn find_confirmed_orders_by_event(
        &self,
        event_id: i64,
    ) -> Result<Vec<Order>, StoreError>;

    /// Lists orders by ascending id. `page` is 1-based and both arguments
    /// are expected pre-clamped by the caller.
    async fn list_orders(&self, page: u32, page_size: u32) -> Result<OrderPage, StoreError>;

    async fn order_statistics(&self) -> Result<OrderStatistics, StoreError>;

    async fn find_ticket(&self, ticket_id: i64) -> Result<Option<Ticket>, StoreError>;

    async fn find_tickets_by_order(&self, order_id: i64) -> Result<Vec<Ticket>, StoreError>;

    async fn find_tickets_by_event(&self, event_id: i64) -> Result<Vec<Ticket>, StoreError>;

    /// Transitions the order to CONFIRMED / payment SUCCESS, bulk-inserts
    /// its tickets, and appends the outbox record, all in one commit.
    async fn confirm_order(
        &self,
        order_id: i64,
        tickets: Vec<NewTicket>,
        outbox: NewOutboxRecord,
    ) -> Result<(Order, Vec<Ticket>), StoreError>;

    /// Transitions the order to CANCELLED and appends the outbox record in
    /// one commit. `payment_status` replaces the stored value when given
    /// and leaves it untouched when `None`.
    async fn cancel_order(
        &self,
        order_id: i64,
        payment_status: Option<PaymentStatus>,
        outbox: NewOutboxRecord,
    ) -> Result<Order, StoreError>;

    /// Transitions the order to REFUNDED / payment REFUNDED and appends the
    /// outbox record in one commit.
    async fn refund_order(
        &self,
        order_id: i64,
        outbox: NewOutboxRecord,
    ) -> Result<Order, StoreError>;

    /// Parks the order in the operator-owned sink state. Intentionally
    /// appends no event: the business outcome is unresolved.
    async fn mark_fulfillment_failed(&self, order_id: i64) -> Result<Order, StoreError>;
}

/// Outbox side of the store, consumed by the dispatcher. The dispatcher
/// exclusively owns the `dispatched` flag.
#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Snapshot of all records not yet delivered, oldest first.
    async fn fetch_undispatched(&self) -> Result<Vec<OutboxRecord>, StoreError>;

    /// Marks a record delivered after a successful notification.
    async fn mark_dispatched(&self, id: Uuid) -> Result<(), StoreError>;
}
