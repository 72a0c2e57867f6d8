//! Test stores: in-memory and failing `OrderStore` implementations.

use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use stagepass_core::error::StoreError;
use stagepass_core::model::{
    NewOrder, NewOutboxRecord, NewTicket, Order, OrderStatistics, OrderStatus, OutboxRecord,
    PaymentStatus, Ticket,
};
use stagepass_core::store::{OrderPage, OrderStore, OutboxStore};

#[derive(Debug)]
struct Inner {
    orders: Vec<Order>,
    tickets: Vec<Ticket>,
    outbox: Vec<OutboxRecord>,
    next_order_id: i64,
    next_ticket_id: i64,
    insert_race_winner: Option<Order>,
    fail_mark_dispatched: bool,
}

/// A complete in-memory store with dense id assignment and idempotency-key
/// uniqueness, mirroring the relational implementation closely enough to
/// exercise the orchestrator and dispatcher against it.
#[derive(Debug)]
pub struct InMemoryOrderStore {
    inner: Mutex<Inner>,
}

impl InMemoryOrderStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                orders: Vec::new(),
                tickets: Vec::new(),
                outbox: Vec::new(),
                next_order_id: 1,
                next_ticket_id: 1,
                insert_race_winner: None,
                fail_mark_dispatched: false,
            }),
        }
    }

    /// Seeds an order directly, bypassing the saga.
    pub fn put_order(&self, order: Order) {
        self.inner.lock().unwrap().orders.push(order);
    }

    /// Seeds a ticket directly, bypassing the saga.
    pub fn put_ticket(&self, ticket: Ticket) {
        self.inner.lock().unwrap().tickets.push(ticket);
    }

    /// Seeds an undispatched outbox record directly, bypassing the saga.
    pub fn put_outbox_record(&self, record: NewOutboxRecord) {
        Self::push_outbox(&mut self.inner.lock().unwrap(), record);
    }

    /// Simulates a concurrent writer committing `winner` between the
    /// idempotency probe and the insert: the next `insert_order` call
    /// stores `winner` and reports a duplicate-key violation.
    pub fn inject_insert_race(&self, winner: Order) {
        self.inner.lock().unwrap().insert_race_winner = Some(winner);
    }

    /// Makes every subsequent `mark_dispatched` call fail.
    pub fn fail_mark_dispatched(&self) {
        self.inner.lock().unwrap().fail_mark_dispatched = true;
    }

    /// Snapshot of every outbox record, dispatched or not, in append order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn all_outbox_records(&self) -> Vec<OutboxRecord> {
        self.inner.lock().unwrap().outbox.clone()
    }

    fn update_order<F>(&self, order_id: i64, apply: F) -> Result<Order, StoreError>
    where
        F: FnOnce(&mut Order),
    {
        let mut inner = self.inner.lock().unwrap();
        let order = inner
            .orders
            .iter_mut()
            .find(|o| o.order_id == order_id)
            .ok_or_else(|| StoreError::NotFound(format!("order {order_id} not found")))?;
        apply(order);
        Ok(order.clone())
    }

    fn push_outbox(inner: &mut Inner, outbox: NewOutboxRecord) {
        inner.outbox.push(OutboxRecord {
            id: outbox.id,
            aggregate_type: outbox.aggregate_type,
            aggregate_id: outbox.aggregate_id,
            event_type: outbox.event_type,
            payload: outbox.payload,
            correlation_id: outbox.correlation_id,
            created_at: outbox.created_at,
            dispatched: false,
        });
    }
}

impl Default for InMemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(winner) = inner.insert_race_winner.take() {
            let key = winner.idempotency_key.clone().unwrap_or_default();
            inner.orders.push(winner);
            return Err(StoreError::DuplicateIdempotencyKey(key));
        }

        if let Some(key) = order.idempotency_key.as_deref() {
            if inner
                .orders
                .iter()
                .any(|o| o.idempotency_key.as_deref() == Some(key))
            {
                return Err(StoreError::DuplicateIdempotencyKey(key.to_owned()));
            }
        }

        let persisted = Order {
            order_id: inner.next_order_id,
            user_id: order.user_id,
            event_id: order.event_id,
            status: OrderStatus::Created,
            payment_status: PaymentStatus::Pending,
            order_total: order.order_total,
            created_at: order.created_at,
            idempotency_key: order.idempotency_key,
        };
        inner.next_order_id += 1;
        inner.orders.push(persisted.clone());
        Ok(persisted)
    }

    async fn find_order(&self, order_id: i64) -> Result<Option<Order>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.orders.iter().find(|o| o.order_id == order_id).cloned())
    }

    async fn find_order_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<Order>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .orders
            .iter()
            .find(|o| o.idempotency_key.as_deref() == Some(key))
            .cloned())
    }

    async fn find_orders_by_user(&self, user_id: i64) -> Result<Vec<Order>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_orders_by_event(&self, event_id: i64) -> Result<Vec<Order>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .orders
            .iter()
            .filter(|o| o.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn find_confirmed_orders_by_event(
        &self,
        event_id: i64,
    ) -> Result<Vec<Order>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .orders
            .iter()
            .filter(|o| o.event_id == event_id && o.status == OrderStatus::Confirmed)
            .cloned()
            .collect())
    }

    async fn list_orders(&self, page: u32, page_size: u32) -> Result<OrderPage, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut orders: Vec<Order> = inner.orders.clone();
        orders.sort_by_key(|o| o.order_id);
        let total = orders.len() as u64;
        let offset = (page.saturating_sub(1) as usize) * page_size as usize;
        let orders = orders
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .collect();
        Ok(OrderPage { orders, total })
    }

    async fn order_statistics(&self) -> Result<OrderStatistics, StoreError> {
        let inner = self.inner.lock().unwrap();
        let count = |status: OrderStatus| {
            inner.orders.iter().filter(|o| o.status == status).count() as i64
        };
        Ok(OrderStatistics {
            total_orders: inner.orders.len() as i64,
            confirmed: count(OrderStatus::Confirmed),
            cancelled: count(OrderStatus::Cancelled),
            refunded: count(OrderStatus::Refunded),
            fulfillment_failed: count(OrderStatus::PaymentCompletedButFulfillmentFailed),
            total_revenue: inner
                .orders
                .iter()
                .filter(|o| o.status == OrderStatus::Confirmed)
                .map(|o| o.order_total)
                .sum::<Decimal>(),
        })
    }

    async fn find_ticket(&self, ticket_id: i64) -> Result<Option<Ticket>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .tickets
            .iter()
            .find(|t| t.ticket_id == ticket_id)
            .cloned())
    }

    async fn find_tickets_by_order(&self, order_id: i64) -> Result<Vec<Ticket>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .tickets
            .iter()
            .filter(|t| t.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn find_tickets_by_event(&self, event_id: i64) -> Result<Vec<Ticket>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .tickets
            .iter()
            .filter(|t| t.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn confirm_order(
        &self,
        order_id: i64,
        tickets: Vec<NewTicket>,
        outbox: NewOutboxRecord,
    ) -> Result<(Order, Vec<Ticket>), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let order = inner
            .orders
            .iter_mut()
            .find(|o| o.order_id == order_id)
            .ok_or_else(|| StoreError::NotFound(format!("order {order_id} not found")))?;
        order.status = OrderStatus::Confirmed;
        order.payment_status = PaymentStatus::Success;
        let order = order.clone();

        let mut issued = Vec::with_capacity(tickets.len());
        for ticket in tickets {
            let persisted = Ticket {
                ticket_id: inner.next_ticket_id,
                order_id: ticket.order_id,
                event_id: ticket.event_id,
                seat_id: ticket.seat_id,
                price_paid: ticket.price_paid,
            };
            inner.next_ticket_id += 1;
            inner.tickets.push(persisted.clone());
            issued.push(persisted);
        }

        Self::push_outbox(&mut inner, outbox);
        Ok((order, issued))
    }

    async fn cancel_order(
        &self,
        order_id: i64,
        payment_status: Option<PaymentStatus>,
        outbox: NewOutboxRecord,
    ) -> Result<Order, StoreError> {
        let order = self.update_order(order_id, |order| {
            order.status = OrderStatus::Cancelled;
            if let Some(payment_status) = payment_status {
                order.payment_status = payment_status;
            }
        })?;
        Self::push_outbox(&mut self.inner.lock().unwrap(), outbox);
        Ok(order)
    }

    async fn refund_order(
        &self,
        order_id: i64,
        outbox: NewOutboxRecord,
    ) -> Result<Order, StoreError> {
        let order = self.update_order(order_id, |order| {
            order.status = OrderStatus::Refunded;
            order.payment_status = PaymentStatus::Refunded;
        })?;
        Self::push_outbox(&mut self.inner.lock().unwrap(), outbox);
        Ok(order)
    }

    async fn mark_fulfillment_failed(&self, order_id: i64) -> Result<Order, StoreError> {
        self.update_order(order_id, |order| {
            order.status = OrderStatus::PaymentCompletedButFulfillmentFailed;
        })
    }
}

#[async_trait]
impl OutboxStore for InMemoryOrderStore {
    async fn fetch_undispatched(&self) -> Result<Vec<OutboxRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .outbox
            .iter()
            .filter(|r| !r.dispatched)
            .cloned()
            .collect())
    }

    async fn mark_dispatched(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_mark_dispatched {
            return Err(StoreError::Database("connection refused".into()));
        }
        let record = inner
            .outbox
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("outbox record {id} not found")))?;
        record.dispatched = true;
        Ok(())
    }
}

/// A store that always returns a database error. Useful for testing
/// error-handling paths.
#[derive(Debug, Default)]
pub struct FailingOrderStore;

fn refused<T>() -> Result<T, StoreError> {
    Err(StoreError::Database("connection refused".into()))
}

#[async_trait]
impl OrderStore for FailingOrderStore {
    async fn ping(&self) -> Result<(), StoreError> {
        refused()
    }

    async fn insert_order(&self, _order: NewOrder) -> Result<Order, StoreError> {
        refused()
    }

    async fn find_order(&self, _order_id: i64) -> Result<Option<Order>, StoreError> {
        refused()
    }

    async fn find_order_by_idempotency_key(
        &self,
        _key: &str,
    ) -> Result<Option<Order>, StoreError> {
        refused()
    }

    async fn find_orders_by_user(&self, _user_id: i64) -> Result<Vec<Order>, StoreError> {
        refused()
    }

    async fn find_orders_by_event(&self, _event_id: i64) -> Result<Vec<Order>, StoreError> {
        refused()
    }

    async fn find_confirmed_orders_by_event(
        &self,
        _event_id: i64,
    ) -> Result<Vec<Order>, StoreError> {
        refused()
    }

    async fn list_orders(&self, _page: u32, _page_size: u32) -> Result<OrderPage, StoreError> {
        refused()
    }

    async fn order_statistics(&self) -> Result<OrderStatistics, StoreError> {
        refused()
    }

    async fn find_ticket(&self, _ticket_id: i64) -> Result<Option<Ticket>, StoreError> {
        refused()
    }

    async fn find_tickets_by_order(&self, _order_id: i64) -> Result<Vec<Ticket>, StoreError> {
        refused()
    }

    async fn find_tickets_by_event(&self, _event_id: i64) -> Result<Vec<Ticket>, StoreError> {
        refused()
    }

    async fn confirm_order(
        &self,
        _order_id: i64,
        _tickets: Vec<NewTicket>,
        _outbox: NewOutboxRecord,
    ) -> Result<(Order, Vec<Ticket>), StoreError> {
        refused()
    }

    async fn cancel_order(
        &self,
        _order_id: i64,
        _payment_status: Option<PaymentStatus>,
        _outbox: NewOutboxRecord,
    ) -> Result<Order, StoreError> {
        refused()
    }

    async fn refund_order(
        &self,
        _order_id: i64,
        _outbox: NewOutboxRecord,
    ) -> Result<Order, StoreError> {
        refused()
    }

    async fn mark_fulfillment_failed(&self, _order_id: i64) -> Result<Order, StoreError> {
        refused()
    }
}

#[async_trait]
impl OutboxStore for FailingOrderStore {
    async fn fetch_undispatched(&self) -> Result<Vec<OutboxRecord>, StoreError> {
        refused()
    }

    async fn mark_dispatched(&self, _id: Uuid) -> Result<(), StoreError> {
        refused()
    }
}
