//! `PostgreSQL` implementation of the `OrderStore` and `OutboxStore` traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::Postgres;
use sqlx::{PgPool, Transaction};
use uuid::Uuid;

use stagepass_core::error::StoreError;
use stagepass_core::model::{
    NewOrder, NewOutboxRecord, NewTicket, Order, OrderStatistics, OrderStatus, OutboxEventType,
    OutboxRecord, PaymentStatus, Ticket,
};
use stagepass_core::store::{OrderPage, OrderStore, OutboxStore};

const SELECT_ORDER: &str = "SELECT id, user_id, event_id, status, payment_status, order_total, \
     idempotency_key, created_at FROM orders";

const SELECT_TICKET: &str =
    "SELECT id, order_id, event_id, seat_id, price_paid FROM tickets";

/// PostgreSQL-backed store over a shared connection pool.
#[derive(Debug, Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Creates a new `PgOrderStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_outbox(
        tx: &mut Transaction<'_, Postgres>,
        outbox: NewOutboxRecord,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO outbox_events \
             (id, aggregate_type, aggregate_id, event_type, payload, correlation_id, \
              created_at, dispatched) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, FALSE)",
        )
        .bind(outbox.id)
        .bind(&outbox.aggregate_type)
        .bind(&outbox.aggregate_id)
        .bind(outbox.event_type.as_str())
        .bind(&outbox.payload)
        .bind(&outbox.correlation_id)
        .bind(outbox.created_at)
        .execute(&mut **tx)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn update_order_status(
        tx: &mut Transaction<'_, Postgres>,
        order_id: i64,
        status: OrderStatus,
        payment_status: Option<PaymentStatus>,
    ) -> Result<Order, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(
            "UPDATE orders SET status = $2, payment_status = COALESCE($3, payment_status) \
             WHERE id = $1 \
             RETURNING id, user_id, event_id, status, payment_status, order_total, \
             idempotency_key, created_at",
        )
            .bind(order_id)
            .bind(status.as_str())
            .bind(payment_status.map(|p| p.as_str()))
            .fetch_optional(&mut **tx)
            .await
            .map_err(db_error)?
            .ok_or_else(|| StoreError::NotFound(format!("order {order_id} not found")))?;
        row.into_order()
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let key = order.idempotency_key.clone();
        let row = sqlx::query_as::<_, OrderRow>(
            "INSERT INTO orders \
             (user_id, event_id, status, payment_status, order_total, idempotency_key, \
              created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, user_id, event_id, status, payment_status, order_total, \
             idempotency_key, created_at",
        )
        .bind(order.user_id)
        .bind(order.event_id)
        .bind(OrderStatus::Created.as_str())
        .bind(PaymentStatus::Pending.as_str())
        .bind(order.order_total)
        .bind(&order.idempotency_key)
        .bind(order.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::DuplicateIdempotencyKey(key.unwrap_or_default())
            }
            _ => db_error(e),
        })?;
        row.into_order()
    }

    async fn find_order(&self, order_id: i64) -> Result<Option<Order>, StoreError> {
        let query = format!("{SELECT_ORDER} WHERE id = $1");
        let row = sqlx::query_as::<_, OrderRow>(&query)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        row.map(OrderRow::into_order).transpose()
    }

    async fn find_order_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<Order>, StoreError> {
        let query = format!("{SELECT_ORDER} WHERE idempotency_key = $1");
        let row = sqlx::query_as::<_, OrderRow>(&query)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        row.map(OrderRow::into_order).transpose()
    }

    async fn find_orders_by_user(&self, user_id: i64) -> Result<Vec<Order>, StoreError> {
        let query = format!("{SELECT_ORDER} WHERE user_id = $1 ORDER BY id");
        let rows = sqlx::query_as::<_, OrderRow>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        rows.into_iter().map(OrderRow::into_order).collect()
    }

    async fn find_orders_by_event(&self, event_id: i64) -> Result<Vec<Order>, StoreError> {
        let query = format!("{SELECT_ORDER} WHERE event_id = $1 ORDER BY id");
        let rows = sqlx::query_as::<_, OrderRow>(&query)
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        rows.into_iter().map(OrderRow::into_order).collect()
    }

    async fn find_confirmed_orders_by_event(
        &self,
        event_id: i64,
    ) -> Result<Vec<Order>, StoreError> {
        let query = format!("{SELECT_ORDER} WHERE event_id = $1 AND status = $2 ORDER BY id");
        let rows = sqlx::query_as::<_, OrderRow>(&query)
            .bind(event_id)
            .bind(OrderStatus::Confirmed.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        rows.into_iter().map(OrderRow::into_order).collect()
    }

    async fn list_orders(&self, page: u32, page_size: u32) -> Result<OrderPage, StoreError> {
        let offset = i64::from(page.saturating_sub(1)) * i64::from(page_size);
        let query = format!("{SELECT_ORDER} ORDER BY id LIMIT $1 OFFSET $2");
        let rows = sqlx::query_as::<_, OrderRow>(&query)
            .bind(i64::from(page_size))
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        let orders = rows
            .into_iter()
            .map(OrderRow::into_order)
            .collect::<Result<Vec<_>, _>>()?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(OrderPage {
            orders,
            total: total.max(0) as u64,
        })
    }

    async fn order_statistics(&self) -> Result<OrderStatistics, StoreError> {
        let row = sqlx::query_as::<_, StatisticsRow>(
            "SELECT COUNT(*) AS total_orders, \
             COUNT(*) FILTER (WHERE status = 'CONFIRMED') AS confirmed, \
             COUNT(*) FILTER (WHERE status = 'CANCELLED') AS cancelled, \
             COUNT(*) FILTER (WHERE status = 'REFUNDED') AS refunded, \
             COUNT(*) FILTER (WHERE status = 'PAYMENT_COMPLETED_BUT_FULFILLMENT_FAILED') \
                 AS fulfillment_failed, \
             COALESCE(SUM(order_total) FILTER (WHERE status = 'CONFIRMED'), 0) \
                 AS total_revenue \
             FROM orders",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(OrderStatistics {
            total_orders: row.total_orders,
            confirmed: row.confirmed,
            cancelled: row.cancelled,
            refunded: row.refunded,
            fulfillment_failed: row.fulfillment_failed,
            total_revenue: row.total_revenue,
        })
    }

    async fn find_ticket(&self, ticket_id: i64) -> Result<Option<Ticket>, StoreError> {
        let query = format!("{SELECT_TICKET} WHERE id = $1");
        let row = sqlx::query_as::<_, TicketRow>(&query)
            .bind(ticket_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(row.map(TicketRow::into_ticket))
    }

    async fn find_tickets_by_order(&self, order_id: i64) -> Result<Vec<Ticket>, StoreError> {
        let query = format!("{SELECT_TICKET} WHERE order_id = $1 ORDER BY id");
        let rows = sqlx::query_as::<_, TicketRow>(&query)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(TicketRow::into_ticket).collect())
    }

    async fn find_tickets_by_event(&self, event_id: i64) -> Result<Vec<Ticket>, StoreError> {
        let query = format!("{SELECT_TICKET} WHERE event_id = $1 ORDER BY id");
        let rows = sqlx::query_as::<_, TicketRow>(&query)
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(TicketRow::into_ticket).collect())
    }

    async fn confirm_order(
        &self,
        order_id: i64,
        tickets: Vec<NewTicket>,
        outbox: NewOutboxRecord,
    ) -> Result<(Order, Vec<Ticket>), StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let order = Self::update_order_status(
            &mut tx,
            order_id,
            OrderStatus::Confirmed,
            Some(PaymentStatus::Success),
        )
        .await?;

        let mut issued = Vec::with_capacity(tickets.len());
        for ticket in tickets {
            let row = sqlx::query_as::<_, TicketRow>(
                "INSERT INTO tickets (order_id, event_id, seat_id, price_paid) \
                 VALUES ($1, $2, $3, $4) \
                 RETURNING id, order_id, event_id, seat_id, price_paid",
            )
            .bind(ticket.order_id)
            .bind(ticket.event_id)
            .bind(&ticket.seat_id)
            .bind(ticket.price_paid)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error)?;
            issued.push(row.into_ticket());
        }

        Self::insert_outbox(&mut tx, outbox).await?;
        tx.commit().await.map_err(db_error)?;
        Ok((order, issued))
    }

    async fn cancel_order(
        &self,
        order_id: i64,
        payment_status: Option<PaymentStatus>,
        outbox: NewOutboxRecord,
    ) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let order =
            Self::update_order_status(&mut tx, order_id, OrderStatus::Cancelled, payment_status)
                .await?;
        Self::insert_outbox(&mut tx, outbox).await?;
        tx.commit().await.map_err(db_error)?;
        Ok(order)
    }

    async fn refund_order(
        &self,
        order_id: i64,
        outbox: NewOutboxRecord,
    ) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let order = Self::update_order_status(
            &mut tx,
            order_id,
            OrderStatus::Refunded,
            Some(PaymentStatus::Refunded),
        )
        .await?;
        Self::insert_outbox(&mut tx, outbox).await?;
        tx.commit().await.map_err(db_error)?;
        Ok(order)
    }

    async fn mark_fulfillment_failed(&self, order_id: i64) -> Result<Order, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(
            "UPDATE orders SET status = $2 WHERE id = $1 \
             RETURNING id, user_id, event_id, status, payment_status, order_total, \
             idempotency_key, created_at",
        )
        .bind(order_id)
        .bind(OrderStatus::PaymentCompletedButFulfillmentFailed.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or_else(|| StoreError::NotFound(format!("order {order_id} not found")))?;
        row.into_order()
    }
}

#[async_trait]
impl OutboxStore for PgOrderStore {
    async fn fetch_undispatched(&self) -> Result<Vec<OutboxRecord>, StoreError> {
        let rows = sqlx::query_as::<_, OutboxRow>(
            "SELECT id, aggregate_type, aggregate_id, event_type, payload, correlation_id, \
             created_at, dispatched \
             FROM outbox_events WHERE dispatched = FALSE ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.into_iter().map(OutboxRow::into_record).collect()
    }

    async fn mark_dispatched(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE outbox_events SET dispatched = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!(
                "outbox record {id} not found"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    event_id: i64,
    status: String,
    payment_status: String,
    order_total: Decimal,
    idempotency_key: Option<String>,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self) -> Result<Order, StoreError> {
        let status = OrderStatus::parse(&self.status)
            .ok_or_else(|| StoreError::Database(format!("unknown order status {}", self.status)))?;
        let payment_status = PaymentStatus::parse(&self.payment_status).ok_or_else(|| {
            StoreError::Database(format!("unknown payment status {}", self.payment_status))
        })?;
        Ok(Order {
            order_id: self.id,
            user_id: self.user_id,
            event_id: self.event_id,
            status,
            payment_status,
            order_total: self.order_total,
            created_at: self.created_at,
            idempotency_key: self.idempotency_key,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TicketRow {
    id: i64,
    order_id: i64,
    event_id: i64,
    seat_id: String,
    price_paid: Decimal,
}

impl TicketRow {
    fn into_ticket(self) -> Ticket {
        Ticket {
            ticket_id: self.id,
            order_id: self.order_id,
            event_id: self.event_id,
            seat_id: self.seat_id,
            price_paid: self.price_paid,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StatisticsRow {
    total_orders: i64,
    confirmed: i64,
    cancelled: i64,
    refunded: i64,
    fulfillment_failed: i64,
    total_revenue: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct OutboxRow {
    id: Uuid,
    aggregate_type: String,
    aggregate_id: String,
    event_type: String,
    payload: serde_json::Value,
    correlation_id: String,
    created_at: DateTime<Utc>,
    dispatched: bool,
}

impl OutboxRow {
    fn into_record(self) -> Result<OutboxRecord, StoreError> {
        let event_type = OutboxEventType::parse(&self.event_type).ok_or_else(|| {
            StoreError::Database(format!("unknown outbox event type {}", self.event_type))
        })?;
        Ok(OutboxRecord {
            id: self.id,
            aggregate_type: self.aggregate_type,
            aggregate_id: self.aggregate_id,
            event_type,
            payload: self.payload,
            correlation_id: self.correlation_id,
            created_at: self.created_at,
            dispatched: self.dispatched,
        })
    }
}

fn db_error(err: sqlx::Error) -> StoreError {
    StoreError::Database(err.to_string())
}
