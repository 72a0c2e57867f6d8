//! The order saga: validate, reserve, charge, allocate, issue tickets,
//! emit events.
//!
//! Every step is a fallible stage. Compensation runs in the error branch of
//! the stage that failed: a refused payment releases the held seats and
//! cancels the order; a fulfillment failure after a successful payment
//! attempts a refund, and if that refund is also refused the order is parked
//! in the operator-owned sink state with no further event.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use stagepass_core::clients::{
    CatalogClient, ChargeOutcome, ChargeRequest, ChargeStatus, EventInfo, EventStatus,
    PaymentClient, RefundOutcome, RefundRequest, Seat, SeatAssignment, SeatHold, SeatingClient,
};
use stagepass_core::correlation::RequestContext;
use stagepass_core::error::{ClientError, OrderError, StoreError};
use stagepass_core::model::{
    NewOrder, NewOutboxRecord, NewTicket, Order, OrderStatus, OutboxEventType, PaymentStatus,
};
use stagepass_core::money;
use stagepass_core::store::OrderStore;

use crate::events::{OrderCancelledPayload, OrderConfirmedPayload, OrderRefundedPayload};
use crate::views::{EventCancellationSummary, OrderResponse};

/// Tunables for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrderSettings {
    /// Sales tax applied on top of the seat subtotal.
    pub tax_rate: Decimal,
    /// TTL passed to the seating service when holding seats.
    pub reservation_ttl_seconds: u32,
}

impl Default for OrderSettings {
    fn default() -> Self {
        Self {
            tax_rate: money::DEFAULT_TAX_RATE,
            reservation_ttl_seconds: 900,
        }
    }
}

/// Request to create an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: i64,
    pub event_id: i64,
    pub seat_ids: Vec<String>,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// The saga engine. Exclusively owns order and ticket mutations and the
/// appending of outbox records.
pub struct OrderService {
    store: Arc<dyn OrderStore>,
    catalog: Arc<dyn CatalogClient>,
    seating: Arc<dyn SeatingClient>,
    payment: Arc<dyn PaymentClient>,
    settings: OrderSettings,
}

impl OrderService {
    #[must_use]
    pub fn new(
        store: Arc<dyn OrderStore>,
        catalog: Arc<dyn CatalogClient>,
        seating: Arc<dyn SeatingClient>,
        payment: Arc<dyn PaymentClient>,
        settings: OrderSettings,
    ) -> Self {
        Self {
            store,
            catalog,
            seating,
            payment,
            settings,
        }
    }

    /// Runs the full booking saga and returns the resulting order snapshot.
    ///
    /// # Errors
    ///
    /// Returns the error kind of the stage that failed; by then every
    /// applicable compensation has already run.
    pub async fn create_order(
        &self,
        ctx: &RequestContext,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, OrderError> {
        validate(&request)?;

        if let Some(key) = request.idempotency_key.as_deref() {
            if let Some(existing) = self.store.find_order_by_idempotency_key(key).await? {
                info!(
                    correlation_id = %ctx.correlation_id(),
                    order_id = existing.order_id,
                    "idempotent replay, returning stored order"
                );
                return self.snapshot(existing).await;
            }
        }

        let event = self
            .catalog
            .get_event(ctx, request.event_id)
            .await?
            .ok_or_else(|| {
                OrderError::NotFound(format!("event {} not found", request.event_id))
            })?;
        if event.status != EventStatus::OnSale {
            return Err(OrderError::NotSellable(format!(
                "event {} is not on sale: {}",
                request.event_id,
                event.status.as_str()
            )));
        }

        let seats = self.select_seats(ctx, &request).await?;
        self.reserve(ctx, &request).await?;

        let subtotal: Decimal = seats.iter().map(|s| s.price).sum();
        let totals = money::order_totals(subtotal, self.settings.tax_rate);

        let order = match self
            .store
            .insert_order(NewOrder {
                user_id: request.user_id,
                event_id: request.event_id,
                order_total: totals.total,
                idempotency_key: request.idempotency_key.clone(),
                created_at: Utc::now(),
            })
            .await
        {
            Ok(order) => order,
            Err(StoreError::DuplicateIdempotencyKey(key)) => {
                // A concurrent request with the same key committed between
                // the probe and this insert. Give the hold back and hand out
                // the winner's snapshot.
                self.release_best_effort(ctx, &assignment(&request)).await;
                let existing = self
                    .store
                    .find_order_by_idempotency_key(&key)
                    .await?
                    .ok_or_else(|| {
                        OrderError::Conflict(format!(
                            "idempotency key {key} is taken but its order is gone"
                        ))
                    })?;
                info!(
                    correlation_id = %ctx.correlation_id(),
                    order_id = existing.order_id,
                    "lost idempotency race, returning winning order"
                );
                return self.snapshot(existing).await;
            }
            Err(e) => return Err(e.into()),
        };
        metrics::counter!("orders_total").increment(1);

        match self.charge(ctx, &order, &request).await {
            Ok(outcome) if outcome.success && outcome.status == ChargeStatus::Success => {
                match self
                    .allocate_and_confirm(ctx, &order, &event, &seats)
                    .await
                {
                    Ok(response) => Ok(response),
                    Err(cause) => Err(self.compensate_after_payment(ctx, &order, cause).await),
                }
            }
            Ok(outcome) => {
                self.cancel_after_payment_failure(ctx, &order, &request, &outcome.message)
                    .await?;
                Err(OrderError::PaymentFailed(outcome.message))
            }
            Err(e) => {
                let message = e.to_string();
                self.cancel_after_payment_failure(ctx, &order, &request, &message)
                    .await?;
                Err(OrderError::UpstreamUnavailable(message))
            }
        }
    }

    /// Cancels an order, refunding it when its payment had succeeded.
    ///
    /// # Errors
    ///
    /// Fails with `NotFound` for an unknown order and `Conflict` when it is
    /// already cancelled or refunded.
    pub async fn cancel_order(
        &self,
        ctx: &RequestContext,
        order_id: i64,
    ) -> Result<OrderResponse, OrderError> {
        let order = self
            .store
            .find_order(order_id)
            .await?
            .ok_or_else(|| OrderError::NotFound(format!("order {order_id} not found")))?;
        match order.status {
            OrderStatus::Cancelled => {
                return Err(OrderError::Conflict(format!(
                    "order {order_id} is already cancelled"
                )));
            }
            OrderStatus::Refunded => {
                return Err(OrderError::Conflict(format!(
                    "order {order_id} is already refunded"
                )));
            }
            _ => {}
        }

        let tickets = self.store.find_tickets_by_order(order_id).await?;
        if !tickets.is_empty() {
            let seats = SeatAssignment {
                event_id: order.event_id,
                user_id: order.user_id,
                seat_ids: tickets.iter().map(|t| t.seat_id.clone()).collect(),
            };
            self.release_best_effort(ctx, &seats).await;
        }

        let updated = if order.payment_status == PaymentStatus::Success {
            match self.refund(ctx, &order, "order cancelled").await {
                Ok(outcome) if outcome.success => {
                    self.record_refund(ctx, &order, "order cancelled").await?
                }
                Ok(outcome) => {
                    error!(
                        correlation_id = %ctx.correlation_id(),
                        order_id,
                        message = %outcome.message,
                        "refund refused during cancellation, order cancelled without refund"
                    );
                    self.record_cancellation(ctx, &order, None, &outcome.message)
                        .await?
                }
                Err(e) => {
                    error!(
                        correlation_id = %ctx.correlation_id(),
                        order_id,
                        error = %e,
                        "refund unavailable during cancellation, order cancelled without refund"
                    );
                    self.record_cancellation(ctx, &order, None, &e.to_string())
                        .await?
                }
            }
        } else {
            self.record_cancellation(ctx, &order, None, "order cancelled")
                .await?
        };

        info!(
            correlation_id = %ctx.correlation_id(),
            order_id,
            status = updated.status.as_str(),
            "order cancellation finished"
        );
        self.snapshot(updated).await
    }

    /// Refunds every confirmed order of a cancelled event. Individual refund
    /// failures are logged and counted; they never abort the batch.
    ///
    /// # Errors
    ///
    /// Fails only when the confirmed-order listing itself cannot be read.
    pub async fn handle_event_cancelled(
        &self,
        ctx: &RequestContext,
        event_id: i64,
    ) -> Result<EventCancellationSummary, OrderError> {
        let confirmed = self.store.find_confirmed_orders_by_event(event_id).await?;
        let mut summary = EventCancellationSummary {
            event_id,
            refunded: 0,
            failed: 0,
            total_refunded: Decimal::ZERO,
        };

        for order in confirmed {
            match self.refund(ctx, &order, "event cancelled").await {
                Ok(outcome) if outcome.success => {
                    match self.record_refund(ctx, &order, "event cancelled").await {
                        Ok(_) => {
                            summary.refunded += 1;
                            summary.total_refunded += order.order_total;
                        }
                        Err(e) => {
                            warn!(
                                correlation_id = %ctx.correlation_id(),
                                order_id = order.order_id,
                                error = %e,
                                "refund succeeded but could not be recorded"
                            );
                            summary.failed += 1;
                        }
                    }
                }
                Ok(outcome) => {
                    warn!(
                        correlation_id = %ctx.correlation_id(),
                        order_id = order.order_id,
                        message = %outcome.message,
                        "refund refused for cancelled event"
                    );
                    summary.failed += 1;
                }
                Err(e) => {
                    warn!(
                        correlation_id = %ctx.correlation_id(),
                        order_id = order.order_id,
                        error = %e,
                        "refund unavailable for cancelled event"
                    );
                    summary.failed += 1;
                }
            }
        }

        info!(
            correlation_id = %ctx.correlation_id(),
            event_id,
            success = summary.refunded,
            failure = summary.failed,
            total_refunded = %summary.total_refunded,
            "event cancellation refund batch finished"
        );
        Ok(summary)
    }

    async fn snapshot(&self, order: Order) -> Result<OrderResponse, OrderError> {
        let tickets = self.store.find_tickets_by_order(order.order_id).await?;
        Ok(OrderResponse::from_parts(order, tickets))
    }

    async fn select_seats(
        &self,
        ctx: &RequestContext,
        request: &CreateOrderRequest,
    ) -> Result<Vec<Seat>, OrderError> {
        let listed = self.seating.get_seats(ctx, request.event_id).await?;
        let by_id: HashMap<&str, &Seat> =
            listed.iter().map(|s| (s.seat_id.as_str(), s)).collect();

        let mut selected = Vec::with_capacity(request.seat_ids.len());
        for seat_id in &request.seat_ids {
            let seat = by_id.get(seat_id.as_str()).ok_or_else(|| {
                OrderError::NotFound(format!(
                    "seat {seat_id} is not listed for event {}",
                    request.event_id
                ))
            })?;
            selected.push((*seat).clone());
        }
        Ok(selected)
    }

    async fn reserve(
        &self,
        ctx: &RequestContext,
        request: &CreateOrderRequest,
    ) -> Result<(), OrderError> {
        let hold = SeatHold {
            event_id: request.event_id,
            user_id: request.user_id,
            seat_ids: request.seat_ids.clone(),
            ttl_seconds: self.settings.reservation_ttl_seconds,
        };
        let reservation = match self.seating.reserve_seats(ctx, &hold).await {
            Ok(reservation) => reservation,
            Err(e) => {
                metrics::counter!("seat_reservations_failed").increment(1);
                return Err(e.into());
            }
        };
        if !reservation.success {
            metrics::counter!("seat_reservations_failed").increment(1);
            let message = if reservation.message.is_empty() {
                format!("seats unavailable for event {}", request.event_id)
            } else {
                reservation.message
            };
            return Err(OrderError::SeatUnavailable(message));
        }
        Ok(())
    }

    async fn charge(
        &self,
        ctx: &RequestContext,
        order: &Order,
        request: &CreateOrderRequest,
    ) -> Result<ChargeOutcome, ClientError> {
        let idempotency_key = request
            .idempotency_key
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        self.payment
            .charge(
                ctx,
                &ChargeRequest {
                    order_id: order.order_id,
                    user_id: order.user_id,
                    amount: order.order_total,
                    idempotency_key,
                },
            )
            .await
    }

    async fn allocate_and_confirm(
        &self,
        ctx: &RequestContext,
        order: &Order,
        event: &EventInfo,
        seats: &[Seat],
    ) -> Result<OrderResponse, OrderError> {
        let seat_ids: Vec<String> = seats.iter().map(|s| s.seat_id.clone()).collect();
        let allocated = self
            .seating
            .allocate_seats(
                ctx,
                &SeatAssignment {
                    event_id: order.event_id,
                    user_id: order.user_id,
                    seat_ids: seat_ids.clone(),
                },
            )
            .await?;
        if !allocated {
            return Err(OrderError::FulfillmentFailed(format!(
                "seat allocation refused for event {}",
                order.event_id
            )));
        }

        let now = Utc::now();
        let tickets: Vec<NewTicket> = seats
            .iter()
            .map(|seat| NewTicket {
                order_id: order.order_id,
                event_id: order.event_id,
                seat_id: seat.seat_id.clone(),
                price_paid: seat.price,
            })
            .collect();
        let outbox = NewOutboxRecord::order_event(
            order.order_id,
            OutboxEventType::OrderConfirmed,
            &OrderConfirmedPayload {
                order_id: order.order_id,
                user_id: order.user_id,
                event_id: order.event_id,
                event_title: event.title.clone(),
                order_total: order.order_total,
                seat_ids,
                confirmed_at: now,
                correlation_id: ctx.correlation_id().to_owned(),
            },
            ctx.correlation_id(),
            now,
        )?;

        let (confirmed, tickets) = self
            .store
            .confirm_order(order.order_id, tickets, outbox)
            .await?;
        info!(
            correlation_id = %ctx.correlation_id(),
            order_id = confirmed.order_id,
            order_total = %confirmed.order_total,
            tickets = tickets.len(),
            "order confirmed"
        );
        Ok(OrderResponse::from_parts(confirmed, tickets))
    }

    /// Error branch after a successful charge: try to give the money back,
    /// and surface the sink state when even that fails.
    async fn compensate_after_payment(
        &self,
        ctx: &RequestContext,
        order: &Order,
        cause: OrderError,
    ) -> OrderError {
        warn!(
            correlation_id = %ctx.correlation_id(),
            order_id = order.order_id,
            error = %cause,
            "fulfillment failed after successful payment, attempting refund"
        );
        let reason = format!("fulfillment failed: {cause}");
        match self.refund(ctx, order, &reason).await {
            Ok(outcome) if outcome.success => {
                match self.record_refund(ctx, order, &reason).await {
                    Ok(_) => {
                        info!(
                            correlation_id = %ctx.correlation_id(),
                            order_id = order.order_id,
                            "payment refunded after fulfillment failure"
                        );
                        OrderError::FulfillmentFailed(format!(
                            "{cause}; the payment was refunded"
                        ))
                    }
                    Err(e) => {
                        self.park_unresolved(
                            ctx,
                            order,
                            &format!("refund accepted upstream but not recorded: {e}"),
                        )
                        .await
                    }
                }
            }
            Ok(outcome) => self.park_unresolved(ctx, order, &outcome.message).await,
            Err(e) => self.park_unresolved(ctx, order, &e.to_string()).await,
        }
    }

    /// Sink state: payment kept, fulfillment unresolved. No event is
    /// appended because the business outcome is not settled.
    async fn park_unresolved(
        &self,
        ctx: &RequestContext,
        order: &Order,
        detail: &str,
    ) -> OrderError {
        error!(
            correlation_id = %ctx.correlation_id(),
            order_id = order.order_id,
            detail,
            "payment completed but fulfillment failed; manual intervention required"
        );
        if let Err(e) = self.store.mark_fulfillment_failed(order.order_id).await {
            error!(
                correlation_id = %ctx.correlation_id(),
                order_id = order.order_id,
                error = %e,
                "could not record fulfillment failure"
            );
        }
        OrderError::FulfillmentFailed(format!(
            "order {} charged but not fulfilled: {detail}",
            order.order_id
        ))
    }

    async fn cancel_after_payment_failure(
        &self,
        ctx: &RequestContext,
        order: &Order,
        request: &CreateOrderRequest,
        reason: &str,
    ) -> Result<(), OrderError> {
        metrics::counter!("payments_failed_total").increment(1);
        self.release_best_effort(ctx, &assignment(request)).await;
        self.record_cancellation(ctx, order, Some(PaymentStatus::Failed), reason)
            .await?;
        info!(
            correlation_id = %ctx.correlation_id(),
            order_id = order.order_id,
            reason,
            "order cancelled after payment failure"
        );
        Ok(())
    }

    async fn record_cancellation(
        &self,
        ctx: &RequestContext,
        order: &Order,
        payment_status: Option<PaymentStatus>,
        reason: &str,
    ) -> Result<Order, OrderError> {
        let now = Utc::now();
        let outbox = NewOutboxRecord::order_event(
            order.order_id,
            OutboxEventType::OrderCancelled,
            &OrderCancelledPayload {
                order_id: order.order_id,
                user_id: order.user_id,
                event_id: order.event_id,
                reason: reason.to_owned(),
                cancelled_at: now,
                correlation_id: ctx.correlation_id().to_owned(),
            },
            ctx.correlation_id(),
            now,
        )?;
        Ok(self
            .store
            .cancel_order(order.order_id, payment_status, outbox)
            .await?)
    }

    async fn record_refund(
        &self,
        ctx: &RequestContext,
        order: &Order,
        reason: &str,
    ) -> Result<Order, OrderError> {
        let now = Utc::now();
        let outbox = NewOutboxRecord::order_event(
            order.order_id,
            OutboxEventType::OrderRefunded,
            &OrderRefundedPayload {
                order_id: order.order_id,
                user_id: order.user_id,
                event_id: order.event_id,
                amount: order.order_total,
                reason: reason.to_owned(),
                refunded_at: now,
                correlation_id: ctx.correlation_id().to_owned(),
            },
            ctx.correlation_id(),
            now,
        )?;
        Ok(self.store.refund_order(order.order_id, outbox).await?)
    }

    async fn refund(
        &self,
        ctx: &RequestContext,
        order: &Order,
        reason: &str,
    ) -> Result<RefundOutcome, ClientError> {
        self.payment
            .refund(
                ctx,
                &RefundRequest {
                    order_id: order.order_id,
                    amount: order.order_total,
                    reason: reason.to_owned(),
                },
            )
            .await
    }

    /// Releasing seats never fails the parent operation; an expired hold
    /// frees them anyway.
    async fn release_best_effort(&self, ctx: &RequestContext, seats: &SeatAssignment) {
        if let Err(e) = self.seating.release_seats(ctx, seats).await {
            warn!(
                correlation_id = %ctx.correlation_id(),
                event_id = seats.event_id,
                error = %e,
                "seat release failed, the hold will expire on its own"
            );
        }
    }
}

fn assignment(request: &CreateOrderRequest) -> SeatAssignment {
    SeatAssignment {
        event_id: request.event_id,
        user_id: request.user_id,
        seat_ids: request.seat_ids.clone(),
    }
}

fn validate(request: &CreateOrderRequest) -> Result<(), OrderError> {
    if request.seat_ids.is_empty() {
        return Err(OrderError::Validation("seat_ids must not be empty".into()));
    }
    let mut seen = HashSet::with_capacity(request.seat_ids.len());
    for seat_id in &request.seat_ids {
        if !seen.insert(seat_id.as_str()) {
            return Err(OrderError::Validation(format!(
                "seat {seat_id} is requested more than once"
            )));
        }
    }
    Ok(())
}
