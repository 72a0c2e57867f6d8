//! Test clients: stub and recording implementations of the upstream
//! service contracts.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use stagepass_core::clients::{
    CatalogClient, ChargeOutcome, ChargeRequest, ChargeStatus, EventInfo, EventStatus,
    NotificationClient, PaymentClient, RefundOutcome, RefundRequest, Seat, SeatAssignment,
    SeatHold, SeatReservation, SeatingClient,
};
use stagepass_core::correlation::RequestContext;
use stagepass_core::error::ClientError;
use stagepass_core::model::OutboxRecord;

/// Builds an event with fixed venue data and the given sales status.
#[must_use]
pub fn sample_event(event_id: i64, status: EventStatus) -> EventInfo {
    EventInfo {
        event_id,
        title: format!("Event {event_id}"),
        status,
        event_date: Utc.with_ymd_and_hms(2026, 9, 1, 19, 30, 0).unwrap(),
        venue_id: 7,
        venue_name: "Riverside Arena".to_owned(),
        city: "Rotterdam".to_owned(),
        base_price: Decimal::new(5000, 2),
    }
}

/// Builds a seat in a fixed section with the given id and price.
#[must_use]
pub fn sample_seat(event_id: i64, seat_id: &str, price: Decimal) -> Seat {
    Seat {
        seat_id: seat_id.to_owned(),
        section: "A".to_owned(),
        row: "1".to_owned(),
        seat_number: 1,
        price,
        event_id,
    }
}

/// A catalog backed by a fixed event map.
#[derive(Debug, Default)]
pub struct StubCatalogClient {
    events: Mutex<HashMap<i64, EventInfo>>,
}

impl StubCatalogClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_event(event: EventInfo) -> Self {
        let stub = Self::new();
        stub.insert(event);
        stub
    }

    pub fn insert(&self, event: EventInfo) {
        self.events.lock().unwrap().insert(event.event_id, event);
    }
}

#[async_trait]
impl CatalogClient for StubCatalogClient {
    async fn get_event(
        &self,
        _ctx: &RequestContext,
        event_id: i64,
    ) -> Result<Option<EventInfo>, ClientError> {
        Ok(self.events.lock().unwrap().get(&event_id).cloned())
    }
}

/// A seating service over an in-memory seat map that records every
/// reserve/allocate/release call and can be switched to refuse them.
#[derive(Debug, Default)]
pub struct RecordingSeatingClient {
    seats: Mutex<HashMap<i64, Vec<Seat>>>,
    reservations: Mutex<Vec<SeatHold>>,
    allocations: Mutex<Vec<SeatAssignment>>,
    releases: Mutex<Vec<SeatAssignment>>,
    refuse_reservations: Mutex<Option<String>>,
    refuse_allocations: Mutex<bool>,
    fail_releases: Mutex<bool>,
}

impl RecordingSeatingClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_seats(&self, event_id: i64, seats: Vec<Seat>) {
        self.seats.lock().unwrap().insert(event_id, seats);
    }

    /// Makes every subsequent reservation come back refused with `message`.
    pub fn refuse_reservations(&self, message: &str) {
        *self.refuse_reservations.lock().unwrap() = Some(message.to_owned());
    }

    /// Makes every subsequent allocation come back refused.
    pub fn refuse_allocations(&self) {
        *self.refuse_allocations.lock().unwrap() = true;
    }

    /// Makes every subsequent release fail with a transport error.
    pub fn fail_releases(&self) {
        *self.fail_releases.lock().unwrap() = true;
    }

    #[must_use]
    pub fn reservations(&self) -> Vec<SeatHold> {
        self.reservations.lock().unwrap().clone()
    }

    #[must_use]
    pub fn allocations(&self) -> Vec<SeatAssignment> {
        self.allocations.lock().unwrap().clone()
    }

    #[must_use]
    pub fn releases(&self) -> Vec<SeatAssignment> {
        self.releases.lock().unwrap().clone()
    }
}

#[async_trait]
impl SeatingClient for RecordingSeatingClient {
    async fn get_seats(
        &self,
        _ctx: &RequestContext,
        event_id: i64,
    ) -> Result<Vec<Seat>, ClientError> {
        Ok(self
            .seats
            .lock()
            .unwrap()
            .get(&event_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn reserve_seats(
        &self,
        _ctx: &RequestContext,
        hold: &SeatHold,
    ) -> Result<SeatReservation, ClientError> {
        self.reservations.lock().unwrap().push(hold.clone());
        if let Some(message) = self.refuse_reservations.lock().unwrap().clone() {
            return Ok(SeatReservation {
                success: false,
                message,
                reserved_seats: None,
            });
        }
        Ok(SeatReservation {
            success: true,
            message: "reserved".to_owned(),
            reserved_seats: Some(hold.seat_ids.clone()),
        })
    }

    async fn allocate_seats(
        &self,
        _ctx: &RequestContext,
        assignment: &SeatAssignment,
    ) -> Result<bool, ClientError> {
        self.allocations.lock().unwrap().push(assignment.clone());
        Ok(!*self.refuse_allocations.lock().unwrap())
    }

    async fn release_seats(
        &self,
        _ctx: &RequestContext,
        assignment: &SeatAssignment,
    ) -> Result<(), ClientError> {
        if *self.fail_releases.lock().unwrap() {
            return Err(ClientError::Unavailable {
                service: "seating",
                message: "connection refused".into(),
            });
        }
        self.releases.lock().unwrap().push(assignment.clone());
        Ok(())
    }
}

/// A payment service with scripted outcomes that records every charge and
/// refund request.
#[derive(Debug, Default)]
pub struct RecordingPaymentClient {
    charges: Mutex<Vec<ChargeRequest>>,
    refunds: Mutex<Vec<RefundRequest>>,
    decline_message: Mutex<Option<String>>,
    refuse_refund_message: Mutex<Option<String>>,
    error_on_charge: Mutex<bool>,
}

impl RecordingPaymentClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent charge come back declined with `message`.
    pub fn decline_charges(&self, message: &str) {
        *self.decline_message.lock().unwrap() = Some(message.to_owned());
    }

    /// Makes every subsequent charge fail with a transport error.
    pub fn error_on_charge(&self) {
        *self.error_on_charge.lock().unwrap() = true;
    }

    /// Makes every subsequent refund come back refused with `message`.
    pub fn refuse_refunds(&self, message: &str) {
        *self.refuse_refund_message.lock().unwrap() = Some(message.to_owned());
    }

    #[must_use]
    pub fn charges(&self) -> Vec<ChargeRequest> {
        self.charges.lock().unwrap().clone()
    }

    #[must_use]
    pub fn refunds(&self) -> Vec<RefundRequest> {
        self.refunds.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentClient for RecordingPaymentClient {
    async fn charge(
        &self,
        _ctx: &RequestContext,
        request: &ChargeRequest,
    ) -> Result<ChargeOutcome, ClientError> {
        self.charges.lock().unwrap().push(request.clone());
        if *self.error_on_charge.lock().unwrap() {
            return Err(ClientError::Unavailable {
                service: "payment",
                message: "request timed out".into(),
            });
        }
        if let Some(message) = self.decline_message.lock().unwrap().clone() {
            return Ok(ChargeOutcome {
                success: false,
                payment_id: None,
                status: ChargeStatus::Failed,
                message,
                transaction_reference: None,
            });
        }
        Ok(ChargeOutcome {
            success: true,
            payment_id: Some(Uuid::new_v4().to_string()),
            status: ChargeStatus::Success,
            message: "approved".to_owned(),
            transaction_reference: Some(format!("txn-{}", request.order_id)),
        })
    }

    async fn refund(
        &self,
        _ctx: &RequestContext,
        request: &RefundRequest,
    ) -> Result<RefundOutcome, ClientError> {
        self.refunds.lock().unwrap().push(request.clone());
        if let Some(message) = self.refuse_refund_message.lock().unwrap().clone() {
            return Ok(RefundOutcome {
                success: false,
                message,
            });
        }
        Ok(RefundOutcome {
            success: true,
            message: "refunded".to_owned(),
        })
    }
}

/// A notification sink that records delivered outbox ids and can be
/// switched to fail every delivery.
#[derive(Debug, Default)]
pub struct RecordingNotificationClient {
    sent: Mutex<Vec<Uuid>>,
    failing: Mutex<bool>,
}

impl RecordingNotificationClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    #[must_use]
    pub fn sent(&self) -> Vec<Uuid> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationClient for RecordingNotificationClient {
    async fn send_event(&self, record: &OutboxRecord) -> Result<(), ClientError> {
        if *self.failing.lock().unwrap() {
            return Err(ClientError::UnexpectedStatus {
                service: "notification",
                status: 502,
            });
        }
        self.sent.lock().unwrap().push(record.id);
        Ok(())
    }
}
