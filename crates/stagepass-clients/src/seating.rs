//! Seating service adapter.

use async_trait::async_trait;
use serde::Deserialize;

use stagepass_core::clients::{
    Seat, SeatAssignment, SeatHold, SeatReservation, SeatingClient,
};
use stagepass_core::correlation::{RequestContext, CORRELATION_ID_HEADER};
use stagepass_core::error::ClientError;

use crate::http::{decode_error, transport_error, trimmed_base};

const SERVICE: &str = "seating";

/// Wire shape of an allocation answer.
#[derive(Debug, Deserialize)]
struct AllocationReply {
    success: bool,
}

/// HTTP adapter for the seating service.
#[derive(Debug, Clone)]
pub struct HttpSeatingClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSeatingClient {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: trimmed_base(base_url),
        }
    }

    fn check_status(status: reqwest::StatusCode) -> Result<(), ClientError> {
        if status.is_success() {
            Ok(())
        } else {
            Err(ClientError::UnexpectedStatus {
                service: SERVICE,
                status: status.as_u16(),
            })
        }
    }
}

#[async_trait]
impl SeatingClient for HttpSeatingClient {
    async fn get_seats(
        &self,
        ctx: &RequestContext,
        event_id: i64,
    ) -> Result<Vec<Seat>, ClientError> {
        let url = format!("{}/api/v1/events/{event_id}/seats", self.base_url);
        let response = self
            .client
            .get(url)
            .header(CORRELATION_ID_HEADER, ctx.correlation_id())
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, &e))?;
        Self::check_status(response.status())?;
        response
            .json::<Vec<Seat>>()
            .await
            .map_err(|e| decode_error(SERVICE, &e))
    }

    async fn reserve_seats(
        &self,
        ctx: &RequestContext,
        hold: &SeatHold,
    ) -> Result<SeatReservation, ClientError> {
        let url = format!("{}/api/v1/reservations", self.base_url);
        let response = self
            .client
            .post(url)
            .header(CORRELATION_ID_HEADER, ctx.correlation_id())
            .json(hold)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, &e))?;
        Self::check_status(response.status())?;
        response
            .json::<SeatReservation>()
            .await
            .map_err(|e| decode_error(SERVICE, &e))
    }

    async fn allocate_seats(
        &self,
        ctx: &RequestContext,
        assignment: &SeatAssignment,
    ) -> Result<bool, ClientError> {
        let url = format!("{}/api/v1/allocations", self.base_url);
        let response = self
            .client
            .post(url)
            .header(CORRELATION_ID_HEADER, ctx.correlation_id())
            .json(assignment)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, &e))?;
        Self::check_status(response.status())?;
        let reply = response
            .json::<AllocationReply>()
            .await
            .map_err(|e| decode_error(SERVICE, &e))?;
        Ok(reply.success)
    }

    async fn release_seats(
        &self,
        ctx: &RequestContext,
        assignment: &SeatAssignment,
    ) -> Result<(), ClientError> {
        let url = format!("{}/api/v1/releases", self.base_url);
        let response = self
            .client
            .post(url)
            .header(CORRELATION_ID_HEADER, ctx.correlation_id())
            .json(assignment)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, &e))?;
        Self::check_status(response.status())
    }
}
