//! Error types shared across the service.

use thiserror::Error;

/// Failures surfaced by order orchestration.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Malformed request: empty or duplicated seat list, bad parameters.
    #[error("{0}")]
    Validation(String),

    /// Order, ticket, event, or seat does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The event exists but is not open for sale.
    #[error("{0}")]
    NotSellable(String),

    /// The seating service refused the reservation.
    #[error("{0}")]
    SeatUnavailable(String),

    /// Terminal refusal from the payment service.
    #[error("payment failed: {0}")]
    PaymentFailed(String),

    /// Timeout or transport failure from an upstream service.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The order is already in a terminal state that rejects the request.
    #[error("{0}")]
    Conflict(String),

    /// Payment succeeded but a later fulfillment step did not.
    #[error("fulfillment failed: {0}")]
    FulfillmentFailed(String),

    /// Persistence failure.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl From<ClientError> for OrderError {
    fn from(err: ClientError) -> Self {
        Self::UpstreamUnavailable(err.to_string())
    }
}

/// Failures raised by the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed row does not exist.
    #[error("{0}")]
    NotFound(String),

    /// An order with the same idempotency key is already persisted.
    #[error("idempotency key {0} is already used")]
    DuplicateIdempotencyKey(String),

    /// Connection, query, or mapping failure.
    #[error("database error: {0}")]
    Database(String),
}

/// Failures raised by outbound HTTP adapters.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The upstream could not be reached or timed out.
    #[error("{service} unreachable: {message}")]
    Unavailable {
        service: &'static str,
        message: String,
    },

    /// The upstream answered with a status outside the contract.
    #[error("{service} returned status {status}")]
    UnexpectedStatus { service: &'static str, status: u16 },

    /// The upstream answered with a body that could not be decoded.
    #[error("{service} response could not be decoded: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },
}
