//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use stagepass_core::correlation::RequestContext;
use stagepass_core::error::OrderError;

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub message: String,
    /// The id to quote when reporting the failure.
    pub correlation_id: String,
}

/// HTTP wrapper around `OrderError` carrying the request correlation id.
#[derive(Debug)]
pub struct ApiError {
    error: OrderError,
    correlation_id: String,
}

impl ApiError {
    #[must_use]
    pub fn new(error: OrderError, ctx: &RequestContext) -> Self {
        Self {
            error,
            correlation_id: ctx.correlation_id().to_owned(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.error {
            OrderError::Validation(_)
            | OrderError::NotSellable(_)
            | OrderError::SeatUnavailable(_)
            | OrderError::PaymentFailed(_)
            | OrderError::Conflict(_) => StatusCode::BAD_REQUEST,
            OrderError::NotFound(_) => StatusCode::NOT_FOUND,
            OrderError::UpstreamUnavailable(_)
            | OrderError::FulfillmentFailed(_)
            | OrderError::Storage(_) => {
                tracing::error!(
                    correlation_id = %self.correlation_id,
                    error = %self.error,
                    "request failed"
                );
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ErrorBody {
            message: self.error.to_string(),
            correlation_id: self.correlation_id,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagepass_core::error::StoreError;

    fn status_of(error: OrderError) -> StatusCode {
        let ctx = RequestContext::with_correlation_id("corr-err");
        ApiError::new(error, &ctx).into_response().status()
    }

    #[test]
    fn test_validation_maps_to_400() {
        assert_eq!(
            status_of(OrderError::Validation("empty".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_not_sellable_maps_to_400() {
        assert_eq!(
            status_of(OrderError::NotSellable("sold out".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_seat_unavailable_maps_to_400() {
        assert_eq!(
            status_of(OrderError::SeatUnavailable("held".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_payment_failed_maps_to_400() {
        assert_eq!(
            status_of(OrderError::PaymentFailed("declined".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_conflict_maps_to_400() {
        assert_eq!(
            status_of(OrderError::Conflict("already cancelled".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_not_found_maps_to_404() {
        assert_eq!(
            status_of(OrderError::NotFound("missing".into())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_upstream_unavailable_maps_to_500() {
        assert_eq!(
            status_of(OrderError::UpstreamUnavailable("timeout".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_storage_maps_to_500() {
        assert_eq!(
            status_of(OrderError::Storage(StoreError::Database("down".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
