//! Inbound webhooks from the catalog service.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, instrument};

use stagepass_orders::views::EventCancellationSummary;

use crate::correlation::Correlation;
use crate::error::ApiError;
use crate::state::AppState;

/// Body of the event-cancelled webhook.
#[derive(Debug, Deserialize)]
pub struct EventCancelledNotice {
    pub event_id: i64,
    pub event_title: String,
    pub cancelled_at: DateTime<Utc>,
    pub reason: String,
}

/// POST /event-cancelled
#[instrument(skip(state, ctx, notice), fields(event_id = notice.event_id))]
async fn event_cancelled(
    State(state): State<AppState>,
    Correlation(ctx): Correlation,
    Json(notice): Json<EventCancelledNotice>,
) -> Result<Json<EventCancellationSummary>, ApiError> {
    info!(
        correlation_id = %ctx.correlation_id(),
        event_title = %notice.event_title,
        reason = %notice.reason,
        "handling event_cancelled webhook"
    );
    let summary = state
        .orders
        .handle_event_cancelled(&ctx, notice.event_id)
        .await
        .map_err(|e| ApiError::new(e, &ctx))?;
    Ok(Json(summary))
}

/// Returns the router for the webhooks context.
pub fn router() -> Router<AppState> {
    Router::new().route("/event-cancelled", post(event_cancelled))
}
