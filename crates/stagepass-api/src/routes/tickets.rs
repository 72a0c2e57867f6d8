//! Ticket lookup routes.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use tracing::instrument;

use stagepass_orders::queries;
use stagepass_orders::views::TicketResponse;

use crate::correlation::Correlation;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /{`ticket_id`}
#[instrument(skip(state, ctx))]
async fn get_ticket(
    State(state): State<AppState>,
    Correlation(ctx): Correlation,
    Path(ticket_id): Path<i64>,
) -> Result<Json<TicketResponse>, ApiError> {
    let response = queries::get_ticket(state.store.as_ref(), ticket_id)
        .await
        .map_err(|e| ApiError::new(e, &ctx))?;
    Ok(Json(response))
}

/// GET /order/{`order_id`}
#[instrument(skip(state, ctx))]
async fn tickets_for_order(
    State(state): State<AppState>,
    Correlation(ctx): Correlation,
    Path(order_id): Path<i64>,
) -> Result<Json<Vec<TicketResponse>>, ApiError> {
    let responses = queries::tickets_for_order(state.store.as_ref(), order_id)
        .await
        .map_err(|e| ApiError::new(e, &ctx))?;
    Ok(Json(responses))
}

/// GET /event/{`event_id`}
#[instrument(skip(state, ctx))]
async fn tickets_for_event(
    State(state): State<AppState>,
    Correlation(ctx): Correlation,
    Path(event_id): Path<i64>,
) -> Result<Json<Vec<TicketResponse>>, ApiError> {
    let responses = queries::tickets_for_event(state.store.as_ref(), event_id)
        .await
        .map_err(|e| ApiError::new(e, &ctx))?;
    Ok(Json(responses))
}

/// Returns the router for the tickets context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/order/{order_id}", get(tickets_for_order))
        .route("/event/{event_id}", get(tickets_for_event))
        .route("/{ticket_id}", get(get_ticket))
}
