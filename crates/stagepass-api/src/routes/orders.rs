//! Routes for order creation, lookup, cancellation, and statistics.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{info, instrument};

use stagepass_core::model::OrderStatistics;
use stagepass_orders::queries;
use stagepass_orders::service::CreateOrderRequest;
use stagepass_orders::views::{OrderResponse, PaginatedOrders};

use crate::correlation::Correlation;
use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters of the paginated listing.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<u32>,
}

/// POST /
#[instrument(skip(state, ctx, request), fields(user_id = request.user_id, event_id = request.event_id))]
async fn create_order(
    State(state): State<AppState>,
    Correlation(ctx): Correlation,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    info!(correlation_id = %ctx.correlation_id(), "handling create_order");
    let response = state
        .orders
        .create_order(&ctx, request)
        .await
        .map_err(|e| ApiError::new(e, &ctx))?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /{`order_id`}
#[instrument(skip(state, ctx))]
async fn get_order(
    State(state): State<AppState>,
    Correlation(ctx): Correlation,
    Path(order_id): Path<i64>,
) -> Result<Json<OrderResponse>, ApiError> {
    let response = queries::get_order(state.store.as_ref(), order_id)
        .await
        .map_err(|e| ApiError::new(e, &ctx))?;
    Ok(Json(response))
}

/// GET /user/{`user_id`}
#[instrument(skip(state, ctx))]
async fn orders_for_user(
    State(state): State<AppState>,
    Correlation(ctx): Correlation,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let responses = queries::orders_for_user(state.store.as_ref(), user_id)
        .await
        .map_err(|e| ApiError::new(e, &ctx))?;
    Ok(Json(responses))
}

/// GET /event/{`event_id`}
#[instrument(skip(state, ctx))]
async fn orders_for_event(
    State(state): State<AppState>,
    Correlation(ctx): Correlation,
    Path(event_id): Path<i64>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let responses = queries::orders_for_event(state.store.as_ref(), event_id)
        .await
        .map_err(|e| ApiError::new(e, &ctx))?;
    Ok(Json(responses))
}

/// GET /
#[instrument(skip(state, ctx, params))]
async fn list_orders(
    State(state): State<AppState>,
    Correlation(ctx): Correlation,
    Query(params): Query<ListParams>,
) -> Result<Json<PaginatedOrders>, ApiError> {
    let listed = queries::list_orders(state.store.as_ref(), params.page, params.page_size)
        .await
        .map_err(|e| ApiError::new(e, &ctx))?;
    Ok(Json(listed))
}

/// GET /statistics
#[instrument(skip(state, ctx))]
async fn statistics(
    State(state): State<AppState>,
    Correlation(ctx): Correlation,
) -> Result<Json<OrderStatistics>, ApiError> {
    let stats = queries::statistics(state.store.as_ref())
        .await
        .map_err(|e| ApiError::new(e, &ctx))?;
    Ok(Json(stats))
}

/// POST /{`order_id`}/cancel
#[instrument(skip(state, ctx))]
async fn cancel_order(
    State(state): State<AppState>,
    Correlation(ctx): Correlation,
    Path(order_id): Path<i64>,
) -> Result<Json<OrderResponse>, ApiError> {
    info!(correlation_id = %ctx.correlation_id(), order_id, "handling cancel_order");
    let response = state
        .orders
        .cancel_order(&ctx, order_id)
        .await
        .map_err(|e| ApiError::new(e, &ctx))?;
    Ok(Json(response))
}

/// Returns the router for the orders context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/statistics", get(statistics))
        .route("/user/{user_id}", get(orders_for_user))
        .route("/event/{event_id}", get(orders_for_event))
        .route("/{order_id}", get(get_order))
        .route("/{order_id}/cancel", post(cancel_order))
}
