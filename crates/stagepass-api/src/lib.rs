//! HTTP facade of the StagePass order service.

pub mod correlation;
pub mod error;
pub mod routes;
pub mod state;

use axum::{middleware, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builds the full application router.
#[must_use]
pub fn app(state: state::AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::metrics::router())
        .nest("/api/v1/orders", routes::orders::router())
        .nest("/v1/tickets", routes::tickets::router())
        .nest("/api/webhooks", routes::webhooks::router())
        .layer(middleware::from_fn(correlation::propagate_correlation))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
