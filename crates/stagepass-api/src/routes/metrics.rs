//! Prometheus exposition endpoint.

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// GET /metrics
async fn render(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Returns the metrics router.
pub fn router() -> Router<AppState> {
    Router::new().route("/metrics", get(render))
}
