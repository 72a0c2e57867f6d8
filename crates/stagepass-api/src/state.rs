//! Shared application state.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use stagepass_core::store::OrderStore;
use stagepass_orders::service::OrderService;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The saga engine; owns every order mutation.
    pub orders: Arc<OrderService>,
    /// Read side for queries and the readiness probe.
    pub store: Arc<dyn OrderStore>,
    /// Rendered by the metrics endpoint.
    pub metrics: PrometheusHandle,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        orders: Arc<OrderService>,
        store: Arc<dyn OrderStore>,
        metrics: PrometheusHandle,
    ) -> Self {
        Self {
            orders,
            store,
            metrics,
        }
    }
}
