//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use metrics_exporter_prometheus::PrometheusBuilder;
use rust_decimal_macros::dec;
use tower::ServiceExt;

use stagepass_api::state::AppState;
use stagepass_core::clients::EventStatus;
use stagepass_orders::service::{OrderService, OrderSettings};
use stagepass_test_support::{
    sample_event, sample_seat, InMemoryOrderStore, RecordingPaymentClient,
    RecordingSeatingClient, StubCatalogClient,
};

/// Full application wired over the in-memory store and recording clients,
/// with handles kept for assertions.
pub struct TestApp {
    pub app: Router,
    pub store: Arc<InMemoryOrderStore>,
    pub catalog: Arc<StubCatalogClient>,
    pub seating: Arc<RecordingSeatingClient>,
    pub payment: Arc<RecordingPaymentClient>,
}

/// Builds the same route structure as `main` over the in-memory backends.
pub fn build_test_app() -> TestApp {
    let store = Arc::new(InMemoryOrderStore::new());
    let catalog = Arc::new(StubCatalogClient::new());
    let seating = Arc::new(RecordingSeatingClient::new());
    let payment = Arc::new(RecordingPaymentClient::new());
    let orders = Arc::new(OrderService::new(
        store.clone(),
        catalog.clone(),
        seating.clone(),
        payment.clone(),
        OrderSettings::default(),
    ));
    let state = AppState::new(
        orders,
        store.clone(),
        PrometheusBuilder::new().build_recorder().handle(),
    );

    TestApp {
        app: stagepass_api::app(state),
        store,
        catalog,
        seating,
        payment,
    }
}

/// Lists `count` seats priced 100.00 for an on-sale event and returns their
/// ids.
pub fn seed_sellable_event(test_app: &TestApp, event_id: i64, count: usize) -> Vec<String> {
    test_app
        .catalog
        .insert(sample_event(event_id, EventStatus::OnSale));
    let seats: Vec<_> = (1..=count)
        .map(|i| sample_seat(event_id, &format!("S-{i}"), dec!(100.00)))
        .collect();
    let seat_ids = seats.iter().map(|s| s.seat_id.clone()).collect();
    test_app.seating.put_seats(event_id, seats);
    seat_ids
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Standard create-order body for the given seats.
pub fn order_body(user_id: i64, event_id: i64, seat_ids: &[String]) -> serde_json::Value {
    serde_json::json!({
        "user_id": user_id,
        "event_id": event_id,
        "seat_ids": seat_ids,
    })
}
