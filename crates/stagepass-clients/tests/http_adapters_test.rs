//! Integration tests for the HTTP adapters against a local stub server.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use rust_decimal_macros::dec;

use stagepass_clients::{
    build_http_client, HttpCatalogClient, HttpNotificationClient, HttpPaymentClient,
    HttpSeatingClient,
};
use stagepass_core::clients::{
    CatalogClient, ChargeRequest, ChargeStatus, EventInfo, EventStatus, NotificationClient,
    PaymentClient, Seat, SeatAssignment, SeatHold, SeatingClient,
};
use stagepass_core::correlation::RequestContext;
use stagepass_core::error::ClientError;
use stagepass_core::model::{NewOutboxRecord, OutboxEventType, OutboxRecord};

/// Correlation ids seen by the stub, in arrival order.
type SeenIds = Arc<Mutex<Vec<String>>>;

fn record_correlation(seen: &SeenIds, headers: &HeaderMap) {
    let id = headers
        .get("X-Correlation-ID")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    seen.lock().unwrap().push(id);
}

fn sample_event_body(event_id: i64) -> EventInfo {
    EventInfo {
        event_id,
        title: "Harbor Lights Festival".to_owned(),
        status: EventStatus::OnSale,
        event_date: Utc::now(),
        venue_id: 3,
        venue_name: "Pier Six".to_owned(),
        city: "Baltimore".to_owned(),
        base_price: dec!(45.00),
    }
}

fn stub_router(seen: SeenIds) -> Router {
    async fn get_event(
        State(seen): State<SeenIds>,
        headers: HeaderMap,
        Path(event_id): Path<i64>,
    ) -> Result<Json<EventInfo>, StatusCode> {
        record_correlation(&seen, &headers);
        match event_id {
            25 => Ok(Json(sample_event_body(25))),
            500 => Err(StatusCode::INTERNAL_SERVER_ERROR),
            _ => Err(StatusCode::NOT_FOUND),
        }
    }

    async fn get_seats(Path(event_id): Path<i64>) -> Json<Vec<Seat>> {
        Json(vec![Seat {
            seat_id: "S-1".to_owned(),
            section: "A".to_owned(),
            row: "1".to_owned(),
            seat_number: 1,
            price: dec!(45.00),
            event_id,
        }])
    }

    async fn reserve(Json(hold): Json<SeatHold>) -> Json<serde_json::Value> {
        Json(serde_json::json!({
            "success": true,
            "message": "reserved",
            "reserved_seats": hold.seat_ids,
        }))
    }

    async fn allocate(Json(_): Json<SeatAssignment>) -> Json<serde_json::Value> {
        Json(serde_json::json!({"success": true}))
    }

    async fn release(Json(_): Json<SeatAssignment>) -> StatusCode {
        StatusCode::OK
    }

    async fn charge(Json(request): Json<ChargeRequest>) -> Json<serde_json::Value> {
        Json(serde_json::json!({
            "success": true,
            "payment_id": "pay-1",
            "status": "SUCCESS",
            "message": "approved",
            "transaction_reference": format!("txn-{}", request.order_id),
        }))
    }

    async fn refund(Json(_): Json<serde_json::Value>) -> Json<serde_json::Value> {
        Json(serde_json::json!({"success": true, "message": "refunded"}))
    }

    async fn notify(
        State(seen): State<SeenIds>,
        headers: HeaderMap,
        Json(record): Json<OutboxRecord>,
    ) -> StatusCode {
        record_correlation(&seen, &headers);
        if record.aggregate_id == "502" {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::OK
        }
    }

    Router::new()
        .route("/api/v1/events/{event_id}", get(get_event))
        .route("/api/v1/events/{event_id}/seats", get(get_seats))
        .route("/api/v1/reservations", post(reserve))
        .route("/api/v1/allocations", post(allocate))
        .route("/api/v1/releases", post(release))
        .route("/api/v1/charges", post(charge))
        .route("/api/v1/refunds", post(refund))
        .route("/api/v1/notifications", post(notify))
        .with_state(seen)
}

async fn serve_stub() -> (SocketAddr, SeenIds) {
    let seen: SeenIds = Arc::new(Mutex::new(Vec::new()));
    let router = stub_router(seen.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (addr, seen)
}

fn client() -> reqwest::Client {
    build_http_client(Duration::from_secs(5)).unwrap()
}

fn outbox_record(aggregate_id: &str) -> OutboxRecord {
    let new = NewOutboxRecord::order_event(
        1,
        OutboxEventType::OrderConfirmed,
        &serde_json::json!({"order_id": 1}),
        "corr-adapter",
        Utc::now(),
    )
    .unwrap();
    OutboxRecord {
        id: new.id,
        aggregate_type: new.aggregate_type,
        aggregate_id: aggregate_id.to_owned(),
        event_type: new.event_type,
        payload: new.payload,
        correlation_id: new.correlation_id,
        created_at: new.created_at,
        dispatched: false,
    }
}

#[tokio::test]
async fn test_get_event_decodes_body_and_sends_correlation_header() {
    let (addr, seen) = serve_stub().await;
    let catalog = HttpCatalogClient::new(client(), format!("http://{addr}/"));
    let ctx = RequestContext::with_correlation_id("corr-adapter");

    let event = catalog.get_event(&ctx, 25).await.unwrap().unwrap();

    assert_eq!(event.event_id, 25);
    assert_eq!(event.title, "Harbor Lights Festival");
    assert_eq!(event.status, EventStatus::OnSale);
    assert_eq!(seen.lock().unwrap().as_slice(), ["corr-adapter"]);
}

#[tokio::test]
async fn test_get_event_maps_404_to_none() {
    let (addr, _seen) = serve_stub().await;
    let catalog = HttpCatalogClient::new(client(), format!("http://{addr}"));

    let event = catalog.get_event(&RequestContext::new(), 404).await.unwrap();

    assert!(event.is_none());
}

#[tokio::test]
async fn test_get_event_surfaces_unexpected_status() {
    let (addr, _seen) = serve_stub().await;
    let catalog = HttpCatalogClient::new(client(), format!("http://{addr}"));

    let result = catalog.get_event(&RequestContext::new(), 500).await;

    match result.unwrap_err() {
        ClientError::UnexpectedStatus { service, status } => {
            assert_eq!(service, "catalog");
            assert_eq!(status, 500);
        }
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn test_seating_round_trip() {
    let (addr, _seen) = serve_stub().await;
    let seating = HttpSeatingClient::new(client(), format!("http://{addr}"));
    let ctx = RequestContext::new();

    let seats = seating.get_seats(&ctx, 25).await.unwrap();
    assert_eq!(seats.len(), 1);
    assert_eq!(seats[0].seat_id, "S-1");

    let reservation = seating
        .reserve_seats(
            &ctx,
            &SeatHold {
                event_id: 25,
                user_id: 1,
                seat_ids: vec!["S-1".to_owned()],
                ttl_seconds: 900,
            },
        )
        .await
        .unwrap();
    assert!(reservation.success);
    assert_eq!(reservation.reserved_seats, Some(vec!["S-1".to_owned()]));

    let assignment = SeatAssignment {
        event_id: 25,
        user_id: 1,
        seat_ids: vec!["S-1".to_owned()],
    };
    assert!(seating.allocate_seats(&ctx, &assignment).await.unwrap());
    seating.release_seats(&ctx, &assignment).await.unwrap();
}

#[tokio::test]
async fn test_charge_decodes_outcome() {
    let (addr, _seen) = serve_stub().await;
    let payment = HttpPaymentClient::new(client(), format!("http://{addr}"));

    let outcome = payment
        .charge(
            &RequestContext::new(),
            &ChargeRequest {
                order_id: 9,
                user_id: 1,
                amount: dec!(105.00),
                idempotency_key: "k-1".to_owned(),
            },
        )
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.status, ChargeStatus::Success);
    assert_eq!(outcome.transaction_reference.as_deref(), Some("txn-9"));
}

#[tokio::test]
async fn test_notification_requires_2xx() {
    let (addr, seen) = serve_stub().await;
    let notifier = HttpNotificationClient::new(client(), format!("http://{addr}"));

    notifier.send_event(&outbox_record("1")).await.unwrap();

    let result = notifier.send_event(&outbox_record("502")).await;
    match result.unwrap_err() {
        ClientError::UnexpectedStatus { service, status } => {
            assert_eq!(service, "notification");
            assert_eq!(status, 502);
        }
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
    // The adapter forwards the correlation id stored on the record.
    assert_eq!(
        seen.lock().unwrap().as_slice(),
        ["corr-adapter", "corr-adapter"]
    );
}

#[tokio::test]
async fn test_unreachable_upstream_is_unavailable() {
    // Bind and immediately drop a listener so the port refuses connections.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let catalog = HttpCatalogClient::new(client(), format!("http://{addr}"));
    let result = catalog.get_event(&RequestContext::new(), 25).await;

    assert!(matches!(
        result.unwrap_err(),
        ClientError::Unavailable { service: "catalog", .. }
    ));
}
