//! Health, metrics, and correlation-header behavior of the full app.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use common::{build_test_app, get_json};

#[tokio::test]
async fn test_liveness_returns_200() {
    let t = build_test_app();

    let (status, json) = get_json(t.app.clone(), "/health/live").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_readiness_returns_200_when_store_answers() {
    let t = build_test_app();

    let (status, json) = get_json(t.app.clone(), "/health/ready").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ready");
}

#[tokio::test]
async fn test_metrics_endpoint_renders_prometheus_text() {
    let t = build_test_app();

    let request = Request::builder()
        .method("GET")
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let response = t.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn test_inbound_correlation_id_is_echoed() {
    let t = build_test_app();

    let request = Request::builder()
        .method("GET")
        .uri("/health/live")
        .header("X-Correlation-ID", "corr-echo-1")
        .body(Body::empty())
        .unwrap();
    let response = t.app.clone().oneshot(request).await.unwrap();

    assert_eq!(
        response
            .headers()
            .get("X-Correlation-ID")
            .and_then(|v| v.to_str().ok()),
        Some("corr-echo-1")
    );
}

#[tokio::test]
async fn test_missing_correlation_id_is_generated() {
    let t = build_test_app();

    let request = Request::builder()
        .method("GET")
        .uri("/health/live")
        .body(Body::empty())
        .unwrap();
    let response = t.app.clone().oneshot(request).await.unwrap();

    let echoed = response
        .headers()
        .get("X-Correlation-ID")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(!echoed.is_empty());
}

#[tokio::test]
async fn test_error_body_carries_the_inbound_correlation_id() {
    let t = build_test_app();

    let request = Request::builder()
        .method("GET")
        .uri("/api/v1/orders/404")
        .header("X-Correlation-ID", "corr-echo-2")
        .body(Body::empty())
        .unwrap();
    let response = t.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
    assert_eq!(json["correlation_id"], "corr-echo-2");
}
