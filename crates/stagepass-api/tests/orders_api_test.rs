//! End-to-end order flows over HTTP against the in-memory backends.

mod common;

use axum::http::StatusCode;

use common::{build_test_app, get_json, order_body, post_json, seed_sellable_event};

#[tokio::test]
async fn test_booking_happy_path() {
    // Arrange
    let t = build_test_app();
    let seat_ids = seed_sellable_event(&t, 25, 3);

    // Act
    let (status, created) = post_json(
        t.app.clone(),
        "/api/v1/orders",
        &order_body(1, 25, &seat_ids),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "CONFIRMED");
    assert_eq!(created["payment_status"], "SUCCESS");
    assert_eq!(created["order_total"], "315.00");
    assert_eq!(created["tickets"].as_array().unwrap().len(), 3);

    // The snapshot is readable back through every lookup route.
    let order_id = created["order_id"].as_i64().unwrap();
    let (status, fetched) = get_json(t.app.clone(), &format!("/api/v1/orders/{order_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["order_id"], order_id);

    let (_, by_user) = get_json(t.app.clone(), "/api/v1/orders/user/1").await;
    assert_eq!(by_user.as_array().unwrap().len(), 1);

    let (_, by_event) = get_json(t.app.clone(), "/api/v1/orders/event/25").await;
    assert_eq!(by_event.as_array().unwrap().len(), 1);

    let (_, tickets) = get_json(t.app.clone(), &format!("/v1/tickets/order/{order_id}")).await;
    assert_eq!(tickets.as_array().unwrap().len(), 3);

    let ticket_id = tickets[0]["ticket_id"].as_i64().unwrap();
    let (status, ticket) = get_json(t.app.clone(), &format!("/v1/tickets/{ticket_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ticket["order_id"], order_id);
}

#[tokio::test]
async fn test_sold_out_event_is_rejected() {
    // Arrange
    let t = build_test_app();
    t.catalog.insert(stagepass_test_support::sample_event(
        25,
        stagepass_core::clients::EventStatus::SoldOut,
    ));

    // Act
    let (status, json) = post_json(
        t.app.clone(),
        "/api/v1/orders",
        &order_body(1, 25, &["S-1".to_owned()]),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().contains("not on sale"));
    assert!(json["correlation_id"].as_str().is_some());
    assert!(t.seating.reservations().is_empty());
}

#[tokio::test]
async fn test_declined_payment_cancels_and_releases() {
    // Arrange
    let t = build_test_app();
    let seat_ids = seed_sellable_event(&t, 25, 2);
    t.payment.decline_charges("Card declined");

    // Act
    let (status, json) = post_json(
        t.app.clone(),
        "/api/v1/orders",
        &order_body(1, 25, &seat_ids),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "payment failed: Card declined");

    // The order is still visible, terminally cancelled, with no tickets.
    let (_, listed) = get_json(t.app.clone(), "/api/v1/orders/user/1").await;
    let order = &listed.as_array().unwrap()[0];
    assert_eq!(order["status"], "CANCELLED");
    assert_eq!(order["payment_status"], "FAILED");
    assert_eq!(order["tickets"].as_array().unwrap().len(), 0);

    assert_eq!(t.seating.releases().len(), 1);
}

#[tokio::test]
async fn test_idempotency_key_replay_returns_the_same_order() {
    // Arrange
    let t = build_test_app();
    let seat_ids = seed_sellable_event(&t, 25, 1);
    let mut body = order_body(1, 25, &seat_ids);
    body["idempotency_key"] = serde_json::json!("k-42");

    // Act
    let (first_status, first) = post_json(t.app.clone(), "/api/v1/orders", &body).await;
    let (second_status, second) = post_json(t.app.clone(), "/api/v1/orders", &body).await;

    // Assert
    assert_eq!(first_status, StatusCode::CREATED);
    assert_eq!(second_status, StatusCode::CREATED);
    assert_eq!(first, second);
    assert_eq!(t.payment.charges().len(), 1);

    let (_, listed) = get_json(t.app.clone(), "/api/v1/orders").await;
    assert_eq!(listed["pagination"]["total_items"], 1);
}

#[tokio::test]
async fn test_cancelling_a_confirmed_order_refunds_it() {
    // Arrange
    let t = build_test_app();
    let seat_ids = seed_sellable_event(&t, 25, 2);
    let (_, created) = post_json(
        t.app.clone(),
        "/api/v1/orders",
        &order_body(1, 25, &seat_ids),
    )
    .await;
    let order_id = created["order_id"].as_i64().unwrap();

    // Act
    let (status, cancelled) = post_json(
        t.app.clone(),
        &format!("/api/v1/orders/{order_id}/cancel"),
        &serde_json::json!({}),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "REFUNDED");
    assert_eq!(cancelled["payment_status"], "REFUNDED");
    assert_eq!(t.payment.refunds().len(), 1);
    assert_eq!(t.seating.releases().len(), 1);
}

#[tokio::test]
async fn test_cancel_of_unknown_order_is_404() {
    let t = build_test_app();

    let (status, json) = post_json(
        t.app.clone(),
        "/api/v1/orders/404/cancel",
        &serde_json::json!({}),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "order 404 not found");
}
