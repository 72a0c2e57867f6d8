//! Integration tests for `PgOrderStore`. Each test runs against a fresh
//! database with the workspace migrations applied.

use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;
use sqlx::PgPool;
use uuid::Uuid;

use stagepass_core::error::StoreError;
use stagepass_core::model::{
    NewOrder, NewOutboxRecord, NewTicket, OrderStatus, OutboxEventType, PaymentStatus,
};
use stagepass_core::store::{OrderStore, OutboxStore};
use stagepass_store::PgOrderStore;

fn new_order(user_id: i64, event_id: i64, key: Option<&str>) -> NewOrder {
    NewOrder {
        user_id,
        event_id,
        order_total: dec!(105.00),
        idempotency_key: key.map(str::to_owned),
        // Whole seconds so the TIMESTAMPTZ round-trip compares exactly.
        created_at: Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap(),
    }
}

fn outbox_record(order_id: i64, event_type: OutboxEventType) -> NewOutboxRecord {
    NewOutboxRecord::order_event(
        order_id,
        event_type,
        &serde_json::json!({"order_id": order_id}),
        "corr-pg",
        Utc::now(),
    )
    .unwrap()
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_insert_and_find_round_trip(pool: PgPool) {
    let store = PgOrderStore::new(pool);

    let inserted = store.insert_order(new_order(1, 25, Some("k-1"))).await.unwrap();
    assert_eq!(inserted.status, OrderStatus::Created);
    assert_eq!(inserted.payment_status, PaymentStatus::Pending);
    assert_eq!(inserted.order_total, dec!(105.00));

    let found = store.find_order(inserted.order_id).await.unwrap().unwrap();
    assert_eq!(found, inserted);

    let by_key = store
        .find_order_by_idempotency_key("k-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_key.order_id, inserted.order_id);

    assert!(store.find_order(inserted.order_id + 1).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_duplicate_idempotency_key_is_rejected(pool: PgPool) {
    let store = PgOrderStore::new(pool);
    store.insert_order(new_order(1, 25, Some("k-1"))).await.unwrap();

    let result = store.insert_order(new_order(2, 25, Some("k-1"))).await;

    match result {
        Err(StoreError::DuplicateIdempotencyKey(key)) => assert_eq!(key, "k-1"),
        other => panic!("expected DuplicateIdempotencyKey, got {other:?}"),
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_orders_without_keys_do_not_collide(pool: PgPool) {
    let store = PgOrderStore::new(pool);

    store.insert_order(new_order(1, 25, None)).await.unwrap();
    store.insert_order(new_order(2, 25, None)).await.unwrap();

    let page = store.list_orders(1, 50).await.unwrap();
    assert_eq!(page.total, 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_confirm_transition_commits_order_tickets_and_outbox_together(pool: PgPool) {
    let store = PgOrderStore::new(pool);
    let order = store.insert_order(new_order(1, 25, None)).await.unwrap();

    let tickets = vec![
        NewTicket {
            order_id: order.order_id,
            event_id: 25,
            seat_id: "S-1".to_owned(),
            price_paid: dec!(50.00),
        },
        NewTicket {
            order_id: order.order_id,
            event_id: 25,
            seat_id: "S-2".to_owned(),
            price_paid: dec!(50.00),
        },
    ];
    let (confirmed, issued) = store
        .confirm_order(
            order.order_id,
            tickets,
            outbox_record(order.order_id, OutboxEventType::OrderConfirmed),
        )
        .await
        .unwrap();

    assert_eq!(confirmed.status, OrderStatus::Confirmed);
    assert_eq!(confirmed.payment_status, PaymentStatus::Success);
    assert_eq!(issued.len(), 2);

    let stored_tickets = store.find_tickets_by_order(order.order_id).await.unwrap();
    assert_eq!(stored_tickets, issued);
    assert_eq!(
        store.find_tickets_by_event(25).await.unwrap().len(),
        2
    );

    let pending = store.fetch_undispatched().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].event_type, OutboxEventType::OrderConfirmed);
    assert_eq!(pending[0].aggregate_id, order.order_id.to_string());
    assert_eq!(pending[0].correlation_id, "corr-pg");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_cancel_without_payment_status_keeps_stored_value(pool: PgPool) {
    let store = PgOrderStore::new(pool);
    let order = store.insert_order(new_order(1, 25, None)).await.unwrap();

    let cancelled = store
        .cancel_order(
            order.order_id,
            None,
            outbox_record(order.order_id, OutboxEventType::OrderCancelled),
        )
        .await
        .unwrap();

    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(cancelled.payment_status, PaymentStatus::Pending);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_cancel_with_payment_status_overrides(pool: PgPool) {
    let store = PgOrderStore::new(pool);
    let order = store.insert_order(new_order(1, 25, None)).await.unwrap();

    let cancelled = store
        .cancel_order(
            order.order_id,
            Some(PaymentStatus::Failed),
            outbox_record(order.order_id, OutboxEventType::OrderCancelled),
        )
        .await
        .unwrap();

    assert_eq!(cancelled.payment_status, PaymentStatus::Failed);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_refund_transition(pool: PgPool) {
    let store = PgOrderStore::new(pool);
    let order = store.insert_order(new_order(1, 25, None)).await.unwrap();
    store
        .confirm_order(
            order.order_id,
            vec![],
            outbox_record(order.order_id, OutboxEventType::OrderConfirmed),
        )
        .await
        .unwrap();

    let refunded = store
        .refund_order(
            order.order_id,
            outbox_record(order.order_id, OutboxEventType::OrderRefunded),
        )
        .await
        .unwrap();

    assert_eq!(refunded.status, OrderStatus::Refunded);
    assert_eq!(refunded.payment_status, PaymentStatus::Refunded);

    let confirmed_for_event = store.find_confirmed_orders_by_event(25).await.unwrap();
    assert!(confirmed_for_event.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_transition_on_missing_order_is_not_found(pool: PgPool) {
    let store = PgOrderStore::new(pool);

    let result = store
        .cancel_order(404, None, outbox_record(404, OutboxEventType::OrderCancelled))
        .await;

    assert!(matches!(result, Err(StoreError::NotFound(_))));
    // The aborted transaction must not leave an outbox row behind.
    assert!(store.fetch_undispatched().await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_mark_dispatched_flips_the_flag_once(pool: PgPool) {
    let store = PgOrderStore::new(pool);
    let order = store.insert_order(new_order(1, 25, None)).await.unwrap();
    store
        .confirm_order(
            order.order_id,
            vec![],
            outbox_record(order.order_id, OutboxEventType::OrderConfirmed),
        )
        .await
        .unwrap();

    let pending = store.fetch_undispatched().await.unwrap();
    assert_eq!(pending.len(), 1);

    store.mark_dispatched(pending[0].id).await.unwrap();
    assert!(store.fetch_undispatched().await.unwrap().is_empty());

    let missing = store.mark_dispatched(Uuid::new_v4()).await;
    assert!(matches!(missing, Err(StoreError::NotFound(_))));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_statistics_aggregates_by_status(pool: PgPool) {
    let store = PgOrderStore::new(pool);

    let first = store.insert_order(new_order(1, 25, None)).await.unwrap();
    store
        .confirm_order(
            first.order_id,
            vec![],
            outbox_record(first.order_id, OutboxEventType::OrderConfirmed),
        )
        .await
        .unwrap();

    let second = store.insert_order(new_order(2, 25, None)).await.unwrap();
    store
        .cancel_order(
            second.order_id,
            Some(PaymentStatus::Failed),
            outbox_record(second.order_id, OutboxEventType::OrderCancelled),
        )
        .await
        .unwrap();

    let stats = store.order_statistics().await.unwrap();
    assert_eq!(stats.total_orders, 2);
    assert_eq!(stats.confirmed, 1);
    assert_eq!(stats.cancelled, 1);
    assert_eq!(stats.total_revenue, dec!(105.00));
}
