//! StagePass order service entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use stagepass_api::state::AppState;
use stagepass_clients::{
    build_http_client, HttpCatalogClient, HttpNotificationClient, HttpPaymentClient,
    HttpSeatingClient,
};
use stagepass_core::config::Config;
use stagepass_core::store::{OrderStore, OutboxStore};
use stagepass_orders::service::{OrderService, OrderSettings};
use stagepass_outbox::OutboxDispatcher;
use stagepass_store::PgOrderStore;

#[tokio::main]
async fn main() {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting StagePass order service");

    let config = Config::from_env().expect("Invalid configuration");

    // Create database connection pool and bring the schema up to date.
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to PostgreSQL");
    stagepass_store::MIGRATOR
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install metrics recorder");

    // Wire the outbound adapters over one shared HTTP client.
    let http = build_http_client(config.services.request_timeout)
        .expect("Failed to build HTTP client");
    let catalog = Arc::new(HttpCatalogClient::new(
        http.clone(),
        &config.services.catalog_url,
    ));
    let seating = Arc::new(HttpSeatingClient::new(
        http.clone(),
        &config.services.seating_url,
    ));
    let payment = Arc::new(HttpPaymentClient::new(
        http.clone(),
        &config.services.payment_url,
    ));
    let notifier = Arc::new(HttpNotificationClient::new(
        http,
        &config.services.notification_url,
    ));

    let store = Arc::new(PgOrderStore::new(pool));
    let order_store: Arc<dyn OrderStore> = store.clone();
    let outbox_store: Arc<dyn OutboxStore> = store;

    let orders = Arc::new(OrderService::new(
        order_store.clone(),
        catalog,
        seating,
        payment,
        OrderSettings {
            tax_rate: config.tax_rate,
            reservation_ttl_seconds: config.reservation_ttl_seconds,
        },
    ));

    // The dispatcher drains the outbox on its own schedule for the life of
    // the process.
    let dispatcher = OutboxDispatcher::new(
        outbox_store,
        notifier,
        config.outbox_dispatch_interval,
    );
    tokio::spawn(dispatcher.run());

    let app = stagepass_api::app(AppState::new(orders, order_store, metrics));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid HOST:PORT combination");
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app).await.expect("Server error");
}
