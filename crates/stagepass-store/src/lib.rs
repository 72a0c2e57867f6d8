//! PostgreSQL implementation of the order and outbox stores.

pub mod pg_order_store;

pub use pg_order_store::PgOrderStore;

/// Migrations embedded from the workspace `migrations/` directory, run at
/// service startup.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");
