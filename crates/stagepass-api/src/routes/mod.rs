//! Route modules, one per context.

pub mod health;
pub mod metrics;
pub mod orders;
pub mod tickets;
pub mod webhooks;
