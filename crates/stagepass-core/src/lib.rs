//! Shared domain model for the StagePass order service: entities, errors,
//! money arithmetic, correlation context, configuration, and the store and
//! client contracts the other crates implement.

pub mod clients;
pub mod config;
pub mod correlation;
pub mod error;
pub mod model;
pub mod money;
pub mod store;
