//! Order orchestration for the StagePass order service: the saga that
//! turns a seat selection into a paid, fulfilled order, the read-side
//! queries, and the outbox event payloads.

pub mod events;
pub mod queries;
pub mod service;
pub mod views;
