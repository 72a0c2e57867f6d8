//! Background dispatcher that drains the transactional outbox.

mod dispatcher;

pub use dispatcher::{DispatchStats, OutboxDispatcher};
