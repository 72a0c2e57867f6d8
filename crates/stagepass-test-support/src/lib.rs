//! Shared test mocks and utilities for the StagePass order service.

mod clients;
mod store;

pub use clients::{
    sample_event, sample_seat, RecordingNotificationClient, RecordingPaymentClient,
    RecordingSeatingClient, StubCatalogClient,
};
pub use store::{FailingOrderStore, InMemoryOrderStore};
