//! Outbound HTTP adapters for the catalog, seating, payment, and
//! notification services. Each adapter implements its contract trait over a
//! shared `reqwest` client and propagates the request correlation id.

mod catalog;
mod http;
mod notification;
mod payment;
mod seating;

pub use catalog::HttpCatalogClient;
pub use http::build_http_client;
pub use notification::HttpNotificationClient;
pub use payment::HttpPaymentClient;
pub use seating::HttpSeatingClient;
