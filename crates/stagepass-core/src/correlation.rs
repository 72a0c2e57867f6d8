//! Request-scoped correlation context.
//!
//! One logical id per request, adopted from the inbound HTTP header when
//! present and generated otherwise. The context is threaded explicitly
//! through the orchestrator and every outbound call; nothing relies on
//! global mutable state.

use uuid::Uuid;

/// Name of the HTTP header that carries the correlation id.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// Per-request context attached to logs, outbound calls, and emitted events.
#[derive(Debug, Clone)]
pub struct RequestContext {
    correlation_id: String,
}

impl RequestContext {
    /// Creates a context with a freshly generated correlation id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            correlation_id: Uuid::new_v4().to_string(),
        }
    }

    /// Creates a context that adopts a caller-supplied correlation id.
    #[must_use]
    pub fn with_correlation_id(correlation_id: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
        }
    }

    /// The correlation id for this request.
    #[must_use]
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
