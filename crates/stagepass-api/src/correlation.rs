//! Correlation id propagation at the HTTP boundary.

use std::convert::Infallible;

use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;

use stagepass_core::correlation::{RequestContext, CORRELATION_ID_HEADER};

/// Extractor handing the request context to handlers. Prefers the context
/// placed by the middleware, falls back to reading the header, and
/// generates a fresh id when neither exists.
#[derive(Debug, Clone)]
pub struct Correlation(pub RequestContext);

impl<S> FromRequestParts<S> for Correlation
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<RequestContext>() {
            return Ok(Self(ctx.clone()));
        }
        Ok(Self(context_from_headers(&parts.headers)))
    }
}

/// Middleware: adopt the inbound `X-Correlation-ID` or generate one, expose
/// the context to handlers, and echo the id on the response.
pub async fn propagate_correlation(mut request: Request, next: Next) -> Response {
    let ctx = context_from_headers(request.headers());
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(ctx.correlation_id()) {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }
    response
}

fn context_from_headers(headers: &axum::http::HeaderMap) -> RequestContext {
    headers
        .get(CORRELATION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(RequestContext::with_correlation_id)
        .unwrap_or_default()
}
