//! Request logging middleware
//!
//! Tags every request with a trace id (propagated from `x-trace-id` /
//! `x-request-id` or freshly generated), logs it on the way in and out, and
//! echoes the id back in the response headers.

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Header name for trace ID
pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Header name for request ID (alias for trace ID)
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Trace id of the current request, stored in request extensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceId(pub String);

impl TraceId {
    /// Generate a new trace ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Reuse the caller's id when one of the trace headers is present.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        [TRACE_ID_HEADER, REQUEST_ID_HEADER]
            .iter()
            .find_map(|name| {
                headers
                    .get(*name)
                    .and_then(|v| v.to_str().ok())
                    .filter(|v| !v.is_empty())
            })
            .map(|id| Self(id.to_string()))
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Log each request and its outcome, and set the trace headers.
///
/// ```ignore
/// Router::new()
///     .layer(axum::middleware::from_fn(log_request))
/// ```
pub async fn log_request(mut request: Request, next: Next) -> Response<Body> {
    let start = Instant::now();
    let trace_id = TraceId::from_headers(request.headers());

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let content_length = request
        .headers()
        .get(axum::http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);

    tracing::info!(
        trace_id = %trace_id,
        method = %method,
        path = %path,
        content_length,
        "Incoming request"
    );

    request.extensions_mut().insert(trace_id.clone());

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        method = %method,
        path = %path,
    );
    let mut response = next.run(request).instrument(span).await;

    let status = response.status();
    let duration_ms = format!("{:.2}", start.elapsed().as_secs_f64() * 1000.0);
    log_outcome(&trace_id, &method, &path, status, &duration_ms);

    if let Ok(header_value) = HeaderValue::from_str(trace_id.as_str()) {
        response
            .headers_mut()
            .insert(TRACE_ID_HEADER, header_value.clone());
        response
            .headers_mut()
            .insert(REQUEST_ID_HEADER, header_value);
    }

    response
}

fn log_outcome(
    trace_id: &TraceId,
    method: &axum::http::Method,
    path: &str,
    status: StatusCode,
    duration_ms: &str,
) {
    let status_code = status.as_u16();
    if status.is_server_error() {
        tracing::error!(
            trace_id = %trace_id,
            method = %method,
            path = %path,
            status = status_code,
            duration_ms = %duration_ms,
            "Server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            trace_id = %trace_id,
            method = %method,
            path = %path,
            status = status_code,
            duration_ms = %duration_ms,
            "Client error"
        );
    } else {
        tracing::info!(
            trace_id = %trace_id,
            method = %method,
            path = %path,
            status = status_code,
            duration_ms = %duration_ms,
            "Request completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Extension, Router};
    use std::future::Future;
    use std::sync::Arc;
    use std::task::Poll;
    use tokio::sync::Notify;
    use tower::ServiceExt;

    #[test]
    fn test_trace_id_generation() {
        let trace_id = TraceId::new();
        // UUID v4 format: xxxxxxxx-xxxx-4xxx-yxxx-xxxxxxxxxxxx
        assert_eq!(trace_id.as_str().len(), 36);
    }

    #[test]
    fn test_trace_id_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("req-1"));
        assert_eq!(TraceId::from_headers(&headers).as_str(), "req-1");

        headers.insert(TRACE_ID_HEADER, HeaderValue::from_static("trace-1"));
        assert_eq!(TraceId::from_headers(&headers).as_str(), "trace-1");
    }

    fn router() -> Router {
        Router::new()
            .route(
                "/",
                get(|Extension(trace_id): Extension<TraceId>| async move { trace_id.0 }),
            )
            .layer(axum::middleware::from_fn(log_request))
    }

    #[tokio::test]
    async fn test_propagates_trace_id() {
        let request = Request::builder()
            .uri("/")
            .header(TRACE_ID_HEADER, "abc-123")
            .body(Body::empty())
            .unwrap();
        let response = router().oneshot(request).await.unwrap();

        assert_eq!(response.headers()[TRACE_ID_HEADER], "abc-123");
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "abc-123");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"abc-123");
    }

    #[tokio::test]
    async fn test_request_span_does_not_leak_while_pending() {
        let notify = Arc::new(Notify::new());
        let handler_notify = notify.clone();
        let app = Router::new()
            .route(
                "/",
                get(move || {
                    let notify = handler_notify.clone();
                    async move {
                        notify.notified().await;
                        let span = tracing::Span::current();
                        span.metadata().map(|m| m.name()).unwrap_or("none").to_string()
                    }
                }),
            )
            .layer(axum::middleware::from_fn(log_request));

        let _default = tracing::subscriber::set_default(tracing_subscriber::registry());

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let mut pending = Box::pin(app.oneshot(request));

        let parked = std::future::poll_fn(|cx| Poll::Ready(pending.as_mut().poll(cx).is_pending())).await;
        assert!(parked);
        // Other work on this thread must not run inside the parked request's span.
        assert!(tracing::Span::current().is_none());

        notify.notify_one();
        let response = pending.await.unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"http_request");
    }

    #[tokio::test]
    async fn test_generates_trace_id() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = router().oneshot(request).await.unwrap();

        let id = response.headers()[TRACE_ID_HEADER].to_str().unwrap();
        assert_eq!(id.len(), 36);
    }
}
