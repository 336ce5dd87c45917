//! Application-wide Axum middleware.

use std::time::Instant;

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;

static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Correlation id carried through request extensions for downstream handlers.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Logs every request and its outcome, correlating both sides with an
/// `x-request-id` that is either propagated from the caller or generated.
pub async fn request_logger(mut req: Request<Body>, next: Next) -> Response {
    let started = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();

    let request_id = req
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    req.extensions_mut().insert(RequestId(request_id.clone()));

    tracing::info!(request_id = %request_id, method = %method, uri = %uri, "Incoming request");

    let mut response = next.run(req).await;

    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis();

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER.clone(), value);
    }

    if status.is_server_error() {
        tracing::error!(request_id = %request_id, method = %method, uri = %uri, status = %status, elapsed_ms, "Request failed");
    } else if status.is_client_error() {
        tracing::warn!(request_id = %request_id, method = %method, uri = %uri, status = %status, elapsed_ms, "Request rejected");
    } else {
        tracing::info!(request_id = %request_id, method = %method, uri = %uri, status = %status, elapsed_ms, "Request completed");
    }

    response
}
