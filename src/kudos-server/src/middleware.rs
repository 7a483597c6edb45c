//! HTTP middleware components.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use tokio::time::timeout;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::state::AppState;

/// Request ID header name.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request timing header name.
pub const REQUEST_TIMING_HEADER: &str = "x-response-time";

/// Request ID, stored in request extensions.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Tags each request with an ID, reusing the caller's `x-request-id` when
/// present. Everything logged while the request is handled carries the ID.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let span = info_span!("request", request_id = %request_id);
    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// Records how long each request took, as a response header and a log line.
pub async fn timing_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let mut response = next.run(request).await;

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    if let Ok(value) = HeaderValue::from_str(&format!("{elapsed_ms:.2}ms")) {
        response.headers_mut().insert(REQUEST_TIMING_HEADER, value);
    }

    let status = response.status().as_u16();
    match status {
        500.. => error!(%method, %path, status, elapsed_ms, "Request failed"),
        400..=499 => warn!(%method, %path, status, elapsed_ms, "Request rejected"),
        _ => info!(%method, %path, status, elapsed_ms, "Request completed"),
    }

    response
}

/// Answers 504 when a request outlives the configured timeout.
pub async fn timeout_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let timeout_duration = state.config.request_timeout_duration();

    match timeout(timeout_duration, next.run(request)).await {
        Ok(response) => Ok(response),
        Err(_) => {
            error!(timeout = ?timeout_duration, "Request timed out");
            Err(StatusCode::GATEWAY_TIMEOUT)
        }
    }
}
