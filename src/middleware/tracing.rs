//! Request tracing middleware

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::logging::mask_pii;

/// Middleware for logging request information with timing
///
/// The query string is logged through the PII masker, so credentials sent as
/// query parameters never reach the log.
pub async fn request_tracing(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let target = request
        .uri()
        .path_and_query()
        .map(|pq| mask_pii(pq.as_str()))
        .unwrap_or_else(|| request.uri().path().to_string());

    let start = Instant::now();

    tracing::debug!(method = %method, target = %target, "Request started");

    // Execute the request
    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    // Log response
    if status.is_server_error() {
        tracing::error!(
            method = %method,
            target = %target,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request completed with error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            target = %target,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request completed with client error"
        );
    } else {
        tracing::info!(
            method = %method,
            target = %target,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request completed"
        );
    }

    response
}
