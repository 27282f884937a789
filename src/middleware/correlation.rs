//! Correlation id propagation
//!
//! Outermost layer: every request gets a correlation id and a `request` span,
//! and every response (problem documents included) carries the id back.

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

use crate::error::Problem;

use super::auth::RequestContext;

/// Request and response header carrying the correlation id
pub const CORRELATION_HEADER: &str = "x-correlation-id";

const MAX_CORRELATION_ID_LEN: usize = 128;

/// 1-128 visible ASCII characters
pub fn is_valid_correlation_id(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_CORRELATION_ID_LEN
        && value.bytes().all(|b| b.is_ascii_graphic())
}

/// Middleware assigning the correlation id and finishing problem documents
pub async fn correlation(mut request: Request, next: Next) -> Response {
    let correlation_id = request
        .headers()
        .get(CORRELATION_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| is_valid_correlation_id(value))
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let path = request.uri().path().to_string();

    request
        .extensions_mut()
        .insert(RequestContext::new(correlation_id.clone(), path.clone()));

    let span = tracing::info_span!("request", correlation_id = %correlation_id);
    let response = next.run(request).instrument(span).await;

    let mut response = finish_problem(response, &correlation_id, &path);
    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        response.headers_mut().insert(CORRELATION_HEADER, value);
    }
    response
}

/// Re-render a problem body with the request's correlation id and path
fn finish_problem(mut response: Response, correlation_id: &str, path: &str) -> Response {
    let Some(mut problem) = response.extensions_mut().remove::<Problem>() else {
        return response;
    };
    problem.correlation_id = Some(correlation_id.to_string());
    problem.instance = Some(path.to_string());

    let body = match serde_json::to_vec(&problem) {
        Ok(body) => body,
        Err(err) => {
            tracing::error!(error = %err, "Failed to serialize problem document");
            return response;
        }
    };

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.extensions.insert(problem);
    Response::from_parts(parts, Body::from(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_correlation_ids() {
        assert!(is_valid_correlation_id("abc-123"));
        assert!(is_valid_correlation_id(&"a".repeat(128)));

        assert!(!is_valid_correlation_id(""));
        assert!(!is_valid_correlation_id(&"a".repeat(129)));
        assert!(!is_valid_correlation_id("has space"));
        assert!(!is_valid_correlation_id("tab\there"));
        assert!(!is_valid_correlation_id("ünïcode"));
    }
}
