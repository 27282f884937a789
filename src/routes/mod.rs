//! Route definitions and router assembly

mod auth;
mod items;
mod posts;

pub use auth::auth_routes;
pub use items::item_routes;
pub use posts::post_routes;

use std::any::Any;

use axum::{
    http::{HeaderValue, Method},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as CorsAny, CorsLayer},
};

use crate::error::ApiError;
use crate::handlers::{health_check, method_not_allowed, not_found, root};
use crate::middleware;
use crate::state::AppState;

/// Build the application router with the full middleware stack.
///
/// Layers, outermost first: correlation id, panic capture, CORS, request
/// tracing, security headers, identity resolution.
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
        .merge(auth_routes())
        .merge(item_routes())
        .merge(post_routes())
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::identify,
        ))
        .layer(axum::middleware::from_fn(middleware::security_headers));

    if state.config.environment.is_production() {
        router = router.layer(axum::middleware::from_fn(middleware::hsts_header));
    }

    router
        .layer(axum::middleware::from_fn(middleware::request_tracing))
        .layer(configure_cors(state.config.cors_allowed_origins.as_deref()))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(axum::middleware::from_fn(middleware::correlation))
        .with_state(state)
}

fn configure_cors(allowed_origins: Option<&str>) -> CorsLayer {
    let allowed_origins = allowed_origins.unwrap_or_default();

    if allowed_origins.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(CorsAny)
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    ApiError::Internal(format!("handler panicked: {detail}")).into_response()
}
