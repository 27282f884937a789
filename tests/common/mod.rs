//! Shared helpers for the HTTP integration tests

#![allow(dead_code)]

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use simple_blog_server::{
    config::{BootstrapAccount, Config, Environment},
    create_router, AppState,
};

pub const ADMIN_PASSWORD: &str = "admin-bootstrap-password";

pub fn test_config() -> Config {
    Config {
        environment: Environment::Development,
        bind_addr: "127.0.0.1".parse().unwrap(),
        port: 0,
        log_level: "debug".to_string(),
        cors_allowed_origins: None,
        jwt_secret: "integration-test-signing-secret-0123456789abcdef".to_string(),
        jwt_access_token_ttl_minutes: 60,
        password_pepper: "integration-test-pepper".to_string(),
        bootstrap_accounts: vec![BootstrapAccount {
            username: "admin".to_string(),
            password: ADMIN_PASSWORD.to_string(),
        }],
        allow_user_id_header: true,
        trust_forwarded_for: false,
        rate_limit_sweep_secs: 300,
    }
}

/// Router plus the state behind it, seen from peer 127.0.0.1
pub async fn test_app_with(configure: impl FnOnce(&mut Config)) -> (Router, AppState) {
    let mut config = test_config();
    configure(&mut config);

    let state = AppState::new(config).unwrap();
    state.bootstrap().await.unwrap();

    let app = create_router(state.clone())
        .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));
    (app, state)
}

pub async fn test_app() -> (Router, AppState) {
    test_app_with(|_| {}).await
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn request(method: Method, uri: &str) -> axum::http::request::Builder {
    Request::builder().method(method).uri(uri)
}

pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    request(method, uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: Method, uri: &str) -> Request<Body> {
    request(method, uri).body(Body::empty()).unwrap()
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub async fn register(app: &Router, username: &str, password: &str) -> TestResponse {
    send(
        app,
        json_request(
            Method::POST,
            "/register",
            serde_json::json!({ "username": username, "password": password }),
        ),
    )
    .await
}

pub async fn login(app: &Router, username: &str, password: &str) -> TestResponse {
    send(
        app,
        json_request(
            Method::POST,
            "/login",
            serde_json::json!({ "username": username, "password": password }),
        ),
    )
    .await
}
