//! Authentication HTTP handlers
//!
//! Endpoints for registration and password login.

use axum::{
    extract::{ConnectInfo, State},
    http::HeaderMap,
    Json,
};
use std::net::SocketAddr;

use super::{LoginCredentials, ValidatedJson};
use crate::error::ApiError;
use crate::middleware::client_ip;
use crate::models::{LoginResponse, RegisterRequest, RegisterResponse};
use crate::state::AppState;

/// POST /register - Create an account
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    state
        .auth_service
        .register(&req.username, &req.password)
        .await?;

    Ok(Json(RegisterResponse {
        message: "User registered successfully".to_string(),
        username: req.username,
    }))
}

/// POST /login - Verify credentials and issue an access token
pub async fn login(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    LoginCredentials(req): LoginCredentials,
) -> Result<Json<LoginResponse>, ApiError> {
    let ip = client_ip(
        &headers,
        peer.map(|ConnectInfo(addr)| addr),
        state.config.trust_forwarded_for,
    );

    let session = state
        .auth_service
        .login(&ip, &req.username, &req.password)
        .await?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        username: session.username,
        access_token: session.access_token,
        token_type: "bearer".to_string(),
    }))
}
