//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;
use chrono::Duration;

use crate::auth::{AuthError, AuthService, LoginRateLimiter, PasswordHasher, TokenService};
use crate::config::Config;
use crate::store::ContentStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub content_store: Arc<ContentStore>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Build the services described by `config`
    ///
    /// Bootstrap accounts are not created here; see [`AppState::bootstrap`].
    pub fn new(config: Config) -> Result<Self, AuthError> {
        let tokens = TokenService::new(
            &config.jwt_secret,
            Duration::minutes(config.jwt_access_token_ttl_minutes),
        );
        let hasher = PasswordHasher::new(&config.password_pepper);
        let auth_service = AuthService::new(tokens, hasher, LoginRateLimiter::default())?;

        Ok(Self {
            auth_service: Arc::new(auth_service),
            content_store: Arc::new(ContentStore::new()),
            config: Arc::new(config),
        })
    }

    /// Create the configured bootstrap accounts
    pub async fn bootstrap(&self) -> Result<(), AuthError> {
        self.auth_service
            .bootstrap(self.config.bootstrap_credentials())
            .await
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}

impl FromRef<AppState> for Arc<ContentStore> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.content_store.clone()
    }
}

impl FromRef<AppState> for Arc<Config> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.config.clone()
    }
}
