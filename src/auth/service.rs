//! Authentication service
//!
//! Registration, login and token issuance over the in-memory user store.

use thiserror::Error;

use crate::store::UserStore;

use super::jwt::{JwtError, TokenService};
use super::password::{PasswordError, PasswordHasher};
use super::rate_limiter::{LoginRateLimiter, LoginThrottled};

/// Auth service errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("User with this username already exists")]
    UserExists,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Login attempts throttled")]
    Throttled(LoginThrottled),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Token error: {0}")]
    Token(#[from] JwtError),
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginSuccess {
    pub username: String,
    pub access_token: String,
}

/// Authentication service
pub struct AuthService {
    users: UserStore,
    hasher: PasswordHasher,
    tokens: TokenService,
    limiter: LoginRateLimiter,
    decoy_hash: String,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(
        tokens: TokenService,
        hasher: PasswordHasher,
        limiter: LoginRateLimiter,
    ) -> Result<Self, AuthError> {
        // Verified against when the username is unknown, so a miss costs the
        // same as a wrong password.
        let decoy_hash = hasher.hash("decoy-password")?;

        Ok(Self {
            users: UserStore::new(),
            hasher,
            tokens,
            limiter,
            decoy_hash,
        })
    }

    /// Create the configured bootstrap accounts
    pub async fn bootstrap<'a, I>(&self, accounts: I) -> Result<(), AuthError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (username, password) in accounts {
            let hash = self.hasher.hash(password)?;
            if self.users.insert_new(username, hash).await {
                tracing::info!(account = %username, "Bootstrap account created");
            }
        }
        Ok(())
    }

    /// Register a new user with an already normalized username
    pub async fn register(&self, username: &str, password: &str) -> Result<(), AuthError> {
        if self.users.contains(username).await {
            tracing::warn!(username = %username, "Registration attempt for existing user");
            return Err(AuthError::UserExists);
        }

        let hash = self.hasher.hash(password)?;
        if !self.users.insert_new(username, hash).await {
            tracing::warn!(username = %username, "Registration attempt for existing user");
            return Err(AuthError::UserExists);
        }

        tracing::info!(username = %username, "User registered successfully");
        Ok(())
    }

    /// Authenticate `username` from client address `ip` and issue a token
    ///
    /// Both rate limits are checked before the password is looked at. A
    /// successful login clears the attempt history of the address and the
    /// account.
    pub async fn login(
        &self,
        ip: &str,
        username: &str,
        password: &str,
    ) -> Result<LoginSuccess, AuthError> {
        self.limiter
            .check_login(ip, username)
            .await
            .map_err(AuthError::Throttled)?;

        let verified = match self.users.password_hash(username).await {
            Some(stored) => self.hasher.verify(password, &stored),
            None => {
                self.hasher.verify(password, &self.decoy_hash);
                false
            }
        };

        if !verified {
            tracing::warn!(username = %username, "Failed login attempt for user");
            return Err(AuthError::InvalidCredentials);
        }

        self.limiter.record_success(ip, username).await;
        let access_token = self.tokens.issue(username, None)?;

        tracing::info!(username = %username, "Successful login, access token issued");

        Ok(LoginSuccess {
            username: username.to_string(),
            access_token,
        })
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn limiter(&self) -> &LoginRateLimiter {
        &self.limiter
    }
}
