//! Configuration management
//!
//! This module handles loading and validating configuration from environment variables,
//! with support for different environments (development, staging, production).
//! Secrets are required: a missing signing secret, pepper or bootstrap password
//! stops the server at startup.

use std::{env, fmt, net::IpAddr};
use thiserror::Error;

/// Minimum signing secret length in bytes (HS256 key size)
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Longest accepted access token lifetime (one year)
pub const MAX_TOKEN_TTL_MINUTES: i64 = 525_600;

/// Bootstrap accounts and the variables holding their passwords
pub const BOOTSTRAP_ACCOUNTS: &[(&str, &str)] = &[
    ("admin", "APP_ADMIN_PASSWORD"),
    ("user1", "APP_USER1_PASSWORD"),
    ("admin_reset", "APP_ADMIN_RESET_PASSWORD"),
];

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid environment value: {0}")]
    InvalidValue(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(String),
}

/// Application environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Parse environment from string
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid environment: '{}'. Expected: dev, staging, or prod",
                s
            ))),
        }
    }

    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Get the environment name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// Password for a bootstrap account
#[derive(Clone)]
pub struct BootstrapAccount {
    pub username: String,
    pub password: String,
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    /// Current environment
    pub environment: Environment,

    /// Address to bind
    pub bind_addr: IpAddr,

    /// Server port
    pub port: u16,

    /// Log level (RUST_LOG)
    pub log_level: String,

    /// CORS allowed origins, comma separated
    pub cors_allowed_origins: Option<String>,

    /// JWT secret for token signing
    pub jwt_secret: String,

    /// Access token TTL in minutes (default: 60)
    pub jwt_access_token_ttl_minutes: i64,

    /// Server-side pepper mixed into every password hash
    pub password_pepper: String,

    /// Accounts created at startup
    pub bootstrap_accounts: Vec<BootstrapAccount>,

    /// Accept `X-User-Id` as identity when no valid bearer token is sent
    pub allow_user_id_header: bool,

    /// Take the login client address from `X-Forwarded-For`
    pub trust_forwarded_for: bool,

    /// Interval between rate-limit sweeps in seconds
    pub rate_limit_sweep_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .map(|s| Environment::parse(&s))
            .unwrap_or(Ok(Environment::Development))?;

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1".to_string())
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::InvalidValue("BIND_ADDR must be an IP address".to_string()))?;

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort("PORT must be a valid number".to_string()))?;

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS").ok();

        let jwt_secret = required("JWT_SECRET")?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::InvalidValue(format!(
                "JWT_SECRET must be at least {} bytes",
                MIN_JWT_SECRET_LEN
            )));
        }

        let jwt_access_token_ttl_minutes = env::var("JWT_ACCESS_TOKEN_TTL_MINUTES")
            .unwrap_or_else(|_| "60".to_string())
            .parse::<i64>()
            .unwrap_or(60)
            .clamp(1, MAX_TOKEN_TTL_MINUTES);

        let password_pepper = required("APP_PASSWORD_PEPPER")?;

        let missing: Vec<&str> = BOOTSTRAP_ACCOUNTS
            .iter()
            .map(|(_, var)| *var)
            .filter(|var| env::var(var).map(|v| v.is_empty()).unwrap_or(true))
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingEnvVar(missing.join(", ")));
        }
        let bootstrap_accounts = BOOTSTRAP_ACCOUNTS
            .iter()
            .map(|(username, var)| BootstrapAccount {
                username: username.to_string(),
                password: env::var(var).unwrap_or_default(),
            })
            .collect();

        let allow_user_id_header = env::var("ALLOW_USER_ID_HEADER")
            .ok()
            .and_then(|v| parse_bool(&v))
            .unwrap_or(!environment.is_production());

        let trust_forwarded_for = env::var("TRUST_FORWARDED_FOR")
            .ok()
            .and_then(|v| parse_bool(&v))
            .unwrap_or(false);

        let rate_limit_sweep_secs = env::var("RATE_LIMIT_SWEEP_SECS")
            .unwrap_or_else(|_| "300".to_string())
            .parse::<u64>()
            .unwrap_or(300)
            .max(1);

        Ok(Config {
            environment,
            bind_addr,
            port,
            log_level,
            cors_allowed_origins,
            jwt_secret,
            jwt_access_token_ttl_minutes,
            password_pepper,
            bootstrap_accounts,
            allow_user_id_header,
            trust_forwarded_for,
            rate_limit_sweep_secs,
        })
    }

    /// Bootstrap accounts as `(username, password)` pairs
    pub fn bootstrap_credentials(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bootstrap_accounts
            .iter()
            .map(|a| (a.username.as_str(), a.password.as_str()))
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("environment", &self.environment)
            .field("bind_addr", &self.bind_addr)
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("jwt_secret", &"****")
            .field(
                "jwt_access_token_ttl_minutes",
                &self.jwt_access_token_ttl_minutes,
            )
            .field("password_pepper", &"****")
            .field(
                "bootstrap_accounts",
                &self
                    .bootstrap_accounts
                    .iter()
                    .map(|a| a.username.as_str())
                    .collect::<Vec<_>>(),
            )
            .field("allow_user_id_header", &self.allow_user_id_header)
            .field("trust_forwarded_for", &self.trust_forwarded_for)
            .field("rate_limit_sweep_secs", &self.rate_limit_sweep_secs)
            .finish()
    }
}

fn required(name: &str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnvVar(name.to_string())),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
