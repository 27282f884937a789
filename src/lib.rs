//! Simple Blog Server Library
//!
//! A small authenticated content API (posts and items) behind a hardening
//! layer: JWT sessions, login rate limiting, PII-masked logging, RFC 7807
//! errors, input sanitation and a confined image upload validator.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod security;
pub mod state;
pub mod store;
pub mod upload;

pub use routes::create_router;
pub use state::AppState;
