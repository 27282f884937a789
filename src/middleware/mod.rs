//! Middleware for the blog API
//!
//! This module provides middleware for correlation ids, identity resolution,
//! request tracing and security headers.

pub mod auth;
mod client_ip;
mod correlation;
mod security;
mod tracing;

pub use auth::{identify, AuthenticatedUser, Identity, RequestContext, USER_ID_HEADER};
pub use client_ip::client_ip;
pub use correlation::{correlation, is_valid_correlation_id, CORRELATION_HEADER};
pub use security::{hsts_header, security_headers};
pub use tracing::request_tracing;
