//! Authentication module
//!
//! - Salted and peppered password hashing
//! - JWT access token issuance and verification
//! - Sliding-window login rate limiting

pub mod jwt;
mod password;
pub mod rate_limiter;
mod service;

pub use jwt::{Claims, JwtError, TokenService, TOKEN_AUDIENCE, TOKEN_ISSUER};
pub use password::{PasswordError, PasswordHasher};
pub use rate_limiter::{
    Identifier, LimitScope, LoginRateLimiter, LoginThrottled, RateLimitDecision,
    SlidingWindowLimiter, WindowPolicy,
};
pub use service::{AuthError, AuthService, LoginSuccess};
