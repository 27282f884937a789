//! JWT token issuance and verification
//!
//! Access tokens are HS256-signed and scoped to a fixed issuer and audience.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Issuer stamped into every token
pub const TOKEN_ISSUER: &str = "simple-blog";

/// Audience stamped into every token
pub const TOKEN_AUDIENCE: &str = "simple-blog-users";

/// Default access token lifetime
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60;

/// JWT-related errors
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Token decoding failed: {0}")]
    DecodingFailed(String),

    #[error("Token expired")]
    TokenExpired,
}

/// JWT claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
}

/// Issues and verifies access tokens with a process-wide symmetric secret
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    default_ttl: Duration,
}

impl TokenService {
    /// Create a token service signing with `secret`
    pub fn new(secret: &str, default_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_audience(&[TOKEN_AUDIENCE]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            default_ttl,
        }
    }

    /// Issue a token for `subject`
    ///
    /// # Arguments
    /// * `subject` - The authenticated username
    /// * `ttl` - Token lifetime; `None` uses the configured default. A negative
    ///   lifetime yields an already expired token.
    pub fn issue(&self, subject: &str, ttl: Option<Duration>) -> Result<String, JwtError> {
        let now = Utc::now();
        let exp = now + ttl.unwrap_or(self.default_ttl);

        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: TOKEN_ISSUER.to_string(),
            aud: TOKEN_AUDIENCE.to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Decode and fully validate a token
    ///
    /// # Returns
    /// * `Ok(Claims)` if signature, issuer, audience and expiry all check out
    /// * `Err(JwtError)` otherwise
    pub fn decode(&self, token: &str) -> Result<Claims, JwtError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                _ => JwtError::DecodingFailed(e.to_string()),
            })
    }

    /// Verify a token, failing closed
    ///
    /// Expired, tampered and malformed tokens all yield `None`.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        match self.decode(token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                tracing::debug!(reason = %e, "Bearer token rejected");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-that-is-long-enough-for-hs256";

    fn service() -> TokenService {
        TokenService::new(SECRET, Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES))
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let tokens = service();
        let token = tokens.issue("alice", None).unwrap();
        assert!(!token.is_empty());

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.iss, TOKEN_ISSUER);
        assert_eq!(claims.aud, TOKEN_AUDIENCE);
        assert_eq!(claims.exp - claims.iat, DEFAULT_TOKEN_TTL_MINUTES * 60);
    }

    #[test]
    fn test_custom_ttl() {
        let tokens = service();
        let token = tokens.issue("alice", Some(Duration::minutes(30))).unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn test_negative_ttl_is_expired() {
        let tokens = service();
        let token = tokens.issue("alice", Some(Duration::minutes(-1))).unwrap();
        assert!(tokens.verify(&token).is_none());
        assert!(matches!(tokens.decode(&token), Err(JwtError::TokenExpired)));
    }

    #[test]
    fn test_invalid_token() {
        let tokens = service();
        assert!(tokens.verify("invalid.token.here").is_none());
        assert!(tokens.verify("").is_none());
        assert!(tokens.verify("not-a-jwt").is_none());
    }

    #[test]
    fn test_wrong_secret() {
        let token = TokenService::new("secret1", Duration::minutes(60))
            .issue("alice", None)
            .unwrap();
        assert!(TokenService::new("secret2", Duration::minutes(60))
            .verify(&token)
            .is_none());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let tokens = service();
        let token = tokens.issue("alice", None).unwrap();
        let forged = tokens.issue("mallory", None).unwrap();

        // Splice mallory's payload under alice's signature
        let parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);
        assert!(tokens.verify(&spliced).is_none());
    }

    #[test]
    fn test_wrong_issuer_or_audience_rejected() {
        let now = Utc::now().timestamp();
        let key = EncodingKey::from_secret(SECRET.as_bytes());
        let tokens = service();

        for (iss, aud) in [("someone-else", TOKEN_AUDIENCE), (TOKEN_ISSUER, "other-app")] {
            let claims = Claims {
                sub: "alice".to_string(),
                iat: now,
                exp: now + 3600,
                iss: iss.to_string(),
                aud: aud.to_string(),
            };
            let token = encode(&Header::new(Algorithm::HS256), &claims, &key).unwrap();
            assert!(tokens.verify(&token).is_none(), "{iss}/{aud} accepted");
        }
    }

    #[test]
    fn test_verify_is_idempotent() {
        let tokens = service();
        let token = tokens.issue("alice", None).unwrap();
        assert_eq!(tokens.verify(&token), tokens.verify(&token));
    }
}
