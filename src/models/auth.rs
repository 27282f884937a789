//! Account models

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::extract::Sanitize;
use crate::security::normalize_text;

use super::invalid;

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        length(min = 3, max = 50, message = "username must be 3-50 characters"),
        custom = "validate_username"
    )]
    pub username: String,

    #[validate(length(min = 6, max = 100, message = "password must be 6-100 characters"))]
    pub password: String,
}

impl Sanitize for RegisterRequest {
    fn sanitize(self) -> Self {
        Self {
            username: normalize_text(&self.username).to_lowercase(),
            password: self.password,
        }
    }
}

/// Login request, accepted as a JSON body or a query string
///
/// No minimum password length is enforced here; a short password is just a
/// wrong password.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50, message = "username must be 1-50 characters"))]
    pub username: String,

    #[validate(length(min = 1, max = 100, message = "password must be 1-100 characters"))]
    pub password: String,
}

impl Sanitize for LoginRequest {
    fn sanitize(self) -> Self {
        Self {
            username: normalize_text(&self.username).to_lowercase(),
            password: self.password,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub username: String,
    pub access_token: String,
    pub token_type: String,
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        Ok(())
    } else {
        Err(invalid(
            "invalid_username",
            "username can only contain letters, numbers, hyphens, underscores and dots",
        ))
    }
}
