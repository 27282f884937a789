//! Centralized API error handling
//!
//! Every failure that reaches the wire goes through [`ApiError`] and is
//! rendered as an RFC 7807 problem document. The rendered [`Problem`] is also
//! stored in the response extensions so the correlation middleware can add
//! `correlation_id` and `instance` once the request context is known.

use std::{collections::BTreeMap, time::Duration};

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use headers::{HeaderMapExt, RetryAfter};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::auth::{AuthError, LimitScope, LoginThrottled};
use crate::security::TagError;
use crate::store::StoreError;
use crate::upload::UploadError;

/// Base URI of problem `type` values
pub const PROBLEM_TYPE_BASE: &str = "https://example.com/problems/";

/// Detail sent for every 5xx response
pub const GENERIC_INTERNAL_DETAIL: &str =
    "An internal error occurred. Please contact support with correlation_id.";

/// Field name -> message, as sent in a validation problem
pub type FieldErrors = BTreeMap<String, String>;

/// API error type with HTTP status code mapping
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation failed: {0:?}")]
    Validation(FieldErrors),

    #[error("{message}")]
    BadRequest { code: &'static str, message: String },

    #[error("{0}")]
    AuthenticationRequired(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("{message}")]
    Conflict { code: &'static str, message: String },

    #[error("{message}")]
    RateLimited {
        retry_after_secs: u64,
        message: String,
    },

    #[error("{message}")]
    ServiceUnavailable { code: &'static str, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Single-field validation failure
    pub fn field(name: &str, message: impl Into<String>) -> Self {
        let mut fields = FieldErrors::new();
        fields.insert(name.to_string(), message.into());
        ApiError::Validation(fields)
    }

    pub fn authentication_required() -> Self {
        ApiError::AuthenticationRequired("Authentication required".to_string())
    }

    /// Get the error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::BadRequest { code, .. } => code,
            ApiError::AuthenticationRequired(_) => "authentication_required",
            ApiError::InvalidCredentials => "invalid_credentials",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::MethodNotAllowed => "method_not_allowed",
            ApiError::Conflict { code, .. } => code,
            ApiError::RateLimited { .. } => "rate_limit_exceeded",
            ApiError::ServiceUnavailable { code, .. } => code,
            ApiError::Internal(_) => "internal_error",
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::AuthenticationRequired(_) | ApiError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Problem document for this error; 5xx details are replaced by the
    /// generic message
    pub fn to_problem(&self) -> Problem {
        let status = self.status_code();
        let detail = match self {
            _ if status.is_server_error() => Value::from(GENERIC_INTERNAL_DETAIL),
            ApiError::Validation(fields) => serde_json::json!(fields),
            other => Value::from(other.to_string()),
        };
        Problem::new(status, self.error_code(), detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        if status.is_server_error() {
            tracing::error!(error = %self, code = %error_code, "Server error occurred");
        } else {
            tracing::warn!(error = %self, code = %error_code, status = status.as_u16(), "Request rejected");
        }

        let mut response = self.to_problem().into_response();
        if let ApiError::RateLimited {
            retry_after_secs, ..
        } = self
        {
            response
                .headers_mut()
                .typed_insert(RetryAfter::delay(Duration::from_secs(retry_after_secs)));
        }
        response
    }
}

/// RFC 7807 problem document
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Problem {
    #[serde(rename = "type")]
    pub problem_type: String,
    pub title: String,
    pub status: u16,
    pub detail: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl Problem {
    pub fn new(status: StatusCode, code: &str, detail: Value) -> Self {
        Self {
            problem_type: format!("{}{}", PROBLEM_TYPE_BASE, code.replace('_', "-")),
            title: title_for(code),
            status: status.as_u16(),
            detail,
            correlation_id: None,
            instance: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let mut response = (self.status(), Json(self.clone())).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        response.extensions_mut().insert(self);
        response
    }
}

/// `invalid_id` -> `Invalid Id`
fn title_for(code: &str) -> String {
    match code {
        "validation_error" => "Validation Error".to_string(),
        "rate_limit_exceeded" => "Too Many Requests".to_string(),
        _ => code
            .split('_')
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Whole seconds, rounded up and never zero
pub fn retry_after_secs(retry_after: Duration) -> u64 {
    let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
    secs.max(1)
}

// Conversions from component errors

impl From<LoginThrottled> for ApiError {
    fn from(throttled: LoginThrottled) -> Self {
        let secs = retry_after_secs(throttled.retry_after);
        let message = match throttled.scope {
            LimitScope::Ip => format!("Too many requests. Please try again after {secs} seconds."),
            LimitScope::Account => {
                format!("Too many login attempts. Please try again after {secs} seconds.")
            }
        };
        ApiError::RateLimited {
            retry_after_secs: secs,
            message,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::UserExists => ApiError::Conflict {
                code: "user_exists",
                message: err.to_string(),
            },
            AuthError::InvalidCredentials => ApiError::InvalidCredentials,
            AuthError::Throttled(throttled) => throttled.into(),
            AuthError::Password(_) | AuthError::Token(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidId => ApiError::BadRequest {
                code: "invalid_id",
                message: err.to_string(),
            },
            StoreError::IdOverflow => ApiError::BadRequest {
                code: "id_overflow",
                message: err.to_string(),
            },
            StoreError::CapacityReached(_) => ApiError::ServiceUnavailable {
                code: "max_items_reached",
                message: err.to_string(),
            },
            StoreError::NotFound(_) => ApiError::NotFound(err.to_string()),
            StoreError::NotOwner => ApiError::Forbidden(err.to_string()),
        }
    }
}

impl From<TagError> for ApiError {
    fn from(err: TagError) -> Self {
        ApiError::BadRequest {
            code: "invalid_tag",
            message: err.to_string(),
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::BadType | UploadError::TooBig { .. } => ApiError::BadRequest {
                code: err.code(),
                message: err.to_string(),
            },
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let fields = err
            .field_errors()
            .into_iter()
            .filter_map(|(field, errors)| {
                errors.first().map(|e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("invalid value ({})", e.code));
                    (field.to_string(), message)
                })
            })
            .collect();
        ApiError::Validation(fields)
    }
}

/// Result type alias using ApiError
pub type ApiResult<T> = Result<T, ApiError>;
