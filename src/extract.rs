//! Request extractors
//!
//! Body, query and path rejections are turned into [`ApiError`] values here, so every
//! malformed request renders as a problem document.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ApiError;
use crate::models::LoginRequest;
use crate::store::{validate_id, StoreError};

/// Normalization applied to a request before it is validated
pub trait Sanitize {
    fn sanitize(self) -> Self;
}

fn check<T: Sanitize + Validate>(value: T) -> Result<T, ApiError> {
    let value = value.sanitize();
    value.validate()?;
    Ok(value)
}

/// JSON body that has been sanitized and validated
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Sanitize + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::field("body", rejection.body_text()))?;

        check(value).map(ValidatedJson)
    }
}

/// Query string whose deserialization failures render as validation errors
#[derive(Debug)]
pub struct ValidatedQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::field("query", rejection.body_text()))?;
        Ok(ValidatedQuery(value))
    }
}

/// Login credentials from the query string or, failing that, a JSON body
#[derive(Debug)]
pub struct LoginCredentials(pub LoginRequest);

#[async_trait]
impl<S> FromRequest<S> for LoginCredentials
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if let Ok(Query(credentials)) = Query::<LoginRequest>::try_from_uri(req.uri()) {
            return check(credentials).map(LoginCredentials);
        }

        let ValidatedJson(credentials) = ValidatedJson::<LoginRequest>::from_request(req, state).await?;
        Ok(LoginCredentials(credentials))
    }
}

/// Record id from the `:id` path segment, checked against the id range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for RecordId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::field("id", rejection.body_text()))?;

        parse_record_id(&raw).map(RecordId)
    }
}

fn parse_record_id(raw: &str) -> Result<i64, ApiError> {
    match raw.parse::<i64>() {
        Ok(id) => Ok(validate_id(id)?),
        Err(_) => {
            let digits = raw.strip_prefix('-').unwrap_or(raw);
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ApiError::field("id", "id must be an integer"));
            }
            // Out of i64 range
            let err = if raw.starts_with('-') {
                StoreError::InvalidId
            } else {
                StoreError::IdOverflow
            };
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Deserialize)]
    struct StatusFilter {
        #[allow(dead_code)]
        status: Option<String>,
    }

    #[tokio::test]
    async fn test_query_rejection_is_validation_error() {
        let mut parts = axum::http::Request::builder()
            .uri("/posts?status=draft&status=published")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let err = ValidatedQuery::<StatusFilter>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "validation_error");
        assert!(matches!(err, ApiError::Validation(fields) if fields.contains_key("query")));
    }

    #[test]
    fn test_parse_record_id() {
        assert_eq!(parse_record_id("42").unwrap(), 42);
        assert_eq!(parse_record_id("2147483647").unwrap(), 2147483647);

        assert_eq!(parse_record_id("0").unwrap_err().error_code(), "invalid_id");
        assert_eq!(parse_record_id("-5").unwrap_err().error_code(), "invalid_id");
        assert_eq!(
            parse_record_id("2147483648").unwrap_err().error_code(),
            "id_overflow"
        );
        assert_eq!(
            parse_record_id("99999999999999999999999").unwrap_err().error_code(),
            "id_overflow"
        );
        assert_eq!(
            parse_record_id("abc").unwrap_err().error_code(),
            "validation_error"
        );
    }
}
