//! Request and response models
//!
//! Request bodies are normalized through [`Sanitize`](crate::extract::Sanitize)
//! before their `validator` rules run, so length limits apply to the text that
//! is actually stored.

mod auth;
mod content;

pub use auth::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
pub use content::{
    DeletePostResponse, ItemCreate, PostCreate, PostListQuery, PostListResponse, PostUpdate,
    PublicPostsQuery,
};

use std::borrow::Cow;

use validator::ValidationError;

/// Validation error with a human readable message
pub(crate) fn invalid(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}
