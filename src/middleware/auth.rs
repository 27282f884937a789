//! Authentication middleware
//!
//! [`identify`] resolves the caller once per request and records it in the
//! [`RequestContext`]. Handlers then extract either the context or an
//! [`AuthenticatedUser`].

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Fallback identity header, honoured only when enabled in configuration
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header value that always means "no identity"
const ANONYMOUS: &str = "anonymous";

/// Who is making the request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Identity {
    /// Subject of a verified bearer token
    Token(String),
    /// Value of the trust header
    Header(String),
    #[default]
    Anonymous,
}

impl Identity {
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Identity::Token(id) | Identity::Header(id) => Some(id),
            Identity::Anonymous => None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Anonymous)
    }

    fn source(&self) -> &'static str {
        match self {
            Identity::Token(_) => "token",
            Identity::Header(_) => "header",
            Identity::Anonymous => "anonymous",
        }
    }
}

/// Per-request context stored as a request extension
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub correlation_id: String,
    pub identity: Identity,
    pub path: String,
}

impl RequestContext {
    pub fn new(correlation_id: String, path: String) -> Self {
        Self {
            correlation_id,
            identity: Identity::Anonymous,
            path,
        }
    }
}

/// Resolve the caller: verified bearer token, then the trust header when
/// allowed, then anonymous
pub async fn identify(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let identity = resolve_identity(request.headers(), &state);
    tracing::debug!(source = identity.source(), "Identity resolved");

    let path = request.uri().path().to_string();
    match request.extensions_mut().get_mut::<RequestContext>() {
        Some(context) => context.identity = identity,
        None => {
            let mut context = RequestContext::new(Uuid::new_v4().to_string(), path);
            context.identity = identity;
            request.extensions_mut().insert(context);
        }
    }

    next.run(request).await
}

fn resolve_identity(headers: &HeaderMap, state: &AppState) -> Identity {
    let claims = headers
        .typed_get::<Authorization<Bearer>>()
        .and_then(|Authorization(bearer)| state.auth_service.tokens().verify(bearer.token()));
    if let Some(claims) = claims {
        return Identity::Token(claims.sub);
    }

    if !state.config.allow_user_id_header {
        return Identity::Anonymous;
    }

    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty() && *value != ANONYMOUS)
        .map(|value| Identity::Header(value.to_string()))
        .unwrap_or_default()
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or_else(|| ApiError::Internal("request context missing".to_string()))
    }
}

/// Extractor for authenticated users
///
/// Rejects anonymous callers with `401 authentication_required`.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(user: AuthenticatedUser) -> impl IntoResponse {
///     format!("Hello, user {}", user.user_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub context: RequestContext,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let context = RequestContext::from_request_parts(parts, state).await?;

        match context.identity.user_id() {
            Some(user_id) => Ok(AuthenticatedUser {
                user_id: user_id.to_string(),
                context: context.clone(),
            }),
            None => {
                tracing::warn!(
                    path = %context.path,
                    method = %parts.method,
                    "Anonymous request to protected route"
                );
                Err(ApiError::authentication_required())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_user_id() {
        assert_eq!(Identity::Token("alice".into()).user_id(), Some("alice"));
        assert_eq!(Identity::Header("bob".into()).user_id(), Some("bob"));
        assert_eq!(Identity::Anonymous.user_id(), None);
        assert!(Identity::default().is_anonymous());
    }

    #[tokio::test]
    async fn test_authenticated_user_rejects_anonymous() {
        let mut parts = axum::http::Request::new(()).into_parts().0;
        parts
            .extensions
            .insert(RequestContext::new("cid".into(), "/posts".into()));

        let err = AuthenticatedUser::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "authentication_required");
    }

    #[tokio::test]
    async fn test_authenticated_user_from_context() {
        let mut parts = axum::http::Request::new(()).into_parts().0;
        let mut context = RequestContext::new("cid".into(), "/posts".into());
        context.identity = Identity::Token("alice".into());
        parts.extensions.insert(context);

        let user = AuthenticatedUser::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(user.user_id, "alice");
        assert_eq!(user.context.correlation_id, "cid");
    }
}
