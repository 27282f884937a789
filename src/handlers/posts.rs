//! Post handlers
//!
//! Mutations check authentication first, then ownership.

use axum::{extract::State, Json};

use super::{AuthenticatedUser, RecordId, RequestContext, ValidatedJson, ValidatedQuery};
use crate::error::ApiError;
use crate::models::{
    DeletePostResponse, PostCreate, PostListQuery, PostListResponse, PostUpdate, PublicPostsQuery,
};
use crate::security::validate_tag;
use crate::state::AppState;
use crate::store::{Post, PostStatus, StoreError};

/// POST /posts
pub async fn create_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(req): ValidatedJson<PostCreate>,
) -> Result<Json<Post>, ApiError> {
    let post = state
        .content_store
        .create_post(&user.user_id, req.into_new_post())
        .await?;

    tracing::info!(
        post_id = post.id,
        status = ?post.status,
        user_id = %user.user_id,
        "Post created"
    );
    Ok(Json(post))
}

/// GET /posts - the caller's own posts
pub async fn list_posts(
    State(state): State<AppState>,
    context: RequestContext,
    ValidatedQuery(query): ValidatedQuery<PostListQuery>,
) -> Result<Json<PostListResponse>, ApiError> {
    let status = match query.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(PostStatus::parse(raw).ok_or_else(|| ApiError::BadRequest {
            code: "invalid_status",
            message: "status must be 'draft' or 'published'".to_string(),
        })?),
        None => None,
    };
    let tag = canonical_tag(query.tag.as_deref())?;

    let posts = match context.identity.user_id() {
        Some(owner) => {
            state
                .content_store
                .list_owned(owner, status, tag.as_deref())
                .await
        }
        None => Vec::new(),
    };

    Ok(Json(posts.into()))
}

/// GET /posts/public - published posts
pub async fn list_public_posts(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<PublicPostsQuery>,
) -> Result<Json<PostListResponse>, ApiError> {
    let tag = canonical_tag(query.tag.as_deref())?;
    let posts = state.content_store.list_published(tag.as_deref()).await;
    Ok(Json(posts.into()))
}

/// GET /posts/:id
pub async fn get_post(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> Result<Json<Post>, ApiError> {
    Ok(Json(state.content_store.get_post(id).await?))
}

/// PATCH /posts/:id - owner only
pub async fn update_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    RecordId(id): RecordId,
    ValidatedJson(req): ValidatedJson<PostUpdate>,
) -> Result<Json<Post>, ApiError> {
    let post = state
        .content_store
        .update_post(id, &user.user_id, req.into_changes())
        .await
        .map_err(|err| ownership_error(err, &user, id, "You can only edit your own posts"))?;

    tracing::info!(post_id = id, user_id = %user.user_id, "Post updated");
    Ok(Json(post))
}

/// DELETE /posts/:id - owner only
pub async fn delete_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    RecordId(id): RecordId,
) -> Result<Json<DeletePostResponse>, ApiError> {
    state
        .content_store
        .delete_post(id, &user.user_id)
        .await
        .map_err(|err| ownership_error(err, &user, id, "You can only delete your own posts"))?;

    tracing::info!(post_id = id, user_id = %user.user_id, "Post deleted");
    Ok(Json(DeletePostResponse {
        message: "Post deleted successfully".to_string(),
        post_id: id,
    }))
}

fn canonical_tag(raw: Option<&str>) -> Result<Option<String>, ApiError> {
    match raw.filter(|t| !t.is_empty()) {
        Some(tag) => Ok(Some(validate_tag(tag)?)),
        None => Ok(None),
    }
}

fn ownership_error(err: StoreError, user: &AuthenticatedUser, post_id: i64, message: &str) -> ApiError {
    match err {
        StoreError::NotOwner => {
            tracing::warn!(
                post_id,
                user_id = %user.user_id,
                "Unauthorized post modification attempt"
            );
            ApiError::Forbidden(message.to_string())
        }
        other => other.into(),
    }
}
