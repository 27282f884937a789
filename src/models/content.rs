//! Item and post models

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::extract::Sanitize;
use crate::security::{normalize_text, validate_tag};
use crate::store::{NewPost, Post, PostChanges, PostStatus};

use super::invalid;

/// Most tags a post may carry
pub const MAX_TAGS: usize = 10;

#[derive(Debug, Deserialize, Validate)]
pub struct ItemCreate {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
}

impl Sanitize for ItemCreate {
    fn sanitize(self) -> Self {
        Self {
            name: normalize_text(&self.name),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct PostCreate {
    #[validate(length(min = 1, max = 256, message = "title must be 1-256 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 2000, message = "body must be 1-2000 characters"))]
    pub body: String,

    #[serde(default = "default_status")]
    #[validate(custom = "validate_status")]
    pub status: String,

    #[serde(default)]
    #[validate(
        length(max = "MAX_TAGS", message = "at most 10 tags are allowed"),
        custom = "validate_tags"
    )]
    pub tags: Vec<String>,
}

impl Sanitize for PostCreate {
    fn sanitize(self) -> Self {
        Self {
            title: normalize_text(&self.title),
            body: normalize_text(&self.body),
            status: self.status.trim().to_string(),
            tags: self.tags,
        }
    }
}

impl PostCreate {
    /// Convert a validated request into store input
    pub fn into_new_post(self) -> NewPost {
        NewPost {
            title: self.title,
            body: self.body,
            status: PostStatus::parse(&self.status).unwrap_or_default(),
            tags: canonical_tags(&self.tags),
        }
    }
}

/// Partial post update; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PostUpdate {
    #[validate(length(min = 1, max = 256, message = "title must be 1-256 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 2000, message = "body must be 1-2000 characters"))]
    pub body: Option<String>,

    #[validate(custom = "validate_status")]
    pub status: Option<String>,

    #[validate(
        length(max = "MAX_TAGS", message = "at most 10 tags are allowed"),
        custom = "validate_tags"
    )]
    pub tags: Option<Vec<String>>,
}

impl Sanitize for PostUpdate {
    fn sanitize(self) -> Self {
        Self {
            title: self.title.map(|t| normalize_text(&t)),
            body: self.body.map(|b| normalize_text(&b)),
            status: self.status.map(|s| s.trim().to_string()),
            tags: self.tags,
        }
    }
}

impl PostUpdate {
    pub fn into_changes(self) -> PostChanges {
        PostChanges {
            title: self.title,
            body: self.body,
            status: self.status.as_deref().and_then(PostStatus::parse),
            tags: self.tags.as_deref().map(canonical_tags),
        }
    }
}

/// `GET /posts` filters
#[derive(Debug, Default, Deserialize)]
pub struct PostListQuery {
    pub status: Option<String>,
    pub tag: Option<String>,
}

/// `GET /posts/public` filters
#[derive(Debug, Default, Deserialize)]
pub struct PublicPostsQuery {
    pub tag: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostListResponse {
    pub posts: Vec<Post>,
    pub count: usize,
}

impl From<Vec<Post>> for PostListResponse {
    fn from(posts: Vec<Post>) -> Self {
        Self {
            count: posts.len(),
            posts,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeletePostResponse {
    pub message: String,
    pub post_id: i64,
}

fn default_status() -> String {
    "draft".to_string()
}

fn validate_status(status: &str) -> Result<(), ValidationError> {
    match PostStatus::parse(status) {
        Some(_) => Ok(()),
        None => Err(invalid(
            "invalid_status",
            "status must be 'draft' or 'published'",
        )),
    }
}

fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    for tag in tags {
        validate_tag(tag).map_err(|err| invalid("invalid_tag", err.to_string()))?;
    }
    Ok(())
}

/// Only called after `validate_tags` succeeded
fn canonical_tags(tags: &[String]) -> Vec<String> {
    tags.iter().filter_map(|tag| validate_tag(tag).ok()).collect()
}
