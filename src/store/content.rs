//! Items and posts
//!
//! Plain list scans over in-memory tables. Ids are allocated from a
//! per-table counter and never reused.

use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::security::dedupe_tags;

/// Largest id a record may carry
pub const MAX_ID: i64 = i32::MAX as i64;

/// Content store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("ID must be positive")]
    InvalidId,

    #[error("ID exceeds maximum value ({MAX_ID})")]
    IdOverflow,

    #[error("Maximum number of {0} reached ({MAX_ID})")]
    CapacityReached(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("post is owned by another user")]
    NotOwner,
}

/// Reject ids outside `1..=MAX_ID`
pub fn validate_id(id: i64) -> Result<i64, StoreError> {
    if id < 1 {
        return Err(StoreError::InvalidId);
    }
    if id > MAX_ID {
        return Err(StoreError::IdOverflow);
    }
    Ok(id)
}

/// Generic item record
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Item {
    pub id: i64,
    pub name: String,
}

/// Post publication status
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl PostStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(PostStatus::Draft),
            "published" => Some(PostStatus::Published),
            _ => None,
        }
    }
}

/// Blog post record
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub status: PostStatus,
    pub tags: Vec<String>,
    pub user_id: String,
}

/// Validated input for a new post
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub body: String,
    pub status: PostStatus,
    pub tags: Vec<String>,
}

/// Validated partial update; `None` leaves the field as is
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub body: Option<String>,
    pub status: Option<PostStatus>,
    pub tags: Option<Vec<String>>,
}

struct Table<T> {
    rows: Vec<T>,
    last_id: i64,
}

impl<T> Table<T> {
    fn new() -> Self {
        Self {
            rows: Vec::new(),
            last_id: 0,
        }
    }

    fn next_id(&mut self, kind: &'static str) -> Result<i64, StoreError> {
        if self.last_id >= MAX_ID {
            return Err(StoreError::CapacityReached(kind));
        }
        self.last_id += 1;
        Ok(self.last_id)
    }
}

/// In-memory store for items and posts
pub struct ContentStore {
    items: RwLock<Table<Item>>,
    posts: RwLock<Table<Post>>,
}

impl Default for ContentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentStore {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Table::new()),
            posts: RwLock::new(Table::new()),
        }
    }

    pub async fn create_item(&self, name: String) -> Result<Item, StoreError> {
        let mut items = self.items.write().await;
        let item = Item {
            id: items.next_id("items")?,
            name,
        };
        items.rows.push(item.clone());
        Ok(item)
    }

    pub async fn get_item(&self, id: i64) -> Result<Item, StoreError> {
        let id = validate_id(id)?;
        self.items
            .read()
            .await
            .rows
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or(StoreError::NotFound("item"))
    }

    pub async fn create_post(&self, owner: &str, post: NewPost) -> Result<Post, StoreError> {
        let mut posts = self.posts.write().await;
        let post = Post {
            id: posts.next_id("posts")?,
            title: post.title,
            body: post.body,
            status: post.status,
            tags: dedupe_tags(post.tags),
            user_id: owner.to_string(),
        };
        posts.rows.push(post.clone());
        Ok(post)
    }

    pub async fn get_post(&self, id: i64) -> Result<Post, StoreError> {
        let id = validate_id(id)?;
        self.posts
            .read()
            .await
            .rows
            .iter()
            .find(|post| post.id == id)
            .cloned()
            .ok_or(StoreError::NotFound("post"))
    }

    /// Posts owned by `owner`, optionally filtered by status and canonical tag
    pub async fn list_owned(
        &self,
        owner: &str,
        status: Option<PostStatus>,
        tag: Option<&str>,
    ) -> Vec<Post> {
        self.posts
            .read()
            .await
            .rows
            .iter()
            .filter(|post| post.user_id == owner)
            .filter(|post| status.map_or(true, |s| post.status == s))
            .filter(|post| tag.map_or(true, |t| post.tags.iter().any(|pt| pt == t)))
            .cloned()
            .collect()
    }

    /// Published posts, optionally filtered by canonical tag
    pub async fn list_published(&self, tag: Option<&str>) -> Vec<Post> {
        self.posts
            .read()
            .await
            .rows
            .iter()
            .filter(|post| post.status == PostStatus::Published)
            .filter(|post| tag.map_or(true, |t| post.tags.iter().any(|pt| pt == t)))
            .cloned()
            .collect()
    }

    /// Apply `changes` if `owner` owns the post
    pub async fn update_post(
        &self,
        id: i64,
        owner: &str,
        changes: PostChanges,
    ) -> Result<Post, StoreError> {
        let id = validate_id(id)?;
        let mut posts = self.posts.write().await;
        let post = posts
            .rows
            .iter_mut()
            .find(|post| post.id == id)
            .ok_or(StoreError::NotFound("post"))?;

        if post.user_id != owner {
            return Err(StoreError::NotOwner);
        }

        if let Some(title) = changes.title {
            post.title = title;
        }
        if let Some(body) = changes.body {
            post.body = body;
        }
        if let Some(status) = changes.status {
            post.status = status;
        }
        if let Some(tags) = changes.tags {
            post.tags = dedupe_tags(tags);
        }

        Ok(post.clone())
    }

    /// Remove a post if `owner` owns it
    pub async fn delete_post(&self, id: i64, owner: &str) -> Result<Post, StoreError> {
        let id = validate_id(id)?;
        let mut posts = self.posts.write().await;
        let index = posts
            .rows
            .iter()
            .position(|post| post.id == id)
            .ok_or(StoreError::NotFound("post"))?;

        if posts.rows[index].user_id != owner {
            return Err(StoreError::NotOwner);
        }

        Ok(posts.rows.remove(index))
    }
}
