//! API handlers for the blog server

pub mod auth;
pub mod health;
pub mod items;
pub mod posts;

pub use auth::{login, register};
pub use health::{health_check, method_not_allowed, not_found, root};
pub use items::{create_item, get_item};
pub use posts::{create_post, delete_post, get_post, list_posts, list_public_posts, update_post};

// Re-export the extractors handlers use
pub use crate::extract::{LoginCredentials, RecordId, ValidatedJson, ValidatedQuery};
pub use crate::middleware::{AuthenticatedUser, RequestContext};
