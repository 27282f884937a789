//! In-memory stores
//!
//! Process-owned state shared by the handlers through `AppState`. Each store
//! does its own locking, so call sites never see a lock.

mod content;
mod users;

pub use content::{
    validate_id, ContentStore, Item, NewPost, Post, PostChanges, PostStatus, StoreError, MAX_ID,
};
pub use users::UserStore;
