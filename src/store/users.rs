//! Credential records

use std::collections::HashMap;
use tokio::sync::RwLock;

/// Username to password hash; records are immutable once inserted
#[derive(Default)]
pub struct UserStore {
    users: RwLock<HashMap<String, String>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record unless the username is taken. Returns `false` when it is.
    pub async fn insert_new(&self, username: &str, password_hash: String) -> bool {
        let mut users = self.users.write().await;
        if users.contains_key(username) {
            return false;
        }
        users.insert(username.to_string(), password_hash);
        true
    }

    pub async fn password_hash(&self, username: &str) -> Option<String> {
        self.users.read().await.get(username).cloned()
    }

    pub async fn contains(&self, username: &str) -> bool {
        self.users.read().await.contains_key(username)
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_is_first_writer_wins() {
        let store = UserStore::new();
        assert!(store.insert_new("bob", "hash-1".to_string()).await);
        assert!(!store.insert_new("bob", "hash-2".to_string()).await);
        assert_eq!(store.password_hash("bob").await.as_deref(), Some("hash-1"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let store = UserStore::new();
        assert!(store.is_empty().await);
        assert!(!store.contains("ghost").await);
        assert!(store.password_hash("ghost").await.is_none());
    }
}
