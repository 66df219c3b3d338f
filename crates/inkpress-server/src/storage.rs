//! In-memory credential store.
//!
//! Backs the server and the test suite. Uniqueness rules match what the
//! database schema would enforce: unique id, unique username, unique email
//! when present.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use inkpress_auth::error::{AuthError, AuthResult};
use inkpress_auth::storage::{NewUser, User, UserStorage};
use tokio::sync::RwLock;

/// Map-backed user store.
///
/// Interior synchronization only; nothing in the token path holds this lock
/// across awaits, so concurrent requests do not serialize on each other
/// beyond individual map operations.
#[derive(Default)]
pub struct MemoryUserStorage {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserStorage {
    /// Creates an empty store behind an `Arc`.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of stored users.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    /// Returns `true` when no users are stored.
    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserStorage for MemoryUserStorage {
    async fn find_by_id(&self, id: &str) -> AuthResult<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned())
    }

    async fn create(&self, new_user: NewUser) -> AuthResult<User> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.username == new_user.username) {
            return Err(AuthError::conflict(format!(
                "username '{}' already taken",
                new_user.username
            )));
        }
        if let Some(ref email) = new_user.email
            && users.values().any(|u| u.email.as_deref() == Some(email))
        {
            return Err(AuthError::conflict(format!("email '{email}' already taken")));
        }

        let user = User::new(new_user.username, new_user.email, new_user.password_hash)
            .with_role(new_user.role);
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn upsert(&self, new_user: NewUser) -> AuthResult<User> {
        let mut users = self.users.write().await;

        if let Some(existing) = users
            .values_mut()
            .find(|u| u.username == new_user.username)
        {
            existing.email = new_user.email;
            existing.password_hash = new_user.password_hash;
            existing.role = new_user.role;
            existing.updated_at = time::OffsetDateTime::now_utc();
            return Ok(existing.clone());
        }

        let user = User::new(new_user.username, new_user.email, new_user.password_hash)
            .with_role(new_user.role);
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }
}
