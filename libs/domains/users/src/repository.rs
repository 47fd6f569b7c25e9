use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, User};

/// Storage abstraction for users.
///
/// A unique violation on email comes back as the typed
/// `UserError::DuplicateEmail`, never as a raw driver error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new user, assigning its id and creation timestamp
    async fn create(&self, input: CreateUser) -> UserResult<User>;

    /// Fetch a user by id
    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>>;

    /// List all users, newest first
    async fn list(&self) -> UserResult<Vec<User>>;

    /// Overwrite an existing user
    async fn update(&self, user: User) -> UserResult<User>;

    /// Delete a user, returning whether a row was removed
    async fn delete(&self, id: Uuid) -> UserResult<bool>;

    /// Case-insensitive email existence check
    async fn email_exists(&self, email: &str) -> UserResult<bool>;
}

/// In-memory implementation for tests and local development
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, input: CreateUser) -> UserResult<User> {
        let mut users = self.users.write().await;

        if users
            .values()
            .any(|u| u.email.to_lowercase() == input.email.to_lowercase())
        {
            return Err(UserError::DuplicateEmail(input.email));
        }

        let user = User::new(input);
        users.insert(user.id, user.clone());
        tracing::info!(user_id = %user.id, email = %user.email, "Created user");
        Ok(user)
    }

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn list(&self) -> UserResult<Vec<User>> {
        let users = self.users.read().await;
        let mut result: Vec<User> = users.values().cloned().collect();
        // Newest first; id breaks ties for equal timestamps
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(result)
    }

    async fn update(&self, user: User) -> UserResult<User> {
        let mut users = self.users.write().await;

        if !users.contains_key(&user.id) {
            return Err(UserError::NotFound(user.id));
        }

        if users
            .values()
            .any(|u| u.id != user.id && u.email.to_lowercase() == user.email.to_lowercase())
        {
            return Err(UserError::DuplicateEmail(user.email));
        }

        users.insert(user.id, user.clone());
        tracing::info!(user_id = %user.id, "Updated user");
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> UserResult<bool> {
        let mut users = self.users.write().await;
        let removed = users.remove(&id).is_some();
        if removed {
            tracing::info!(user_id = %id, "Deleted user");
        }
        Ok(removed)
    }

    async fn email_exists(&self, email: &str) -> UserResult<bool> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .any(|u| u.email.to_lowercase() == email.to_lowercase()))
    }
}
