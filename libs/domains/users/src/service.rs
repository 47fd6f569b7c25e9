use std::sync::Arc;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::events::{UserEvent, UserEventPublisher};
use crate::models::{CreateUser, UpdateUser, UserResponse};
use crate::repository::UserRepository;

/// Business logic for user management
#[derive(Debug, Clone)]
pub struct UserService<R: UserRepository, P: UserEventPublisher> {
    repository: Arc<R>,
    events: Arc<P>,
}

impl<R: UserRepository, P: UserEventPublisher> UserService<R, P> {
    pub fn new(repository: R, events: P) -> Self {
        Self {
            repository: Arc::new(repository),
            events: Arc::new(events),
        }
    }

    pub async fn create_user(&self, input: CreateUser) -> UserResult<UserResponse> {
        // Uniqueness pre-check before any write; the store's unique
        // constraint remains the backstop for races
        if self.repository.email_exists(&input.email).await? {
            return Err(UserError::DuplicateEmail(input.email));
        }

        let user = self.repository.create(input).await?;

        self.events.publish(UserEvent::created(&user)).await;

        Ok(user.into())
    }

    pub async fn get_user(&self, id: Uuid) -> UserResult<UserResponse> {
        self.repository
            .get_by_id(id)
            .await?
            .map(UserResponse::from)
            .ok_or(UserError::NotFound(id))
    }

    pub async fn list_users(&self) -> UserResult<Vec<UserResponse>> {
        let users = self.repository.list().await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    pub async fn update_user(&self, id: Uuid, input: UpdateUser) -> UserResult<UserResponse> {
        let mut user = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))?;

        let old_email = user.email.clone();
        let email_changed = !old_email.eq_ignore_ascii_case(&input.email);

        if email_changed && self.repository.email_exists(&input.email).await? {
            return Err(UserError::DuplicateEmail(input.email));
        }

        user.apply_update(input);
        let updated = self.repository.update(user).await?;

        if email_changed {
            tracing::info!(user_id = %id, from = %old_email, to = %updated.email, "Email updated");
        }

        // Updates deliberately publish nothing; only create and delete
        // are announced downstream
        Ok(updated.into())
    }

    pub async fn delete_user(&self, id: Uuid) -> UserResult<()> {
        // Load first: the event needs email and name after the row is gone
        let user = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))?;

        let deleted = self.repository.delete(id).await?;
        if !deleted {
            return Err(UserError::NotFound(id));
        }

        self.events.publish(UserEvent::deleted(&user)).await;

        Ok(())
    }
}
