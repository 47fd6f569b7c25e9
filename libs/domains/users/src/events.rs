use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::User;

/// Lifecycle event kinds emitted by the users domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserEventKind {
    UserCreated,
    UserDeleted,
}

/// Payload published when a user is created or deleted
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserEvent {
    pub event_type: UserEventKind,
    pub user_id: Uuid,
    pub user_email: String,
    pub user_name: String,
    pub event_time: DateTime<Utc>,
}

impl UserEvent {
    pub fn created(user: &User) -> Self {
        Self {
            event_type: UserEventKind::UserCreated,
            user_id: user.id,
            user_email: user.email.clone(),
            user_name: user.name.clone(),
            event_time: Utc::now(),
        }
    }

    pub fn deleted(user: &User) -> Self {
        Self {
            event_type: UserEventKind::UserDeleted,
            user_id: user.id,
            user_email: user.email.clone(),
            user_name: user.name.clone(),
            event_time: Utc::now(),
        }
    }
}

/// Sink for user lifecycle events.
///
/// Publishing is best-effort: implementations absorb and log their own
/// failures, so a broken broker never fails the user operation that
/// triggered the event.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserEventPublisher: Send + Sync {
    async fn publish(&self, event: UserEvent);
}

/// Publisher that drops every event, for deployments without a broker
#[derive(Debug, Default, Clone)]
pub struct NoopEventPublisher;

#[async_trait]
impl UserEventPublisher for NoopEventPublisher {
    async fn publish(&self, event: UserEvent) {
        tracing::debug!(
            event_type = ?event.event_type,
            user_id = %event.user_id,
            "Event publishing disabled, dropping event"
        );
    }
}
