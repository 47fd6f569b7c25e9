//! Event publishing module for NATS messaging.
//!
//! Bridges the users domain publisher trait onto a NATS client. Publishing
//! is best-effort: failures are logged, never surfaced to the caller.

use async_nats::Client;
use async_trait::async_trait;
use domain_users::{UserEvent, UserEventKind, UserEventPublisher};
use tracing::{error, info, instrument};

/// Subject for user created events
pub const SUBJECT_USER_CREATED: &str = "users.created";
/// Subject for user deleted events
pub const SUBJECT_USER_DELETED: &str = "users.deleted";

/// NATS event publisher
#[derive(Clone)]
pub struct EventPublisher {
    client: Client,
}

impl EventPublisher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Current connection state, used by the readiness check
    pub fn connection_state(&self) -> async_nats::connection::State {
        self.client.connection_state()
    }

    fn subject(event: &UserEvent) -> &'static str {
        match event.event_type {
            UserEventKind::UserCreated => SUBJECT_USER_CREATED,
            UserEventKind::UserDeleted => SUBJECT_USER_DELETED,
        }
    }
}

#[async_trait]
impl UserEventPublisher for EventPublisher {
    #[instrument(skip(self, event), fields(event_type = ?event.event_type, user_id = %event.user_id))]
    async fn publish(&self, event: UserEvent) {
        let subject = Self::subject(&event);
        match serde_json::to_vec(&event) {
            Ok(payload) => {
                if let Err(e) = self.client.publish(subject, payload.into()).await {
                    error!(error = %e, subject = %subject, "Failed to publish event");
                } else {
                    info!(subject = %subject, "Event published");
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to serialize event");
            }
        }
    }
}
