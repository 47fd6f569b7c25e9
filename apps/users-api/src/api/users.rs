use axum::Router;
use domain_users::{NoopEventPublisher, PostgresUserRepository, UserService, handlers};

pub fn router(state: &crate::state::AppState) -> Router {
    let repository = PostgresUserRepository::new(state.db.clone());

    // Without NATS_URL events are dropped; the API stays fully functional
    match &state.events {
        Some(events) => handlers::router(UserService::new(repository, events.clone())),
        None => handlers::router(UserService::new(repository, NoopEventPublisher)),
    }
}
