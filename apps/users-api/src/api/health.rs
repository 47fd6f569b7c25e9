//! Application-specific health check handlers with real dependency checks.

use crate::state::AppState;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use axum_helpers::server::{HealthCheckFuture, run_health_checks};
use database::postgres::check_health;

/// Readiness check endpoint that actually checks service dependencies.
///
/// This uses the generic `run_health_checks` utility from axum-helpers
/// to verify the database (and NATS, when configured) are healthy.
pub async fn ready_handler(State(state): State<AppState>) -> Response {
    let mut checks: Vec<(&str, HealthCheckFuture<'_>)> = vec![(
        "database",
        Box::pin(async { check_health(&state.db).await.map_err(|e| e.to_string()) }),
    )];

    if let Some(events) = &state.events {
        checks.push((
            "events",
            Box::pin(async {
                match events.connection_state() {
                    async_nats::connection::State::Connected => Ok(()),
                    other => Err(format!("NATS connection state: {:?}", other)),
                }
            }),
        ));
    }

    match run_health_checks(checks).await {
        Ok((status, json)) => (status, json).into_response(),
        Err((status, json)) => (status, json).into_response(),
    }
}
