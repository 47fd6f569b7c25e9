use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, Statement};
use tracing::debug;

use crate::common::DatabaseError;

/// Verifies the database connection by running `SELECT 1`.
///
/// Readiness probes call this on every poll, so it stays as cheap as a
/// single round trip.
///
/// # Example
/// ```ignore
/// use database::postgres::{check_health, connect};
///
/// let db = connect(&db_url).await?;
/// check_health(&db).await?;
/// ```
pub async fn check_health(db: &DatabaseConnection) -> Result<(), DatabaseError> {
    let probe = Statement::from_string(DatabaseBackend::Postgres, "SELECT 1".to_owned());

    db.query_one_raw(probe).await.map_err(|e| {
        DatabaseError::HealthCheckFailed(format!("PostgreSQL health check failed: {}", e))
    })?;

    debug!("PostgreSQL health check passed");
    Ok(())
}
