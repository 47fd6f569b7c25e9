use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DbBackend, FromQueryResult, Statement};
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, User};
use crate::repository::UserRepository;

/// PostgreSQL-backed repository using raw SQL over sea-orm
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    db: sea_orm::DatabaseConnection,
}

impl PostgresUserRepository {
    pub fn new(db: sea_orm::DatabaseConnection) -> Self {
        Self { db }
    }
}

#[derive(Debug, FromQueryResult)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    age: i32,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            age: row.age,
            created_at: row.created_at,
        }
    }
}

/// Turn a write failure into a typed error, sniffing unique violations
fn map_write_error(e: sea_orm::DbErr, email: &str) -> UserError {
    let err_str = e.to_string();
    if err_str.contains("duplicate key") || err_str.contains("unique constraint") {
        UserError::DuplicateEmail(email.to_string())
    } else {
        UserError::Internal(format!("Database error: {}", e))
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, input: CreateUser) -> UserResult<User> {
        let user = User::new(input);

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"
            INSERT INTO users (id, name, email, age, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
            [
                user.id.into(),
                user.name.clone().into(),
                user.email.clone().into(),
                user.age.into(),
                user.created_at.into(),
            ],
        );

        let row = UserRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(|e| map_write_error(e, &user.email))?;

        let created = row
            .map(User::from)
            .ok_or_else(|| UserError::Internal("Failed to create user".to_string()))?;

        tracing::info!(user_id = %created.id, email = %created.email, "Created user");
        Ok(created)
    }

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT * FROM users WHERE id = $1",
            [id.into()],
        );

        let row = UserRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(|e| UserError::Internal(format!("Database error: {}", e)))?;

        Ok(row.map(User::from))
    }

    async fn list(&self) -> UserResult<Vec<User>> {
        let stmt = Statement::from_string(
            DbBackend::Postgres,
            "SELECT * FROM users ORDER BY created_at DESC, id DESC",
        );

        let rows = UserRow::find_by_statement(stmt)
            .all(&self.db)
            .await
            .map_err(|e| UserError::Internal(format!("Database error: {}", e)))?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn update(&self, user: User) -> UserResult<User> {
        // created_at is never written after the first save
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"
            UPDATE users
            SET name = $2, email = $3, age = $4
            WHERE id = $1
            RETURNING *
            "#,
            [
                user.id.into(),
                user.name.clone().into(),
                user.email.clone().into(),
                user.age.into(),
            ],
        );

        let row = UserRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(|e| map_write_error(e, &user.email))?;

        row.map(User::from).ok_or(UserError::NotFound(user.id))
    }

    async fn delete(&self, id: Uuid) -> UserResult<bool> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "DELETE FROM users WHERE id = $1",
            [id.into()],
        );

        let result = self
            .db
            .execute_raw(stmt)
            .await
            .map_err(|e| UserError::Internal(format!("Database error: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn email_exists(&self, email: &str) -> UserResult<bool> {
        #[derive(FromQueryResult)]
        struct ExistsResult {
            exists: bool,
        }

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1)) as exists",
            [email.into()],
        );

        let result = ExistsResult::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(|e| UserError::Internal(format!("Database error: {}", e)))?;

        Ok(result.map(|r| r.exists).unwrap_or(false))
    }
}
