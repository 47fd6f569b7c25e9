use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Custom validator rejecting names that are only whitespace
fn validate_not_blank(name: &str) -> Result<(), validator::ValidationError> {
    if name.trim().is_empty() {
        return Err(validator::ValidationError::new("blank"));
    }
    Ok(())
}

/// User entity - matches SQL schema
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Unique identifier
    pub id: Uuid,
    /// User display name
    pub name: String,
    /// User email (unique)
    pub email: String,
    /// User age in years
    pub age: i32,
    /// Creation timestamp, set once on first save
    pub created_at: DateTime<Utc>,
}

/// DTO for creating a new user
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 2, max = 50), custom(function = "validate_not_blank"))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(range(min = 1, max = 150))]
    pub age: i32,
}

/// DTO for updating an existing user
///
/// All fields are required: an update overwrites name, email and age
/// wholesale. The identifier and creation timestamp are never touched.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(length(min = 2, max = 50), custom(function = "validate_not_blank"))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(range(min = 1, max = 150))]
    pub age: i32,
}

/// User response DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            age: user.age,
            created_at: user.created_at,
        }
    }
}

impl User {
    /// Create a new user from the CreateUser DTO
    pub fn new(input: CreateUser) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: input.name,
            email: input.email,
            age: input.age,
            created_at: Utc::now(),
        }
    }

    /// Overwrite the mutable fields; id and created_at stay untouched
    pub fn apply_update(&mut self, update: UpdateUser) {
        self.name = update.name;
        self.email = update.email;
        self.age = update.age;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_create() -> CreateUser {
        CreateUser {
            name: "Alice Smith".to_string(),
            email: "alice@example.com".to_string(),
            age: 30,
        }
    }

    #[test]
    fn test_valid_input_passes_validation() {
        assert!(valid_create().validate().is_ok());
    }

    #[test]
    fn test_name_length_bounds() {
        let mut input = valid_create();

        input.name = "A".to_string();
        assert!(input.validate().is_err(), "1-char name should fail");

        input.name = "Al".to_string();
        assert!(input.validate().is_ok(), "2-char name should pass");

        input.name = "a".repeat(50);
        assert!(input.validate().is_ok(), "50-char name should pass");

        input.name = "a".repeat(51);
        assert!(input.validate().is_err(), "51-char name should fail");
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut input = valid_create();
        input.name = "   ".to_string();
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_email_syntax_validated() {
        let mut input = valid_create();
        input.email = "not-an-email".to_string();
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_age_range_bounds() {
        let mut input = valid_create();

        input.age = 0;
        assert!(input.validate().is_err(), "age 0 should fail");

        input.age = 1;
        assert!(input.validate().is_ok(), "age 1 should pass");

        input.age = 150;
        assert!(input.validate().is_ok(), "age 150 should pass");

        input.age = 151;
        assert!(input.validate().is_err(), "age 151 should fail");
    }

    #[test]
    fn test_apply_update_preserves_id_and_created_at() {
        let mut user = User::new(valid_create());
        let id = user.id;
        let created_at = user.created_at;

        user.apply_update(UpdateUser {
            name: "Alice Updated".to_string(),
            email: "alice.updated@example.com".to_string(),
            age: 31,
        });

        assert_eq!(user.id, id);
        assert_eq!(user.created_at, created_at);
        assert_eq!(user.name, "Alice Updated");
        assert_eq!(user.email, "alice.updated@example.com");
        assert_eq!(user.age, 31);
    }
}
