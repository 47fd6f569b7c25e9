//! Integration tests for Users domain
//!
//! These tests use real PostgreSQL via testcontainers to ensure:
//! - Database queries work correctly
//! - The unique email constraint is enforced
//! - Listing order is stable
//! - Concurrent operations are handled properly

use domain_users::*;
use test_utils::{TestDataBuilder, TestDatabase, assertions::*};
use uuid::Uuid;

fn create_input(name: &str, email: &str, age: i32) -> CreateUser {
    CreateUser {
        name: name.to_string(),
        email: email.to_string(),
        age,
    }
}

// ============================================================================
// Repository Tests
// ============================================================================

#[tokio::test]
async fn test_create_and_get_user() {
    let db = TestDatabase::new().await;
    let repo = PostgresUserRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("create_and_get");

    let created = repo
        .create(create_input("Alice Smith", &builder.email("alice"), 30))
        .await
        .unwrap();

    assert_eq!(created.name, "Alice Smith");
    assert_eq!(created.email, builder.email("alice"));
    assert_eq!(created.age, 30);

    let retrieved = repo.get_by_id(created.id).await.unwrap();
    let retrieved = assert_some(retrieved, "user should exist");

    assert_uuid_eq(retrieved.id, created.id, "retrieved user id");
    assert_eq!(retrieved.email, created.email);
    assert_eq!(retrieved.created_at, created.created_at);
}

#[tokio::test]
async fn test_get_missing_user_returns_none() {
    let db = TestDatabase::new().await;
    let repo = PostgresUserRepository::new(db.connection());

    let result = repo.get_by_id(Uuid::now_v7()).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_unique_email_constraint() {
    let db = TestDatabase::new().await;
    let repo = PostgresUserRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("unique_email");

    repo.create(create_input("Alice Smith", &builder.email("alice"), 30))
        .await
        .unwrap();

    // Same email again hits the constraint and comes back typed
    let result = repo
        .create(create_input("Eve Adams", &builder.email("alice"), 25))
        .await;
    assert!(matches!(result, Err(UserError::DuplicateEmail(_))));
}

#[tokio::test]
async fn test_email_exists_is_case_insensitive() {
    let db = TestDatabase::new().await;
    let repo = PostgresUserRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("email_case");

    let email = builder.email("alice");
    repo.create(create_input("Alice Smith", &email, 30))
        .await
        .unwrap();

    assert!(repo.email_exists(&email).await.unwrap());
    assert!(repo.email_exists(&email.to_uppercase()).await.unwrap());
    assert!(!repo.email_exists(&builder.email("nobody")).await.unwrap());
}

#[tokio::test]
async fn test_update_user_row() {
    let db = TestDatabase::new().await;
    let repo = PostgresUserRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("update_row");

    let mut user = repo
        .create(create_input("Alice Smith", &builder.email("alice"), 30))
        .await
        .unwrap();
    let created_at = user.created_at;

    user.name = "Alice Updated".to_string();
    user.age = 31;
    let updated = repo.update(user.clone()).await.unwrap();

    assert_eq!(updated.name, "Alice Updated");
    assert_eq!(updated.age, 31);
    assert_eq!(updated.created_at, created_at);

    let reloaded = assert_some(
        repo.get_by_id(user.id).await.unwrap(),
        "updated user should exist",
    );
    assert_eq!(reloaded.name, "Alice Updated");
}

#[tokio::test]
async fn test_update_missing_user_is_not_found() {
    let db = TestDatabase::new().await;
    let repo = PostgresUserRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("update_missing");

    let ghost = User {
        id: Uuid::now_v7(),
        name: "Ghost User".to_string(),
        email: builder.email("ghost"),
        age: 40,
        created_at: chrono::Utc::now(),
    };

    let result = repo.update(ghost).await;
    assert!(matches!(result, Err(UserError::NotFound(_))));
}

#[tokio::test]
async fn test_delete_user_row() {
    let db = TestDatabase::new().await;
    let repo = PostgresUserRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("delete_row");

    let user = repo
        .create(create_input("Alice Smith", &builder.email("alice"), 30))
        .await
        .unwrap();

    assert!(repo.delete(user.id).await.unwrap());
    assert!(!repo.delete(user.id).await.unwrap());
    assert!(repo.get_by_id(user.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_users_newest_first() {
    let db = TestDatabase::new().await;
    let repo = PostgresUserRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("list_order");

    for (name, local) in [
        ("Alice Smith", "alice"),
        ("Bob Jones", "bob"),
        ("Carol White", "carol"),
    ] {
        repo.create(create_input(name, &builder.email(local), 30))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let users = repo.list().await.unwrap();
    assert_eq!(users.len(), 3);
    assert_eq!(users[0].name, "Carol White");
    assert_eq!(users[1].name, "Bob Jones");
    assert_eq!(users[2].name, "Alice Smith");
}

// ============================================================================
// Service Scenario Tests
// ============================================================================

#[tokio::test]
async fn test_duplicate_email_scenario_leaves_store_untouched() {
    let db = TestDatabase::new().await;
    let repo = PostgresUserRepository::new(db.connection());
    let service = UserService::new(repo, NoopEventPublisher);
    let builder = TestDataBuilder::from_test_name("dup_scenario");

    let alice = service
        .create_user(create_input("Alice Smith", &builder.email("alice"), 30))
        .await
        .unwrap();
    let bob = service
        .create_user(create_input("Bob Jones", &builder.email("bob"), 35))
        .await
        .unwrap();

    // Eve reuses Alice's email and is rejected
    let result = service
        .create_user(create_input("Eve Adams", &builder.email("alice"), 25))
        .await;
    assert!(matches!(result, Err(UserError::DuplicateEmail(_))));

    // Row count unchanged by the failed create
    let users = service.list_users().await.unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().any(|u| u.id == alice.id));
    assert!(users.iter().any(|u| u.id == bob.id));
}

#[tokio::test]
async fn test_update_keeping_own_email_is_not_a_conflict() {
    let db = TestDatabase::new().await;
    let repo = PostgresUserRepository::new(db.connection());
    let service = UserService::new(repo, NoopEventPublisher);
    let builder = TestDataBuilder::from_test_name("own_email");

    let alice = service
        .create_user(create_input("Alice Smith", &builder.email("alice"), 30))
        .await
        .unwrap();

    let updated = service
        .update_user(
            alice.id,
            UpdateUser {
                name: "Alice Renamed".to_string(),
                email: builder.email("alice"),
                age: 31,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Alice Renamed");
    assert_eq!(updated.email, builder.email("alice"));
    assert_eq!(updated.created_at, alice.created_at);
}

#[tokio::test]
async fn test_update_to_another_users_email_is_rejected() {
    let db = TestDatabase::new().await;
    let repo = PostgresUserRepository::new(db.connection());
    let service = UserService::new(repo, NoopEventPublisher);
    let builder = TestDataBuilder::from_test_name("cross_conflict");

    service
        .create_user(create_input("Alice Smith", &builder.email("alice"), 30))
        .await
        .unwrap();
    let bob = service
        .create_user(create_input("Bob Jones", &builder.email("bob"), 35))
        .await
        .unwrap();

    let result = service
        .update_user(
            bob.id,
            UpdateUser {
                name: "Bob Jones".to_string(),
                email: builder.email("alice"),
                age: 35,
            },
        )
        .await;
    assert!(matches!(result, Err(UserError::DuplicateEmail(_))));

    // Bob keeps his original email
    let reloaded = service.get_user(bob.id).await.unwrap();
    assert_eq!(reloaded.email, builder.email("bob"));
}

#[tokio::test]
async fn test_delete_then_get_is_not_found() {
    let db = TestDatabase::new().await;
    let repo = PostgresUserRepository::new(db.connection());
    let service = UserService::new(repo, NoopEventPublisher);
    let builder = TestDataBuilder::from_test_name("delete_then_get");

    let alice = service
        .create_user(create_input("Alice Smith", &builder.email("alice"), 30))
        .await
        .unwrap();

    service.delete_user(alice.id).await.unwrap();

    let result = service.get_user(alice.id).await;
    assert!(matches!(result, Err(UserError::NotFound(_))));

    let result = service.delete_user(alice.id).await;
    assert!(matches!(result, Err(UserError::NotFound(_))));
}

// ============================================================================
// Concurrent Operations Tests
// ============================================================================

#[tokio::test]
async fn test_concurrent_creates_with_same_email() {
    let db = TestDatabase::new().await;
    let builder = TestDataBuilder::from_test_name("concurrent_email");
    let email = builder.email("contended");

    // Spawn racing creates for the same email; the pre-check can pass
    // for several of them, the unique constraint decides the winner
    let mut handles = vec![];
    for i in 0..5 {
        let repo = PostgresUserRepository::new(db.connection());
        let service = UserService::new(repo, NoopEventPublisher);
        let email = email.clone();

        let handle = tokio::spawn(async move {
            service
                .create_user(create_input(&format!("Racer {}", i), &email, 30))
                .await
        });
        handles.push(handle);
    }

    let results: Vec<_> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one create should win");

    for result in results {
        if let Err(e) = result {
            assert!(matches!(e, UserError::DuplicateEmail(_)));
        }
    }

    // Exactly one row made it in
    let repo = PostgresUserRepository::new(db.connection());
    assert!(repo.email_exists(&email).await.unwrap());
    let users = repo.list().await.unwrap();
    assert_eq!(users.len(), 1);
}

#[tokio::test]
async fn test_concurrent_creates_with_distinct_emails() {
    let db = TestDatabase::new().await;
    let builder = TestDataBuilder::from_test_name("concurrent_distinct");

    let mut handles = vec![];
    for i in 0..5 {
        let repo = PostgresUserRepository::new(db.connection());
        let email = builder.email(&format!("user{}", i));

        let handle =
            tokio::spawn(
                async move { repo.create(create_input(&format!("User {}", i), &email, 30)).await },
            );
        handles.push(handle);
    }

    let results: Vec<_> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    for result in results {
        assert!(result.is_ok(), "concurrent create should succeed");
    }

    let repo = PostgresUserRepository::new(db.connection());
    let users = repo.list().await.unwrap();
    assert_eq!(users.len(), 5, "all users should be created");
}
