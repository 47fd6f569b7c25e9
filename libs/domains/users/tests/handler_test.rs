//! Handler tests for Users domain
//!
//! These tests verify that HTTP handlers work correctly:
//! - Request deserialization (JSON → Rust structs)
//! - Response serialization (Rust structs → JSON)
//! - HTTP status codes
//! - Error responses
//! - Event publication counts per operation
//!
//! They run against the in-memory repository, so they test ONLY the
//! users domain handlers, not the full application with routing,
//! database, etc.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use domain_users::*;
use http_body_util::BodyExt;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tower::ServiceExt; // For oneshot()

// Helper to parse JSON response body
async fn json_body<T: serde::de::DeserializeOwned>(body: Body) -> T {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Publisher that records every event so tests can assert counts
#[derive(Debug, Clone, Default)]
struct RecordingPublisher {
    events: Arc<Mutex<Vec<UserEvent>>>,
}

impl RecordingPublisher {
    fn recorded(&self) -> Vec<UserEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl UserEventPublisher for RecordingPublisher {
    async fn publish(&self, event: UserEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn test_app() -> (axum::Router, RecordingPublisher) {
    let publisher = RecordingPublisher::default();
    let service = UserService::new(InMemoryUserRepository::new(), publisher.clone());
    (handlers::router(service), publisher)
}

fn post_user(name: &str, email: &str, age: i32) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_string(&json!({
                "name": name,
                "email": email,
                "age": age
            }))
            .unwrap(),
        ))
        .unwrap()
}

#[tokio::test]
async fn test_create_user_handler_returns_201() {
    let (app, publisher) = test_app();

    let response = app
        .oneshot(post_user("Alice Smith", "alice@example.com", 30))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);

    let user: UserResponse = json_body(response.into_body()).await;
    assert_eq!(user.name, "Alice Smith");
    assert_eq!(user.email, "alice@example.com");
    assert_eq!(user.age, 30);

    let events = publisher.recorded();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, UserEventKind::UserCreated);
    assert_eq!(events[0].user_id, user.id);
}

#[tokio::test]
async fn test_create_user_handler_validates_input() {
    let (app, publisher) = test_app();

    // Name too short, email malformed, age out of range
    let response = app
        .clone()
        .oneshot(post_user("A", "not-an-email", 0))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = json_body(response.into_body()).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");

    assert!(publisher.recorded().is_empty());
}

#[tokio::test]
async fn test_create_user_handler_rejects_missing_fields() {
    let (app, _publisher) = test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"name": "Alice Smith"}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_duplicate_email_returns_400() {
    let (app, publisher) = test_app();

    let response = app
        .clone()
        .oneshot(post_user("Alice Smith", "alice@example.com", 30))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(post_user("Eve Adams", "alice@example.com", 25))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = json_body(response.into_body()).await;
    assert_eq!(body["error"]["type"], "duplicate_email");

    // Only the first create published an event
    assert_eq!(publisher.recorded().len(), 1);
}

#[tokio::test]
async fn test_get_user_handler_returns_200() {
    let (app, _publisher) = test_app();

    let response = app
        .clone()
        .oneshot(post_user("Alice Smith", "alice@example.com", 30))
        .await
        .unwrap();
    let created: UserResponse = json_body(response.into_body()).await;

    let request = Request::builder()
        .method("GET")
        .uri(format!("/{}", created.id))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let user: UserResponse = json_body(response.into_body()).await;
    assert_eq!(user.id, created.id);
    assert_eq!(user.email, "alice@example.com");
}

#[tokio::test]
async fn test_get_user_handler_returns_404_for_missing() {
    let (app, _publisher) = test_app();

    let request = Request::builder()
        .method("GET")
        .uri(format!("/{}", uuid::Uuid::now_v7()))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body: serde_json::Value = json_body(response.into_body()).await;
    assert_eq!(body["error"]["type"], "not_found");
}

#[tokio::test]
async fn test_get_user_handler_rejects_malformed_uuid() {
    let (app, _publisher) = test_app();

    let request = Request::builder()
        .method("GET")
        .uri("/not-a-uuid")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_users_handler_returns_newest_first() {
    let (app, _publisher) = test_app();

    for (name, email) in [
        ("Alice Smith", "alice@example.com"),
        ("Bob Jones", "bob@example.com"),
        ("Carol White", "carol@example.com"),
    ] {
        let response = app.clone().oneshot(post_user(name, email, 30)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let request = Request::builder()
        .method("GET")
        .uri("/")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let users: Vec<UserResponse> = json_body(response.into_body()).await;
    assert_eq!(users.len(), 3);
    assert_eq!(users[0].name, "Carol White");
    assert_eq!(users[1].name, "Bob Jones");
    assert_eq!(users[2].name, "Alice Smith");
}

#[tokio::test]
async fn test_update_user_handler_returns_200_and_publishes_nothing() {
    let (app, publisher) = test_app();

    let response = app
        .clone()
        .oneshot(post_user("Alice Smith", "alice@example.com", 30))
        .await
        .unwrap();
    let created: UserResponse = json_body(response.into_body()).await;

    let request = Request::builder()
        .method("PUT")
        .uri(format!("/{}", created.id))
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_string(&json!({
                "name": "Alice Updated",
                "email": "alice.updated@example.com",
                "age": 31
            }))
            .unwrap(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let user: UserResponse = json_body(response.into_body()).await;
    assert_eq!(user.id, created.id);
    assert_eq!(user.name, "Alice Updated");
    assert_eq!(user.email, "alice.updated@example.com");
    assert_eq!(user.created_at, created.created_at);

    // Still only the create event; updates are not announced
    let events = publisher.recorded();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, UserEventKind::UserCreated);
}

#[tokio::test]
async fn test_update_user_handler_returns_404_for_missing() {
    let (app, _publisher) = test_app();

    let request = Request::builder()
        .method("PUT")
        .uri(format!("/{}", uuid::Uuid::now_v7()))
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_string(&json!({
                "name": "Ghost User",
                "email": "ghost@example.com",
                "age": 40
            }))
            .unwrap(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_user_handler_rejects_taken_email() {
    let (app, _publisher) = test_app();

    app.clone()
        .oneshot(post_user("Alice Smith", "alice@example.com", 30))
        .await
        .unwrap();
    let response = app
        .clone()
        .oneshot(post_user("Bob Jones", "bob@example.com", 35))
        .await
        .unwrap();
    let bob: UserResponse = json_body(response.into_body()).await;

    let request = Request::builder()
        .method("PUT")
        .uri(format!("/{}", bob.id))
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_string(&json!({
                "name": "Bob Jones",
                "email": "alice@example.com",
                "age": 35
            }))
            .unwrap(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = json_body(response.into_body()).await;
    assert_eq!(body["error"]["type"], "duplicate_email");
}

#[tokio::test]
async fn test_delete_user_handler_returns_204_then_404() {
    let (app, publisher) = test_app();

    let response = app
        .clone()
        .oneshot(post_user("Alice Smith", "alice@example.com", 30))
        .await
        .unwrap();
    let created: UserResponse = json_body(response.into_body()).await;

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/{}", created.id))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Gone afterwards
    let request = Request::builder()
        .method("GET")
        .uri(format!("/{}", created.id))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let events = publisher.recorded();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_type, UserEventKind::UserCreated);
    assert_eq!(events[1].event_type, UserEventKind::UserDeleted);
    assert_eq!(events[1].user_email, "alice@example.com");
    assert_eq!(events[1].user_name, "Alice Smith");
}

#[tokio::test]
async fn test_delete_user_handler_returns_404_for_missing() {
    let (app, publisher) = test_app();

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/{}", uuid::Uuid::now_v7()))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(publisher.recorded().is_empty());
}
