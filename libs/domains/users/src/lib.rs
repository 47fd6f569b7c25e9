//! Users Domain
//!
//! This module provides a complete domain implementation for user management.
//!
//! # Features
//!
//! - User CRUD operations
//! - Email uniqueness enforcement (case-insensitive)
//! - Lifecycle event publication on create and delete
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Business logic, uniqueness checks, events
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┬──────────────┐
//! │ Repository  │  Publisher   │  ← Data access + event sink (traits)
//! └──────┬──────┴──────────────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, DTOs, events
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_users::{
//!     events::NoopEventPublisher,
//!     handlers,
//!     repository::InMemoryUserRepository,
//!     service::UserService,
//! };
//!
//! // Create repository and service
//! let repository = InMemoryUserRepository::new();
//! let service = UserService::new(repository, NoopEventPublisher);
//!
//! // Create Axum router
//! let router = handlers::router(service);
//! ```

pub mod error;
pub mod events;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{UserError, UserResult};
pub use events::{NoopEventPublisher, UserEvent, UserEventKind, UserEventPublisher};
pub use models::{CreateUser, UpdateUser, User, UserResponse};
pub use postgres::PostgresUserRepository;
pub use repository::{InMemoryUserRepository, UserRepository};
pub use service::UserService;
