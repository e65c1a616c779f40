//! # Forum Chat
//!
//! Real-time broadcast chat service for the forum, backed by JWT
//! authentication and an append-only PostgreSQL message log:
//! - RESTful endpoints for registration, login, and chat history
//! - WebSocket endpoint fanning every message out to all connected clients
//! - Append-only session records auditing every token ever issued
//!
//! ## Architecture
//!
//! The crate follows Clean Architecture principles:
//!
//! - **Domain Layer**: Core business entities and repository traits
//! - **Application Layer**: Business logic services and DTOs
//! - **Infrastructure Layer**: Database and metrics implementations
//! - **Presentation Layer**: HTTP handlers and the WebSocket hub
//!
//! ## Module Structure
//!
//! ```text
//! forum_chat/
//! +-- config/        Configuration management
//! +-- domain/        Domain entities and repository traits
//! +-- application/   Application services and DTOs
//! +-- infrastructure/ Database and metrics implementations
//! +-- presentation/  HTTP routes, WebSocket hub and handlers
//! +-- shared/        Common utilities (errors)
//! ```

// Configuration module
pub mod config;

// Domain layer - Core business logic
pub mod domain;

// Application layer - Business services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP and WebSocket handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
