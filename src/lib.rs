//! # Community Store Library
//!
//! Persistence and consistency layer for a community/wiki platform:
//! - Articles with auto-linked titles
//! - Groups, posts, threaded comments and votes
//! - Group discussions with channels and messages
//! - A best-effort search mirror reconciled by a backlog sweep
//!
//! ## Architecture
//!
//! The crate follows Clean Architecture principles:
//!
//! - **Domain Layer**: Entities, repository traits, the vote state machine,
//!   the auto-link rewriter and the search mirror port
//! - **Application Layer**: Services, search sync, group cascade and the sweeper
//! - **Infrastructure Layer**: PostgreSQL and in-memory stores, search mirror clients, metrics
//! - **Presentation Layer**: Operational HTTP endpoints
//!
//! ## Module Structure
//!
//! ```text
//! community_store/
//! +-- config/         Configuration management
//! +-- domain/         Entities, value objects, domain services, ports
//! +-- application/    Application services and DTOs
//! +-- infrastructure/ Store and search mirror implementations
//! +-- presentation/   Health, metrics and admin routes
//! +-- shared/         Common utilities (errors, snowflake IDs, ordering)
//! ```

// Configuration module
pub mod config;

// Domain layer - Core business logic
pub mod domain;

// Application layer - Business services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - Operational HTTP surface
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
