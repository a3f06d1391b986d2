//! Infrastructure Layer
//!
//! Contains implementations for external services including:
//! - Primary store adapters (PostgreSQL repositories, in-memory store)
//! - Search mirror adapters (HTTP, in-memory, no-op)
//! - Prometheus metrics

pub mod database;
pub mod memory;
pub mod metrics;
pub mod repositories;
pub mod search;
pub mod store;

pub use store::Repositories;
