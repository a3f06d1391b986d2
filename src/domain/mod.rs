//! # Domain Layer
//!
//! The domain layer contains the core rules of the community store.
//! It is independent of any external frameworks or infrastructure concerns.
//!
//! ## Structure
//!
//! - **entities**: Documents and their repository traits (Article, Group, Post, ...)
//! - **value_objects**: Immutable value types (vote directions, tallies)
//! - **services**: Vote ledger state machine and auto-link rewriter
//! - **search**: Search mirror port and the flattened documents it receives
//!
//! ## Design Principles
//!
//! - No dependencies on infrastructure or presentation layers
//! - Repository and mirror traits define the data access contracts
//! - Entities encapsulate domain behavior

pub mod entities;
pub mod search;
pub mod services;
pub mod value_objects;

// Re-export commonly used types
pub use entities::*;
pub use value_objects::*;
