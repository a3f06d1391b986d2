//! Shared Utilities
//!
//! Common utilities used across all layers.

pub mod error;
pub mod ordering;
pub mod snowflake;
pub mod validation;
