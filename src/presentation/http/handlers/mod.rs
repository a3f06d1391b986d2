//! HTTP Handlers
//!
//! Request handlers for the operational endpoints.

pub mod admin;
pub mod health;
