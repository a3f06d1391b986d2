//! Presentation Layer
//!
//! Operational HTTP surface: health checks, metrics and backlog control.

pub mod http;
pub mod middleware;
