//! Operational HTTP endpoint tests.

mod admin_tests;
mod health_tests;
