//! End-to-end flows through the application services on the in-memory store.

mod autolink_tests;
mod backlog_tests;
mod cascade_tests;
mod community_tests;
mod vote_tests;
