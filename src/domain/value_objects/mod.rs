//! # Domain Value Objects
//!
//! Immutable value types that represent domain concepts without identity.
//!
//! ## Value Objects
//!
//! - **VoteDirection**: requested direction / current state of a vote (UP, DOWN, NONE)
//! - **VoteType**: direction stored on a ledger record (UP, DOWN)
//! - **VoteTarget**: the votable kinds, one ledger each
//! - **VoteTally**: denormalized up/down counters

mod vote;

pub use vote::*;
