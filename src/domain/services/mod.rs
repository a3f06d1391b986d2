//! # Domain Services
//!
//! Pure business rules that do not belong to a single entity.
//!
//! ## Services
//!
//! - **vote_ledger**: vote toggle state machine and counter deltas
//! - **autolink**: longest-match title linking for article bodies

pub mod autolink;
pub mod vote_ledger;

pub use autolink::{auto_link, TitleIndex};
pub use vote_ledger::{CounterDelta, LedgerAction, VoteTransition};
