//! Vote ledger records and repository trait.
//!
//! Maps to the `votes` (posts) and `comment_votes` (comments) tables.
//! Both tables carry a unique index on (user_id, target), so a voter has at
//! most one record per target.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::services::vote_ledger::VoteTransition;
use crate::domain::value_objects::{VoteDirection, VoteTally, VoteTarget, VoteType};
use crate::shared::error::AppError;

/// A single ledger record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub id: i64,
    pub user_id: i64,
    pub target: VoteTarget,
    pub target_id: i64,
    pub vote_type: VoteType,
    pub created_at: DateTime<Utc>,
}

/// Result of applying a vote request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteOutcome {
    pub transition: VoteTransition,

    /// Target counters after the transition.
    pub tally: VoteTally,
}

/// Repository trait for the vote ledgers.
#[async_trait]
pub trait VoteRepository: Send + Sync {
    /// Current record of a voter on a target, if any.
    async fn find_vote(
        &self,
        target: VoteTarget,
        user_id: i64,
        target_id: i64,
    ) -> Result<Option<Vote>, AppError>;

    /// Apply `requested` for (user, target).
    ///
    /// Reading the current record, mutating the ledger and applying the
    /// counter delta on the target happen as one unit; concurrent requests
    /// on the same pair are serialized. `new_vote_id` is used only when a
    /// record has to be created. A missing target is `NotFound` and leaves
    /// the ledger untouched.
    async fn apply_vote(
        &self,
        target: VoteTarget,
        user_id: i64,
        target_id: i64,
        requested: VoteDirection,
        new_vote_id: i64,
    ) -> Result<VoteOutcome, AppError>;

    /// Bulk delete every record pointing at any of `target_ids`.
    async fn delete_by_targets(&self, target: VoteTarget, target_ids: &[i64])
        -> Result<u64, AppError>;

    /// Number of records pointing at a target.
    async fn count_for_target(&self, target: VoteTarget, target_id: i64) -> Result<i64, AppError>;
}
