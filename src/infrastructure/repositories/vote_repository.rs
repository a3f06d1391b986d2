//! Vote Repository Implementation
//!
//! PostgreSQL implementation of the vote ledgers (`votes` for posts,
//! `comment_votes` for comments). A vote request runs in one transaction
//! that locks the target row first, so concurrent requests on the same
//! target are serialized and the counters always match the ledger.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::services::vote_ledger::{LedgerAction, VoteTransition};
use crate::domain::{Vote, VoteDirection, VoteOutcome, VoteRepository, VoteTally, VoteTarget, VoteType};
use crate::shared::error::AppError;

/// Table layout for one votable kind.
struct LedgerTables {
    ledger: &'static str,
    column: &'static str,
    target: &'static str,
}

fn tables(target: VoteTarget) -> LedgerTables {
    match target {
        VoteTarget::Post => LedgerTables {
            ledger: "votes",
            column: "post_id",
            target: "posts",
        },
        VoteTarget::Comment => LedgerTables {
            ledger: "comment_votes",
            column: "comment_id",
            target: "comments",
        },
    }
}

#[derive(Debug, sqlx::FromRow)]
struct VoteRow {
    id: i64,
    user_id: i64,
    target_id: i64,
    vote_type: String,
    created_at: DateTime<Utc>,
}

impl VoteRow {
    fn into_vote(self, target: VoteTarget) -> Result<Vote, AppError> {
        let vote_type = VoteType::from_db(&self.vote_type).ok_or_else(|| {
            AppError::Internal(format!("Unknown vote type '{}' in ledger", self.vote_type))
        })?;

        Ok(Vote {
            id: self.id,
            user_id: self.user_id,
            target,
            target_id: self.target_id,
            vote_type,
            created_at: self.created_at,
        })
    }
}

/// PostgreSQL vote ledger repository implementation.
#[derive(Clone)]
pub struct PgVoteRepository {
    pool: PgPool,
}

impl PgVoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VoteRepository for PgVoteRepository {
    async fn find_vote(
        &self,
        target: VoteTarget,
        user_id: i64,
        target_id: i64,
    ) -> Result<Option<Vote>, AppError> {
        let t = tables(target);
        let row = sqlx::query_as::<_, VoteRow>(&format!(
            r#"
            SELECT id, user_id, {col} AS target_id, vote_type, created_at
            FROM {ledger}
            WHERE user_id = $1 AND {col} = $2
            "#,
            col = t.column,
            ledger = t.ledger,
        ))
        .bind(user_id)
        .bind(target_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_vote(target)).transpose()
    }

    async fn apply_vote(
        &self,
        target: VoteTarget,
        user_id: i64,
        target_id: i64,
        requested: VoteDirection,
        new_vote_id: i64,
    ) -> Result<VoteOutcome, AppError> {
        let t = tables(target);
        let mut tx = self.pool.begin().await?;

        let counters: Option<(i32, i32)> = sqlx::query_as(&format!(
            "SELECT upvotes_count, downvotes_count FROM {} WHERE id = $1 FOR UPDATE",
            t.target
        ))
        .bind(target_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (upvotes, downvotes) = counters.ok_or_else(|| {
            AppError::NotFound(format!("{} {} not found", target, target_id))
        })?;

        let current: Option<String> = sqlx::query_scalar(&format!(
            "SELECT vote_type FROM {} WHERE user_id = $1 AND {} = $2",
            t.ledger, t.column
        ))
        .bind(user_id)
        .bind(target_id)
        .fetch_optional(&mut *tx)
        .await?;

        let transition =
            VoteTransition::plan(current.as_deref().and_then(VoteType::from_db), requested);

        match transition.action {
            LedgerAction::Keep => {
                tx.rollback().await?;
                return Ok(VoteOutcome {
                    transition,
                    tally: VoteTally::new(upvotes, downvotes),
                });
            }
            LedgerAction::Insert(vote_type) => {
                sqlx::query(&format!(
                    "INSERT INTO {} (id, user_id, {}, vote_type, created_at) VALUES ($1, $2, $3, $4, NOW())",
                    t.ledger, t.column
                ))
                .bind(new_vote_id)
                .bind(user_id)
                .bind(target_id)
                .bind(vote_type.as_str())
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::from_write(e, "Vote already recorded for this target"))?;
            }
            LedgerAction::Flip { to, .. } => {
                sqlx::query(&format!(
                    "UPDATE {} SET vote_type = $3 WHERE user_id = $1 AND {} = $2",
                    t.ledger, t.column
                ))
                .bind(user_id)
                .bind(target_id)
                .bind(to.as_str())
                .execute(&mut *tx)
                .await?;
            }
            LedgerAction::Remove(_) => {
                sqlx::query(&format!(
                    "DELETE FROM {} WHERE user_id = $1 AND {} = $2",
                    t.ledger, t.column
                ))
                .bind(user_id)
                .bind(target_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        let (upvotes, downvotes): (i32, i32) = sqlx::query_as(&format!(
            r#"
            UPDATE {}
            SET upvotes_count = upvotes_count + $2,
                downvotes_count = downvotes_count + $3
            WHERE id = $1
            RETURNING upvotes_count, downvotes_count
            "#,
            t.target
        ))
        .bind(target_id)
        .bind(transition.delta.upvotes)
        .bind(transition.delta.downvotes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(VoteOutcome {
            transition,
            tally: VoteTally::new(upvotes, downvotes),
        })
    }

    async fn delete_by_targets(
        &self,
        target: VoteTarget,
        target_ids: &[i64],
    ) -> Result<u64, AppError> {
        if target_ids.is_empty() {
            return Ok(0);
        }

        let t = tables(target);
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE {} = ANY($1)",
            t.ledger, t.column
        ))
        .bind(target_ids)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn count_for_target(&self, target: VoteTarget, target_id: i64) -> Result<i64, AppError> {
        let t = tables(target);
        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {} WHERE {} = $1",
            t.ledger, t.column
        ))
        .bind(target_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
