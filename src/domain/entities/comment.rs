//! Comment entity and repository trait.
//!
//! Maps to the `comments` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::VoteTally;
use crate::shared::error::AppError;

/// A comment on a post, optionally replying to another comment.
///
/// Maps to the `comments` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - content: TEXT NOT NULL
/// - author_id: BIGINT NOT NULL
/// - post_id: BIGINT NOT NULL
/// - parent_id: BIGINT NULL -- NULL for top-level comments
/// - upvotes_count, downvotes_count, replies_count: INTEGER NOT NULL DEFAULT 0
/// - created_at: TIMESTAMPTZ NOT NULL
/// - indexed: BOOLEAN NOT NULL DEFAULT FALSE
/// - sync_version: BIGINT NOT NULL DEFAULT 0 -- bumped by every mirrored-field write
/// - sync_attempted_at: TIMESTAMPTZ NULL -- last backlog attempt, not loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub author_id: i64,
    pub post_id: i64,
    pub parent_id: Option<i64>,
    pub upvotes_count: i32,
    pub downvotes_count: i32,
    pub replies_count: i32,
    pub created_at: DateTime<Utc>,
    pub indexed: bool,
    pub sync_version: i64,
}

impl Comment {
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn tally(&self) -> VoteTally {
        VoteTally::new(self.upvotes_count, self.downvotes_count)
    }
}

/// Repository trait for Comment data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Insert a comment, bump the post's `comments_count` and, for replies,
    /// the parent's `replies_count`, all as one unit. A missing post or
    /// parent is `NotFound` and nothing is written.
    async fn create(&self, comment: &Comment) -> Result<Comment, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Comment>, AppError>;

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Comment>, AppError>;

    /// Comments of a post at one level of the thread, newest first.
    /// `parent_id = None` lists top-level comments.
    async fn list_by_post(
        &self,
        post_id: i64,
        parent_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Comment>, AppError>;

    /// Direct replies to a comment, oldest first.
    async fn list_replies(&self, parent_id: i64, limit: i64, offset: i64)
        -> Result<Vec<Comment>, AppError>;

    async fn list_by_author(&self, author_id: i64, limit: i64, offset: i64)
        -> Result<Vec<Comment>, AppError>;

    /// Ids of every comment on any of the given posts.
    async fn find_ids_by_posts(&self, post_ids: &[i64]) -> Result<Vec<i64>, AppError>;

    /// Bulk delete by post. Returns the number of removed comments.
    async fn delete_by_posts(&self, post_ids: &[i64]) -> Result<u64, AppError>;

    async fn list_unindexed(&self, limit: i64) -> Result<Vec<Comment>, AppError>;

    async fn mark_attempted(&self, ids: &[i64]) -> Result<(), AppError>;

    /// Conditional on `sync_version`; a stale version clears the flag instead.
    async fn mark_indexed(&self, id: i64, sync_version: i64) -> Result<bool, AppError>;
}
