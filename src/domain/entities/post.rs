//! Post entity and repository trait.
//!
//! Maps to the `posts` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::VoteTally;
use crate::shared::error::AppError;

/// A post inside a group.
///
/// Maps to the `posts` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - title, content: TEXT NOT NULL
/// - author_id: BIGINT NOT NULL
/// - group_id: BIGINT NOT NULL
/// - comments_count, upvotes_count, downvotes_count: INTEGER NOT NULL DEFAULT 0
/// - created_at: TIMESTAMPTZ NOT NULL
/// - indexed: BOOLEAN NOT NULL DEFAULT FALSE
/// - sync_version: BIGINT NOT NULL DEFAULT 0 -- bumped by every mirrored-field write
/// - sync_attempted_at: TIMESTAMPTZ NULL -- last backlog attempt, not loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub group_id: i64,
    pub comments_count: i32,
    pub upvotes_count: i32,
    pub downvotes_count: i32,
    pub created_at: DateTime<Utc>,
    pub indexed: bool,
    pub sync_version: i64,
}

impl Post {
    pub fn tally(&self) -> VoteTally {
        VoteTally::new(self.upvotes_count, self.downvotes_count)
    }
}

/// Repository trait for Post data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: &Post) -> Result<Post, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, AppError>;

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Post>, AppError>;

    /// Posts of one group, newest first.
    async fn list_by_group(&self, group_id: i64, limit: i64, offset: i64)
        -> Result<Vec<Post>, AppError>;

    /// Posts of any of the given groups, newest first.
    async fn list_by_groups(
        &self,
        group_ids: &[i64],
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, AppError>;

    async fn list_by_author(&self, author_id: i64, limit: i64, offset: i64)
        -> Result<Vec<Post>, AppError>;

    /// Ids of every post of a group.
    async fn find_ids_by_group(&self, group_id: i64) -> Result<Vec<i64>, AppError>;

    /// Bulk delete by group. Returns the number of removed posts.
    async fn delete_by_group(&self, group_id: i64) -> Result<u64, AppError>;

    /// Posts the search mirror has not confirmed yet, least recently
    /// attempted first.
    async fn list_unindexed(&self, limit: i64) -> Result<Vec<Post>, AppError>;

    /// Stamp a backlog attempt so the next listing rotates past these rows.
    async fn mark_attempted(&self, ids: &[i64]) -> Result<(), AppError>;

    /// Set `indexed` when `sync_version` is still current and clear it
    /// otherwise. Returns whether the flag was set.
    async fn mark_indexed(&self, id: i64, sync_version: i64) -> Result<bool, AppError>;
}
