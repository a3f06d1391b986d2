//! Comment Repository Implementation
//!
//! PostgreSQL implementation of the CommentRepository trait. Creating a
//! comment also bumps the post's `comments_count` and the parent's
//! `replies_count` inside one transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Comment, CommentRepository};
use crate::shared::error::AppError;

const COMMENT_COLUMNS: &str = "id, content, author_id, post_id, parent_id, upvotes_count, \
     downvotes_count, replies_count, created_at, indexed, sync_version";

#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: i64,
    content: String,
    author_id: i64,
    post_id: i64,
    parent_id: Option<i64>,
    upvotes_count: i32,
    downvotes_count: i32,
    replies_count: i32,
    created_at: DateTime<Utc>,
    indexed: bool,
    sync_version: i64,
}

impl CommentRow {
    fn into_comment(self) -> Comment {
        Comment {
            id: self.id,
            content: self.content,
            author_id: self.author_id,
            post_id: self.post_id,
            parent_id: self.parent_id,
            upvotes_count: self.upvotes_count,
            downvotes_count: self.downvotes_count,
            replies_count: self.replies_count,
            created_at: self.created_at,
            indexed: self.indexed,
            sync_version: self.sync_version,
        }
    }
}

/// PostgreSQL comment repository implementation.
#[derive(Clone)]
pub struct PgCommentRepository {
    pool: PgPool,
}

impl PgCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PgCommentRepository {
    async fn create(&self, comment: &Comment) -> Result<Comment, AppError> {
        let mut tx = self.pool.begin().await?;

        let bumped = sqlx::query("UPDATE posts SET comments_count = comments_count + 1 WHERE id = $1")
            .bind(comment.post_id)
            .execute(&mut *tx)
            .await?;
        if bumped.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Post {} not found",
                comment.post_id
            )));
        }

        if let Some(parent_id) = comment.parent_id {
            let bumped =
                sqlx::query("UPDATE comments SET replies_count = replies_count + 1 WHERE id = $1")
                    .bind(parent_id)
                    .execute(&mut *tx)
                    .await?;
            if bumped.rows_affected() == 0 {
                return Err(AppError::NotFound(format!("Comment {} not found", parent_id)));
            }
        }

        let row = sqlx::query_as::<_, CommentRow>(&format!(
            r#"
            INSERT INTO comments (id, content, author_id, post_id, parent_id, upvotes_count,
                                  downvotes_count, replies_count, created_at, indexed, sync_version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {COMMENT_COLUMNS}
            "#
        ))
        .bind(comment.id)
        .bind(&comment.content)
        .bind(comment.author_id)
        .bind(comment.post_id)
        .bind(comment.parent_id)
        .bind(comment.upvotes_count)
        .bind(comment.downvotes_count)
        .bind(comment.replies_count)
        .bind(comment.created_at)
        .bind(comment.indexed)
        .bind(comment.sync_version)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::from_write(e, "Comment with this ID already exists"))?;

        tx.commit().await?;

        Ok(row.into_comment())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Comment>, AppError> {
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_comment()))
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Comment>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_comment()).collect())
    }

    async fn list_by_post(
        &self,
        post_id: i64,
        parent_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Comment>, AppError> {
        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments
            WHERE post_id = $1 AND parent_id IS NOT DISTINCT FROM $2
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(post_id)
        .bind(parent_id)
        .bind(limit.max(0))
        .bind(offset.max(0))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_comment()).collect())
    }

    async fn list_replies(
        &self,
        parent_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Comment>, AppError> {
        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments
            WHERE parent_id = $1
            ORDER BY created_at ASC, id ASC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(parent_id)
        .bind(limit.max(0))
        .bind(offset.max(0))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_comment()).collect())
    }

    async fn list_by_author(
        &self,
        author_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Comment>, AppError> {
        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments
            WHERE author_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(author_id)
        .bind(limit.max(0))
        .bind(offset.max(0))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_comment()).collect())
    }

    async fn find_ids_by_posts(&self, post_ids: &[i64]) -> Result<Vec<i64>, AppError> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM comments WHERE post_id = ANY($1)")
            .bind(post_ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }

    async fn delete_by_posts(&self, post_ids: &[i64]) -> Result<u64, AppError> {
        if post_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM comments WHERE post_id = ANY($1)")
            .bind(post_ids)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn list_unindexed(&self, limit: i64) -> Result<Vec<Comment>, AppError> {
        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments
            WHERE NOT indexed
            ORDER BY sync_attempted_at NULLS FIRST, id
            LIMIT $1
            "#
        ))
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_comment()).collect())
    }

    async fn mark_attempted(&self, ids: &[i64]) -> Result<(), AppError> {
        if ids.is_empty() {
            return Ok(());
        }

        sqlx::query("UPDATE comments SET sync_attempted_at = NOW() WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn mark_indexed(&self, id: i64, sync_version: i64) -> Result<bool, AppError> {
        let indexed: Option<bool> = sqlx::query_scalar(
            "UPDATE comments SET indexed = (sync_version = $2) WHERE id = $1 RETURNING indexed",
        )
        .bind(id)
        .bind(sync_version)
        .fetch_optional(&self.pool)
        .await?;

        Ok(indexed.unwrap_or(false))
    }
}
