//! Post Repository Implementation
//!
//! PostgreSQL implementation of the PostRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Post, PostRepository};
use crate::shared::error::AppError;

const POST_COLUMNS: &str = "id, title, content, author_id, group_id, comments_count, \
     upvotes_count, downvotes_count, created_at, indexed, sync_version";

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: i64,
    title: String,
    content: String,
    author_id: i64,
    group_id: i64,
    comments_count: i32,
    upvotes_count: i32,
    downvotes_count: i32,
    created_at: DateTime<Utc>,
    indexed: bool,
    sync_version: i64,
}

impl PostRow {
    fn into_post(self) -> Post {
        Post {
            id: self.id,
            title: self.title,
            content: self.content,
            author_id: self.author_id,
            group_id: self.group_id,
            comments_count: self.comments_count,
            upvotes_count: self.upvotes_count,
            downvotes_count: self.downvotes_count,
            created_at: self.created_at,
            indexed: self.indexed,
            sync_version: self.sync_version,
        }
    }
}

/// PostgreSQL post repository implementation.
#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn create(&self, post: &Post) -> Result<Post, AppError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            INSERT INTO posts (id, title, content, author_id, group_id, comments_count,
                               upvotes_count, downvotes_count, created_at, indexed, sync_version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(post.id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.author_id)
        .bind(post.group_id)
        .bind(post.comments_count)
        .bind(post.upvotes_count)
        .bind(post.downvotes_count)
        .bind(post.created_at)
        .bind(post.indexed)
        .bind(post.sync_version)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_write(e, "Post with this ID already exists"))?;

        Ok(row.into_post())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, AppError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_post()))
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Post>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_post()).collect())
    }

    async fn list_by_group(
        &self,
        group_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, AppError> {
        self.list_by_groups(&[group_id], limit, offset).await
    }

    async fn list_by_groups(
        &self,
        group_ids: &[i64],
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, AppError> {
        if group_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE group_id = ANY($1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(group_ids)
        .bind(limit.max(0))
        .bind(offset.max(0))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_post()).collect())
    }

    async fn list_by_author(
        &self,
        author_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, AppError> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
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

        Ok(rows.into_iter().map(|r| r.into_post()).collect())
    }

    async fn find_ids_by_group(&self, group_id: i64) -> Result<Vec<i64>, AppError> {
        let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM posts WHERE group_id = $1")
            .bind(group_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }

    async fn delete_by_group(&self, group_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM posts WHERE group_id = $1")
            .bind(group_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn list_unindexed(&self, limit: i64) -> Result<Vec<Post>, AppError> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE NOT indexed
            ORDER BY sync_attempted_at NULLS FIRST, id
            LIMIT $1
            "#
        ))
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_post()).collect())
    }

    async fn mark_attempted(&self, ids: &[i64]) -> Result<(), AppError> {
        if ids.is_empty() {
            return Ok(());
        }

        sqlx::query("UPDATE posts SET sync_attempted_at = NOW() WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn mark_indexed(&self, id: i64, sync_version: i64) -> Result<bool, AppError> {
        let indexed: Option<bool> = sqlx::query_scalar(
            "UPDATE posts SET indexed = (sync_version = $2) WHERE id = $1 RETURNING indexed",
        )
        .bind(id)
        .bind(sync_version)
        .fetch_optional(&self.pool)
        .await?;

        Ok(indexed.unwrap_or(false))
    }
}
