//! Discussion Repository Implementation
//!
//! PostgreSQL implementation of discussions, channels and messages.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Channel, ChannelKind, Discussion, DiscussionRepository, Message};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct DiscussionRow {
    id: i64,
    group_id: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct ChannelRow {
    id: i64,
    discussion_id: i64,
    name: String,
    kind: String,
    created_at: DateTime<Utc>,
}

impl ChannelRow {
    fn into_channel(self) -> Channel {
        Channel {
            id: self.id,
            discussion_id: self.discussion_id,
            name: self.name,
            kind: ChannelKind::from_str(&self.kind),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: i64,
    channel_id: i64,
    sender_id: i64,
    content: String,
    created_at: DateTime<Utc>,
}

impl MessageRow {
    fn into_message(self) -> Message {
        Message {
            id: self.id,
            channel_id: self.channel_id,
            sender_id: self.sender_id,
            content: self.content,
            created_at: self.created_at,
        }
    }
}

/// PostgreSQL discussion repository implementation.
#[derive(Clone)]
pub struct PgDiscussionRepository {
    pool: PgPool,
}

impl PgDiscussionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DiscussionRepository for PgDiscussionRepository {
    async fn create_discussion(&self, discussion: &Discussion) -> Result<Discussion, AppError> {
        let row = sqlx::query_as::<_, DiscussionRow>(
            "INSERT INTO discussions (id, group_id) VALUES ($1, $2) RETURNING id, group_id",
        )
        .bind(discussion.id)
        .bind(discussion.group_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::from_write(
                e,
                format!("Group {} already has a discussion", discussion.group_id),
            )
        })?;

        Ok(Discussion {
            id: row.id,
            group_id: row.group_id,
        })
    }

    async fn find_discussion(&self, id: i64) -> Result<Option<Discussion>, AppError> {
        let row = sqlx::query_as::<_, DiscussionRow>(
            "SELECT id, group_id FROM discussions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Discussion {
            id: r.id,
            group_id: r.group_id,
        }))
    }

    async fn find_discussion_by_group(
        &self,
        group_id: i64,
    ) -> Result<Option<Discussion>, AppError> {
        let row = sqlx::query_as::<_, DiscussionRow>(
            "SELECT id, group_id FROM discussions WHERE group_id = $1",
        )
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Discussion {
            id: r.id,
            group_id: r.group_id,
        }))
    }

    async fn delete_discussion(&self, id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM discussions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn create_channel(&self, channel: &Channel) -> Result<Channel, AppError> {
        let row = sqlx::query_as::<_, ChannelRow>(
            r#"
            INSERT INTO channels (id, discussion_id, name, kind, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, discussion_id, name, kind, created_at
            "#,
        )
        .bind(channel.id)
        .bind(channel.discussion_id)
        .bind(&channel.name)
        .bind(channel.kind.as_str())
        .bind(channel.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_write(e, "Channel with this ID already exists"))?;

        Ok(row.into_channel())
    }

    async fn find_channel(&self, id: i64) -> Result<Option<Channel>, AppError> {
        let row = sqlx::query_as::<_, ChannelRow>(
            "SELECT id, discussion_id, name, kind, created_at FROM channels WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_channel()))
    }

    async fn list_channels(&self, discussion_id: i64) -> Result<Vec<Channel>, AppError> {
        let rows = sqlx::query_as::<_, ChannelRow>(
            r#"
            SELECT id, discussion_id, name, kind, created_at
            FROM channels
            WHERE discussion_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(discussion_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_channel()).collect())
    }

    async fn delete_channels_by_discussion(&self, discussion_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM channels WHERE discussion_id = $1")
            .bind(discussion_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn create_message(&self, message: &Message) -> Result<Message, AppError> {
        let row = sqlx::query_as::<_, MessageRow>(
            r#"
            INSERT INTO messages (id, channel_id, sender_id, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, channel_id, sender_id, content, created_at
            "#,
        )
        .bind(message.id)
        .bind(message.channel_id)
        .bind(message.sender_id)
        .bind(&message.content)
        .bind(message.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_write(e, "Message with this ID already exists"))?;

        Ok(row.into_message())
    }

    async fn list_messages(
        &self,
        channel_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>, AppError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, channel_id, sender_id, content, created_at
            FROM messages
            WHERE channel_id = $1
            ORDER BY created_at ASC, id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(channel_id)
        .bind(limit.max(0))
        .bind(offset.max(0))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_message()).collect())
    }

    async fn delete_messages_by_channels(&self, channel_ids: &[i64]) -> Result<u64, AppError> {
        if channel_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM messages WHERE channel_id = ANY($1)")
            .bind(channel_ids)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
