//! Discussion, Channel and Message entities and their repository trait.
//!
//! Every group owns at most one discussion; a discussion holds text
//! channels and channels hold chat messages.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Maps to the `discussions` table (`group_id` is unique).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discussion {
    pub id: i64,
    pub group_id: i64,
}

/// Channel kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChannelKind {
    #[default]
    Text,
}

impl ChannelKind {
    /// Convert from database string representation.
    pub fn from_str(_s: &str) -> Self {
        Self::Text
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
        }
    }
}

/// Maps to the `channels` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: i64,
    pub discussion_id: i64,
    pub name: String,
    pub kind: ChannelKind,
    pub created_at: DateTime<Utc>,
}

/// Maps to the `messages` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub channel_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Repository trait for discussions, channels and messages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiscussionRepository: Send + Sync {
    /// Insert a discussion. A second discussion for the same group is a conflict.
    async fn create_discussion(&self, discussion: &Discussion) -> Result<Discussion, AppError>;

    async fn find_discussion(&self, id: i64) -> Result<Option<Discussion>, AppError>;

    async fn find_discussion_by_group(&self, group_id: i64)
        -> Result<Option<Discussion>, AppError>;

    async fn delete_discussion(&self, id: i64) -> Result<u64, AppError>;

    async fn create_channel(&self, channel: &Channel) -> Result<Channel, AppError>;

    async fn find_channel(&self, id: i64) -> Result<Option<Channel>, AppError>;

    /// Channels of a discussion, oldest first.
    async fn list_channels(&self, discussion_id: i64) -> Result<Vec<Channel>, AppError>;

    async fn delete_channels_by_discussion(&self, discussion_id: i64) -> Result<u64, AppError>;

    async fn create_message(&self, message: &Message) -> Result<Message, AppError>;

    /// Messages of a channel, oldest first.
    async fn list_messages(&self, channel_id: i64, limit: i64, offset: i64)
        -> Result<Vec<Message>, AppError>;

    /// Bulk delete every message of the given channels.
    async fn delete_messages_by_channels(&self, channel_ids: &[i64]) -> Result<u64, AppError>;
}
