//! Discussion Service
//!
//! Chat space attached to a group: one discussion, its text channels and
//! their messages. None of these are mirrored for search.

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use crate::application::dto::{CreateChannelDto, SendMessageDto};
use crate::application::services::page;
use crate::domain::{Channel, ChannelKind, Discussion, DiscussionRepository, Message};
use crate::shared::error::AppError;
use crate::shared::snowflake::{parse_id, SnowflakeGenerator};
use crate::shared::validation::{check_not_blank, validate};

pub struct DiscussionService {
    discussions: Arc<dyn DiscussionRepository>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl DiscussionService {
    pub fn new(
        discussions: Arc<dyn DiscussionRepository>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            discussions,
            id_generator,
        }
    }

    pub async fn get_discussion_by_group(
        &self,
        group_id: &str,
    ) -> Result<Option<Discussion>, AppError> {
        self.discussions
            .find_discussion_by_group(parse_id(group_id)?)
            .await
    }

    pub async fn get_discussion(&self, discussion_id: &str) -> Result<Option<Discussion>, AppError> {
        self.discussions
            .find_discussion(parse_id(discussion_id)?)
            .await
    }

    #[instrument(skip(self, request), level = "debug")]
    pub async fn create_channel(
        &self,
        discussion_id: &str,
        request: CreateChannelDto,
    ) -> Result<Channel, AppError> {
        let discussion_id = parse_id(discussion_id)?;
        validate(&request)?;
        check_not_blank("name", &request.name)?;

        let discussion = self
            .discussions
            .find_discussion(discussion_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Discussion {} not found", discussion_id)))?;

        self.discussions
            .create_channel(&Channel {
                id: self.id_generator.generate(),
                discussion_id: discussion.id,
                name: request.name.trim().to_string(),
                kind: ChannelKind::Text,
                created_at: Utc::now(),
            })
            .await
    }

    pub async fn get_channel(&self, channel_id: &str) -> Result<Channel, AppError> {
        self.find_channel(parse_id(channel_id)?).await
    }

    /// Channels of a discussion, oldest first.
    pub async fn list_channels(&self, discussion_id: &str) -> Result<Vec<Channel>, AppError> {
        self.discussions
            .list_channels(parse_id(discussion_id)?)
            .await
    }

    #[instrument(skip(self, request), level = "debug")]
    pub async fn send_message(
        &self,
        channel_id: &str,
        sender_id: &str,
        request: SendMessageDto,
    ) -> Result<Message, AppError> {
        let channel_id = parse_id(channel_id)?;
        let sender_id = parse_id(sender_id)?;
        validate(&request)?;
        check_not_blank("content", &request.content)?;

        let channel = self.find_channel(channel_id).await?;
        self.discussions
            .create_message(&Message {
                id: self.id_generator.generate(),
                channel_id: channel.id,
                sender_id,
                content: request.content,
                created_at: Utc::now(),
            })
            .await
    }

    /// Messages of a channel, oldest first.
    pub async fn list_messages(
        &self,
        channel_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>, AppError> {
        let channel_id = parse_id(channel_id)?;
        let (limit, offset) = page(limit, offset);
        self.discussions
            .list_messages(channel_id, limit, offset)
            .await
    }

    async fn find_channel(&self, channel_id: i64) -> Result<Channel, AppError> {
        self.discussions
            .find_channel(channel_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Channel {} not found", channel_id)))
    }
}
