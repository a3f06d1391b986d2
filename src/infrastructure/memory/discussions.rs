use async_trait::async_trait;

use super::{paginate, InMemoryStore};
use crate::domain::entities::{Channel, Discussion, DiscussionRepository, Message};
use crate::shared::error::AppError;

#[async_trait]
impl DiscussionRepository for InMemoryStore {
    async fn create_discussion(&self, discussion: &Discussion) -> Result<Discussion, AppError> {
        let mut db = self.inner.write();
        if db
            .discussions
            .values()
            .any(|d| d.group_id == discussion.group_id)
        {
            return Err(AppError::Conflict(format!(
                "Group {} already has a discussion",
                discussion.group_id
            )));
        }
        db.discussions.insert(discussion.id, discussion.clone());
        Ok(discussion.clone())
    }

    async fn find_discussion(&self, id: i64) -> Result<Option<Discussion>, AppError> {
        Ok(self.inner.read().discussions.get(&id).cloned())
    }

    async fn find_discussion_by_group(
        &self,
        group_id: i64,
    ) -> Result<Option<Discussion>, AppError> {
        Ok(self
            .inner
            .read()
            .discussions
            .values()
            .find(|d| d.group_id == group_id)
            .cloned())
    }

    async fn delete_discussion(&self, id: i64) -> Result<u64, AppError> {
        Ok(self.inner.write().discussions.remove(&id).map_or(0, |_| 1))
    }

    async fn create_channel(&self, channel: &Channel) -> Result<Channel, AppError> {
        self.inner
            .write()
            .channels
            .insert(channel.id, channel.clone());
        Ok(channel.clone())
    }

    async fn find_channel(&self, id: i64) -> Result<Option<Channel>, AppError> {
        Ok(self.inner.read().channels.get(&id).cloned())
    }

    async fn list_channels(&self, discussion_id: i64) -> Result<Vec<Channel>, AppError> {
        let db = self.inner.read();
        let mut rows: Vec<Channel> = db
            .channels
            .values()
            .filter(|c| c.discussion_id == discussion_id)
            .cloned()
            .collect();
        rows.sort_by_key(|c| (c.created_at, c.id));
        Ok(rows)
    }

    async fn delete_channels_by_discussion(&self, discussion_id: i64) -> Result<u64, AppError> {
        let mut db = self.inner.write();
        let before = db.channels.len();
        db.channels.retain(|_, c| c.discussion_id != discussion_id);
        Ok((before - db.channels.len()) as u64)
    }

    async fn create_message(&self, message: &Message) -> Result<Message, AppError> {
        self.inner
            .write()
            .messages
            .insert(message.id, message.clone());
        Ok(message.clone())
    }

    async fn list_messages(
        &self,
        channel_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>, AppError> {
        let db = self.inner.read();
        let mut rows: Vec<Message> = db
            .messages
            .values()
            .filter(|m| m.channel_id == channel_id)
            .cloned()
            .collect();
        rows.sort_by_key(|m| (m.created_at, m.id));
        Ok(paginate(rows, limit, offset))
    }

    async fn delete_messages_by_channels(&self, channel_ids: &[i64]) -> Result<u64, AppError> {
        let mut db = self.inner.write();
        let before = db.messages.len();
        db.messages.retain(|_, m| !channel_ids.contains(&m.channel_id));
        Ok((before - db.messages.len()) as u64)
    }
}
