//! Community Service
//!
//! Groups and their membership, posts and threaded comments.

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use crate::application::dto::{
    CascadeReport, CreateCommentDto, CreateGroupDto, CreatePostDto, SyncOutcome, UpdateGroupDto,
};
use crate::application::services::{page, GroupCascade, SearchSync};
use crate::domain::{
    Channel, ChannelKind, Comment, CommentRepository, Discussion, DiscussionRepository, Group,
    GroupFilter, GroupRepository, GroupUpdate, Post, PostRepository,
};
use crate::shared::error::AppError;
use crate::shared::ordering::reorder_by_keys;
use crate::shared::snowflake::{parse_id, parse_ids_lenient, SnowflakeGenerator};
use crate::shared::validation::{check_not_blank, validate};

/// Name of the channel every new group discussion starts with.
pub const DEFAULT_CHANNEL: &str = "general";

pub struct CommunityService {
    groups: Arc<dyn GroupRepository>,
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    discussions: Arc<dyn DiscussionRepository>,
    sync: Arc<SearchSync>,
    cascade: Arc<GroupCascade>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl CommunityService {
    pub fn new(
        groups: Arc<dyn GroupRepository>,
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        discussions: Arc<dyn DiscussionRepository>,
        sync: Arc<SearchSync>,
        cascade: Arc<GroupCascade>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            groups,
            posts,
            comments,
            discussions,
            sync,
            cascade,
            id_generator,
        }
    }

    // ---- Groups ----

    /// Create a group owned by `owner_id`, who becomes its first member,
    /// together with its discussion and default channel.
    #[instrument(skip(self, request), level = "debug")]
    pub async fn create_group(
        &self,
        owner_id: &str,
        request: CreateGroupDto,
    ) -> Result<Group, AppError> {
        let owner_id = parse_id(owner_id)?;
        validate(&request)?;

        let now = Utc::now();
        let group = Group {
            id: self.id_generator.generate(),
            name: request.name,
            description: request.description,
            slug: request.slug,
            kind: request.kind,
            owner_id,
            member_ids: vec![owner_id],
            members_count: 1,
            icon: request.icon,
            created_at: now,
            indexed: false,
            sync_version: 0,
        };
        let mut group = self.groups.create(&group).await?;

        let discussion = self
            .discussions
            .create_discussion(&Discussion {
                id: self.id_generator.generate(),
                group_id: group.id,
            })
            .await?;
        self.discussions
            .create_channel(&Channel {
                id: self.id_generator.generate(),
                discussion_id: discussion.id,
                name: DEFAULT_CHANNEL.to_string(),
                kind: ChannelKind::Text,
                created_at: now,
            })
            .await?;

        group.indexed = self.sync.sync_group(&group).await == SyncOutcome::Indexed;
        tracing::info!(group_id = group.id, slug = %group.slug, "Group created");
        Ok(group)
    }

    pub async fn get_group(&self, group_id: &str) -> Result<Group, AppError> {
        self.find_group(parse_id(group_id)?).await
    }

    pub async fn get_group_by_slug(&self, slug: &str) -> Result<Group, AppError> {
        self.groups
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Group '{}' not found", slug)))
    }

    pub async fn get_groups_by_ids(&self, ids: &[String]) -> Result<Vec<Group>, AppError> {
        let ids = parse_ids_lenient(ids);
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let groups = self.groups.find_by_ids(&ids).await?;
        Ok(reorder_by_keys(&ids, groups, |g| g.id))
    }

    pub async fn list_groups(
        &self,
        filter: &GroupFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Group>, AppError> {
        let (limit, offset) = page(limit, offset);
        self.groups.list(filter, limit, offset).await
    }

    /// Public groups the user belongs to.
    pub async fn list_groups_by_member(&self, user_id: &str) -> Result<Vec<Group>, AppError> {
        self.groups.list_by_member(parse_id(user_id)?).await
    }

    /// Update descriptive fields. An empty update returns the group as is.
    #[instrument(skip(self, request), level = "debug")]
    pub async fn update_group(
        &self,
        group_id: &str,
        request: UpdateGroupDto,
    ) -> Result<Group, AppError> {
        let group_id = parse_id(group_id)?;
        validate(&request)?;

        let update = GroupUpdate::from(request);
        if update.is_empty() {
            return self.find_group(group_id).await;
        }

        let mut group = self.groups.update(group_id, &update).await?;
        group.indexed = self.sync.sync_group(&group).await == SyncOutcome::Indexed;
        Ok(group)
    }

    /// Returns `false` when the user already was a member.
    #[instrument(skip(self), level = "debug")]
    pub async fn join_group(&self, group_id: &str, user_id: &str) -> Result<bool, AppError> {
        let group_id = parse_id(group_id)?;
        let user_id = parse_id(user_id)?;

        let joined = self.groups.add_member(group_id, user_id).await?;
        if joined {
            self.resync_group(group_id).await?;
        }
        Ok(joined)
    }

    /// Returns `false` when the user was not a member.
    #[instrument(skip(self), level = "debug")]
    pub async fn leave_group(&self, group_id: &str, user_id: &str) -> Result<bool, AppError> {
        let group_id = parse_id(group_id)?;
        let user_id = parse_id(user_id)?;

        let left = self.groups.remove_member(group_id, user_id).await?;
        if left {
            self.resync_group(group_id).await?;
        }
        Ok(left)
    }

    pub async fn is_member(&self, group_id: &str, user_id: &str) -> Result<bool, AppError> {
        let group_id = parse_id(group_id)?;
        let user_id = parse_id(user_id)?;
        self.groups.is_member(group_id, user_id).await
    }

    /// Delete a group and everything that depends on it.
    pub async fn delete_group(&self, group_id: &str) -> Result<CascadeReport, AppError> {
        self.cascade.delete_group(parse_id(group_id)?).await
    }

    // ---- Posts ----

    #[instrument(skip(self, request), level = "debug")]
    pub async fn create_post(
        &self,
        author_id: &str,
        group_id: &str,
        request: CreatePostDto,
    ) -> Result<Post, AppError> {
        let author_id = parse_id(author_id)?;
        let group_id = parse_id(group_id)?;
        validate(&request)?;
        check_not_blank("title", &request.title)?;
        check_not_blank("content", &request.content)?;

        let group = self.find_group(group_id).await?;
        let post = Post {
            id: self.id_generator.generate(),
            title: request.title,
            content: request.content,
            author_id,
            group_id: group.id,
            comments_count: 0,
            upvotes_count: 0,
            downvotes_count: 0,
            created_at: Utc::now(),
            indexed: false,
            sync_version: 0,
        };

        let mut post = self.posts.create(&post).await?;
        post.indexed = self.sync.sync_post_in(&post, &group).await == SyncOutcome::Indexed;
        Ok(post)
    }

    pub async fn get_post(&self, post_id: &str) -> Result<Post, AppError> {
        self.find_post(parse_id(post_id)?).await
    }

    pub async fn get_posts_by_ids(&self, ids: &[String]) -> Result<Vec<Post>, AppError> {
        let ids = parse_ids_lenient(ids);
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let posts = self.posts.find_by_ids(&ids).await?;
        Ok(reorder_by_keys(&ids, posts, |p| p.id))
    }

    pub async fn list_posts(
        &self,
        group_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, AppError> {
        let group_id = parse_id(group_id)?;
        let (limit, offset) = page(limit, offset);
        self.posts.list_by_group(group_id, limit, offset).await
    }

    /// Posts of public groups, newest first.
    pub async fn list_public_posts(&self, limit: i64, offset: i64) -> Result<Vec<Post>, AppError> {
        let (limit, offset) = page(limit, offset);
        let group_ids = self.groups.list_public_ids().await?;
        if group_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.posts.list_by_groups(&group_ids, limit, offset).await
    }

    pub async fn list_posts_by_author(
        &self,
        author_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, AppError> {
        let author_id = parse_id(author_id)?;
        let (limit, offset) = page(limit, offset);
        self.posts.list_by_author(author_id, limit, offset).await
    }

    // ---- Comments ----

    /// Comment on a post, or reply to `parent_id` on the same post.
    #[instrument(skip(self, request), level = "debug")]
    pub async fn create_comment(
        &self,
        author_id: &str,
        post_id: &str,
        parent_id: Option<&str>,
        request: CreateCommentDto,
    ) -> Result<Comment, AppError> {
        let author_id = parse_id(author_id)?;
        let post_id = parse_id(post_id)?;
        let parent_id = parent_id.map(parse_id).transpose()?;
        validate(&request)?;
        check_not_blank("content", &request.content)?;

        let post = self.find_post(post_id).await?;
        if let Some(parent_id) = parent_id {
            let parent = self.find_comment(parent_id).await?;
            if parent.post_id != post.id {
                return Err(AppError::Validation(format!(
                    "Comment {} belongs to another post",
                    parent_id
                )));
            }
        }

        let comment = Comment {
            id: self.id_generator.generate(),
            content: request.content,
            author_id,
            post_id: post.id,
            parent_id,
            upvotes_count: 0,
            downvotes_count: 0,
            replies_count: 0,
            created_at: Utc::now(),
            indexed: false,
            sync_version: 0,
        };

        let mut comment = self.comments.create(&comment).await?;
        comment.indexed = self.sync.sync_comment(&comment).await == SyncOutcome::Indexed;
        Ok(comment)
    }

    pub async fn get_comment(&self, comment_id: &str) -> Result<Comment, AppError> {
        self.find_comment(parse_id(comment_id)?).await
    }

    pub async fn get_comments_by_ids(&self, ids: &[String]) -> Result<Vec<Comment>, AppError> {
        let ids = parse_ids_lenient(ids);
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let comments = self.comments.find_by_ids(&ids).await?;
        Ok(reorder_by_keys(&ids, comments, |c| c.id))
    }

    /// One level of a post's thread, newest first. `None` lists top-level comments.
    pub async fn list_comments(
        &self,
        post_id: &str,
        parent_id: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Comment>, AppError> {
        let post_id = parse_id(post_id)?;
        let parent_id = parent_id.map(parse_id).transpose()?;
        let (limit, offset) = page(limit, offset);
        self.comments
            .list_by_post(post_id, parent_id, limit, offset)
            .await
    }

    /// Direct replies, oldest first.
    pub async fn list_replies(
        &self,
        parent_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Comment>, AppError> {
        let parent_id = parse_id(parent_id)?;
        let (limit, offset) = page(limit, offset);
        self.comments.list_replies(parent_id, limit, offset).await
    }

    pub async fn list_comments_by_author(
        &self,
        author_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Comment>, AppError> {
        let author_id = parse_id(author_id)?;
        let (limit, offset) = page(limit, offset);
        self.comments.list_by_author(author_id, limit, offset).await
    }

    // ---- Helpers ----

    async fn find_group(&self, group_id: i64) -> Result<Group, AppError> {
        self.groups
            .find_by_id(group_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Group {} not found", group_id)))
    }

    async fn find_post(&self, post_id: i64) -> Result<Post, AppError> {
        self.posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))
    }

    async fn find_comment(&self, comment_id: i64) -> Result<Comment, AppError> {
        self.comments
            .find_by_id(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment {} not found", comment_id)))
    }

    /// Push the stored version after a membership change.
    async fn resync_group(&self, group_id: i64) -> Result<(), AppError> {
        let group = self.find_group(group_id).await?;
        self.sync.sync_group(&group).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::search::DocumentKind;
    use crate::domain::GroupKind;
    use crate::infrastructure::memory::InMemoryStore;
    use crate::infrastructure::search::InMemorySearchMirror;
    use crate::infrastructure::Repositories;

    struct Harness {
        service: CommunityService,
        repos: Repositories,
        mirror: Arc<InMemorySearchMirror>,
    }

    fn harness() -> Harness {
        let repos = Repositories::from_memory(Arc::new(InMemoryStore::new()));
        let mirror = Arc::new(InMemorySearchMirror::new());
        let sync = Arc::new(SearchSync::new(
            repos.articles.clone(),
            repos.groups.clone(),
            repos.posts.clone(),
            repos.comments.clone(),
            mirror.clone(),
        ));
        let cascade = Arc::new(GroupCascade::new(
            repos.groups.clone(),
            repos.posts.clone(),
            repos.comments.clone(),
            repos.votes.clone(),
            repos.discussions.clone(),
            sync.clone(),
        ));
        let service = CommunityService::new(
            repos.groups.clone(),
            repos.posts.clone(),
            repos.comments.clone(),
            repos.discussions.clone(),
            sync,
            cascade,
            Arc::new(SnowflakeGenerator::new(1, 1)),
        );
        Harness {
            service,
            repos,
            mirror,
        }
    }

    fn group_dto(slug: &str, kind: GroupKind) -> CreateGroupDto {
        CreateGroupDto {
            name: format!("Group {}", slug),
            description: String::new(),
            slug: slug.into(),
            kind,
            icon: None,
        }
    }

    fn post_dto() -> CreatePostDto {
        CreatePostDto {
            title: "Hello".into(),
            content: "First post".into(),
        }
    }

    fn comment_dto(content: &str) -> CreateCommentDto {
        CreateCommentDto {
            content: content.into(),
        }
    }

    #[tokio::test]
    async fn test_create_group_sets_up_discussion() {
        let h = harness();
        let group = h
            .service
            .create_group("1", group_dto("crabs", GroupKind::Public))
            .await
            .unwrap();

        assert_eq!(group.member_ids, vec![1]);
        assert_eq!(group.members_count, 1);
        assert!(group.indexed);

        let discussion = h
            .repos
            .discussions
            .find_discussion_by_group(group.id)
            .await
            .unwrap()
            .unwrap();
        let channels = h.repos.discussions.list_channels(discussion.id).await.unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].name, DEFAULT_CHANNEL);
    }

    #[tokio::test]
    async fn test_membership_count_tracks_set() {
        let h = harness();
        let group = h
            .service
            .create_group("1", group_dto("crabs", GroupKind::Public))
            .await
            .unwrap();
        let id = group.id.to_string();

        assert!(h.service.join_group(&id, "2").await.unwrap());
        assert!(!h.service.join_group(&id, "2").await.unwrap());
        assert!(h.service.join_group(&id, "3").await.unwrap());
        assert!(h.service.leave_group(&id, "2").await.unwrap());
        assert!(!h.service.leave_group(&id, "2").await.unwrap());

        let group = h.service.get_group(&id).await.unwrap();
        assert_eq!(group.member_ids, vec![1, 3]);
        assert_eq!(group.members_count as usize, group.member_ids.len());
        assert!(h.service.is_member(&id, "3").await.unwrap());
        assert!(!h.service.is_member(&id, "2").await.unwrap());
    }

    #[tokio::test]
    async fn test_join_missing_group_is_not_found() {
        let h = harness();
        let err = h.service.join_group("404", "2").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_empty_group_update_is_noop() {
        let h = harness();
        let group = h
            .service
            .create_group("1", group_dto("crabs", GroupKind::Public))
            .await
            .unwrap();

        let same = h
            .service
            .update_group(&group.id.to_string(), UpdateGroupDto::default())
            .await
            .unwrap();
        assert_eq!(same, group);
    }

    #[tokio::test]
    async fn test_post_requires_group() {
        let h = harness();
        let err = h.service.create_post("1", "404", post_dto()).await.unwrap_err();
        assert!(err.is_not_found());

        let err = h.service.create_post("1", "x1", post_dto()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidIdentity(_)));
    }

    #[tokio::test]
    async fn test_post_projection_carries_visibility() {
        let h = harness();
        let group = h
            .service
            .create_group("1", group_dto("secret", GroupKind::Private))
            .await
            .unwrap();
        let post = h
            .service
            .create_post("1", &group.id.to_string(), post_dto())
            .await
            .unwrap();

        let doc = h.mirror.get(DocumentKind::Post, post.id).unwrap();
        assert_eq!(doc["group_type"], "PRIVATE");
        assert!(h.service.list_public_posts(10, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_comment_threading_counters() {
        let h = harness();
        let group = h
            .service
            .create_group("1", group_dto("crabs", GroupKind::Public))
            .await
            .unwrap();
        let post = h
            .service
            .create_post("1", &group.id.to_string(), post_dto())
            .await
            .unwrap();
        let post_id = post.id.to_string();

        let top = h
            .service
            .create_comment("2", &post_id, None, comment_dto("top"))
            .await
            .unwrap();
        let top_id = top.id.to_string();
        h.service
            .create_comment("3", &post_id, Some(&top_id), comment_dto("reply one"))
            .await
            .unwrap();
        h.service
            .create_comment("4", &post_id, Some(&top_id), comment_dto("reply two"))
            .await
            .unwrap();

        assert_eq!(h.service.get_post(&post_id).await.unwrap().comments_count, 3);
        assert_eq!(h.service.get_comment(&top_id).await.unwrap().replies_count, 2);

        let replies = h.service.list_replies(&top_id, 10, 0).await.unwrap();
        let contents: Vec<_> = replies.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["reply one", "reply two"]);

        let top_level = h.service.list_comments(&post_id, None, 10, 0).await.unwrap();
        assert_eq!(top_level.len(), 1);
    }

    #[tokio::test]
    async fn test_reply_to_other_post_is_rejected() {
        let h = harness();
        let group = h
            .service
            .create_group("1", group_dto("crabs", GroupKind::Public))
            .await
            .unwrap();
        let gid = group.id.to_string();
        let first = h.service.create_post("1", &gid, post_dto()).await.unwrap();
        let second = h.service.create_post("1", &gid, post_dto()).await.unwrap();
        let comment = h
            .service
            .create_comment("2", &first.id.to_string(), None, comment_dto("hi"))
            .await
            .unwrap();

        let err = h
            .service
            .create_comment(
                "2",
                &second.id.to_string(),
                Some(&comment.id.to_string()),
                comment_dto("wrong thread"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = h
            .service
            .create_comment("2", &second.id.to_string(), Some("999"), comment_dto("x"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_group_runs_cascade() {
        let h = harness();
        let group = h
            .service
            .create_group("1", group_dto("crabs", GroupKind::Public))
            .await
            .unwrap();
        let gid = group.id.to_string();
        let post = h.service.create_post("1", &gid, post_dto()).await.unwrap();

        let report = h.service.delete_group(&gid).await.unwrap();
        assert_eq!(report.groups, 1);
        assert_eq!(report.posts, 1);
        assert_eq!(report.channels, 1);
        assert!(h.service.get_post(&post.id.to_string()).await.unwrap_err().is_not_found());
        assert!(!h.mirror.contains(DocumentKind::Group, group.id));
    }
}
