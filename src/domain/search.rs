//! Search mirror port.
//!
//! The mirror is a denormalized search index kept eventually consistent with
//! the primary store. It has no join capability, so each document carries
//! the parent context it needs (a post's group visibility, a comment's
//! group). Upserts and deletes must both be idempotent.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::entities::{Article, Comment, Group, Post};

/// The four mirrored collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Article,
    Group,
    Post,
    Comment,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 4] = [
        DocumentKind::Article,
        DocumentKind::Group,
        DocumentKind::Post,
        DocumentKind::Comment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::Group => "group",
            Self::Post => "post",
            Self::Comment => "comment",
        }
    }

    /// Index name without the configured prefix.
    pub fn index_name(&self) -> &'static str {
        match self {
            Self::Article => "articles",
            Self::Group => "groups",
            Self::Post => "posts",
            Self::Comment => "comments",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mirror failures. Never surfaced to callers of the write paths.
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    #[error("search mirror transport error: {0}")]
    Transport(String),

    #[error("search mirror returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("search mirror unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleDocument {
    pub id: String,
    pub title: String,
    pub content: String,
    pub slug: String,
    pub category: String,
    pub thumbnail: String,
    #[serde(rename = "authorId")]
    pub author_id: String,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
}

impl ArticleDocument {
    pub fn new(article: &Article) -> Self {
        Self {
            id: article.id.to_string(),
            title: article.title.clone(),
            content: article.content.clone(),
            slug: article.slug.clone(),
            category: article.category.clone(),
            thumbnail: article.thumbnail.clone(),
            author_id: article.author_id.to_string(),
            created_at: article.created_at.timestamp(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupDocument {
    pub id: String,
    #[serde(rename = "type")]
    pub doc_type: &'static str,
    pub group_id: String,
    pub group_type: &'static str,
    pub name: String,
    pub description: String,
    pub slug: String,
    #[serde(rename = "ownerId")]
    pub owner_id: String,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    #[serde(rename = "membersCount")]
    pub members_count: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl GroupDocument {
    pub fn new(group: &Group) -> Self {
        Self {
            id: group.id.to_string(),
            doc_type: "group",
            group_id: group.id.to_string(),
            group_type: group.kind.as_str(),
            name: group.name.clone(),
            description: group.description.clone(),
            slug: group.slug.clone(),
            owner_id: group.owner_id.to_string(),
            created_at: group.created_at.timestamp(),
            members_count: group.members_count,
            icon: group.icon.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostDocument {
    pub id: String,
    #[serde(rename = "type")]
    pub doc_type: &'static str,
    pub group_id: String,
    pub group_type: &'static str,
    pub title: String,
    pub content: String,
    #[serde(rename = "authorId")]
    pub author_id: String,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
}

impl PostDocument {
    /// `group` must be the post's owning group.
    pub fn new(post: &Post, group: &Group) -> Self {
        Self {
            id: post.id.to_string(),
            doc_type: "post",
            group_id: post.group_id.to_string(),
            group_type: group.kind.as_str(),
            title: post.title.clone(),
            content: post.content.clone(),
            author_id: post.author_id.to_string(),
            created_at: post.created_at.timestamp(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentDocument {
    pub id: String,
    #[serde(rename = "type")]
    pub doc_type: &'static str,
    pub group_id: String,
    pub group_type: &'static str,
    pub content: String,
    #[serde(rename = "authorId")]
    pub author_id: String,
    #[serde(rename = "postId")]
    pub post_id: String,
    #[serde(rename = "parentId")]
    pub parent_id: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
}

impl CommentDocument {
    /// `post` must own the comment and `group` must own the post.
    pub fn new(comment: &Comment, post: &Post, group: &Group) -> Self {
        Self {
            id: comment.id.to_string(),
            doc_type: "comment",
            group_id: post.group_id.to_string(),
            group_type: group.kind.as_str(),
            content: comment.content.clone(),
            author_id: comment.author_id.to_string(),
            post_id: comment.post_id.to_string(),
            parent_id: comment.parent_id.map(|id| id.to_string()),
            created_at: comment.created_at.timestamp(),
        }
    }
}

/// Capability to upsert and delete mirror documents.
///
/// Implementations are stateless from the caller's point of view and are
/// shared across requests behind an `Arc`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchMirror: Send + Sync {
    async fn index_article(&self, doc: &ArticleDocument) -> Result<(), MirrorError>;

    async fn index_group(&self, doc: &GroupDocument) -> Result<(), MirrorError>;

    async fn index_post(&self, doc: &PostDocument) -> Result<(), MirrorError>;

    async fn index_comment(&self, doc: &CommentDocument) -> Result<(), MirrorError>;

    /// Remove a document. Deleting an absent document succeeds.
    async fn delete(&self, kind: DocumentKind, id: i64) -> Result<(), MirrorError>;
}
