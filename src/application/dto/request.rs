//! Request DTOs
//!
//! Input structures for the write operations. Length limits and slug shape
//! are checked with `validator`; blank bodies are checked by the services.

use serde::Deserialize;
use validator::Validate;

use crate::domain::{ArticleUpdate, GroupKind, GroupUpdate};
use crate::shared::validation::SLUG_RE;

/// Create article request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateArticleDto {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    pub content: String,

    #[validate(
        length(min = 1, max = 200, message = "Slug must be 1-200 characters"),
        regex(path = *SLUG_RE, message = "Slug must be lowercase letters, digits and single hyphens")
    )]
    pub slug: String,

    #[serde(default)]
    #[validate(length(max = 100, message = "Category must be at most 100 characters"))]
    pub category: String,

    #[serde(default)]
    pub thumbnail: String,

    #[serde(default)]
    pub featured: bool,
}

/// Partial article update
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateArticleDto {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    pub content: Option<String>,

    #[validate(
        length(min = 1, max = 200, message = "Slug must be 1-200 characters"),
        regex(path = *SLUG_RE, message = "Slug must be lowercase letters, digits and single hyphens")
    )]
    pub slug: Option<String>,

    #[validate(length(max = 100, message = "Category must be at most 100 characters"))]
    pub category: Option<String>,

    pub thumbnail: Option<String>,

    pub featured: Option<bool>,
}

impl From<UpdateArticleDto> for ArticleUpdate {
    fn from(dto: UpdateArticleDto) -> Self {
        Self {
            title: dto.title,
            content: dto.content,
            slug: dto.slug,
            category: dto.category,
            thumbnail: dto.thumbnail,
            featured: dto.featured,
        }
    }
}

/// Create group request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateGroupDto {
    #[validate(length(min = 2, max = 100, message = "Name must be 2-100 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: String,

    #[validate(
        length(min = 1, max = 100, message = "Slug must be 1-100 characters"),
        regex(path = *SLUG_RE, message = "Slug must be lowercase letters, digits and single hyphens")
    )]
    pub slug: String,

    #[serde(default, rename = "type")]
    pub kind: GroupKind,

    pub icon: Option<String>,
}

/// Update group request. No fields means no change.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateGroupDto {
    #[validate(length(min = 2, max = 100, message = "Name must be 2-100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    pub icon: Option<String>,
}

impl From<UpdateGroupDto> for GroupUpdate {
    fn from(dto: UpdateGroupDto) -> Self {
        Self {
            name: dto.name,
            description: dto.description,
            icon: dto.icon,
        }
    }
}

/// Create post request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePostDto {
    #[validate(length(min = 1, max = 300, message = "Title must be 1-300 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 40000, message = "Content must be 1-40000 characters"))]
    pub content: String,
}

/// Create comment request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCommentDto {
    #[validate(length(min = 1, max = 10000, message = "Content must be 1-10000 characters"))]
    pub content: String,
}

/// Create channel request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateChannelDto {
    #[validate(length(min = 1, max = 100, message = "Channel name must be 1-100 characters"))]
    pub name: String,
}

/// Send message request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SendMessageDto {
    #[validate(length(min = 1, max = 4000, message = "Message must be 1-4000 characters"))]
    pub content: String,
}
