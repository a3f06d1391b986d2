//! Article entity and repository trait.
//!
//! Maps to the `articles` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// A wiki article.
///
/// Maps to the `articles` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - title: TEXT NOT NULL
/// - content: TEXT NOT NULL
/// - slug: TEXT NOT NULL UNIQUE
/// - category: TEXT NOT NULL
/// - thumbnail: TEXT NOT NULL DEFAULT ''
/// - featured: BOOLEAN NOT NULL DEFAULT FALSE
/// - author_id: BIGINT NOT NULL
/// - created_at / updated_at: TIMESTAMPTZ NOT NULL
/// - indexed: BOOLEAN NOT NULL DEFAULT FALSE
/// - sync_version: BIGINT NOT NULL DEFAULT 0 -- bumped by every mirrored-field write
/// - sync_attempted_at: TIMESTAMPTZ NULL -- last backlog attempt, not loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub slug: String,
    pub category: String,
    pub thumbnail: String,
    pub featured: bool,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Whether the search mirror holds the latest version of this article.
    pub indexed: bool,
    /// Version of the mirrored fields; `indexed` only refers to this one.
    pub sync_version: i64,
}

/// Partial update of an article. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct ArticleUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub slug: Option<String>,
    pub category: Option<String>,
    pub thumbnail: Option<String>,
    pub featured: Option<bool>,
}

impl ArticleUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.slug.is_none()
            && self.category.is_none()
            && self.thumbnail.is_none()
            && self.featured.is_none()
    }

    /// Apply the update to an in-memory article.
    pub fn apply_to(&self, article: &mut Article) {
        if let Some(title) = &self.title {
            article.title = title.clone();
        }
        if let Some(content) = &self.content {
            article.content = content.clone();
        }
        if let Some(slug) = &self.slug {
            article.slug = slug.clone();
        }
        if let Some(category) = &self.category {
            article.category = category.clone();
        }
        if let Some(thumbnail) = &self.thumbnail {
            article.thumbnail = thumbnail.clone();
        }
        if let Some(featured) = self.featured {
            article.featured = featured;
        }
    }
}

/// Filter for listing articles.
#[derive(Debug, Clone, Default)]
pub struct ArticleFilter {
    pub category: Option<String>,
    pub featured: Option<bool>,
}

impl ArticleFilter {
    pub fn matches(&self, article: &Article) -> bool {
        self.category
            .as_ref()
            .map_or(true, |c| &article.category == c)
            && self.featured.map_or(true, |f| article.featured == f)
    }
}

/// Repository trait for Article data access operations.
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Insert a new article. A duplicate slug is a conflict.
    async fn create(&self, article: &Article) -> Result<Article, AppError>;

    /// Apply a partial update, bump `updated_at` and `sync_version`, clear `indexed`.
    async fn update(&self, id: i64, update: &ArticleUpdate) -> Result<Article, AppError>;

    /// Delete an article. Returns whether a record was removed.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Article>, AppError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Article>, AppError>;

    /// Fetch every article whose id is in `ids`, in no particular order.
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Article>, AppError>;

    /// List articles newest first.
    async fn list(
        &self,
        filter: &ArticleFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Article>, AppError>;

    /// Articles the search mirror has not confirmed yet, least recently
    /// attempted first.
    async fn list_unindexed(&self, limit: i64) -> Result<Vec<Article>, AppError>;

    /// Stamp a backlog attempt so the next listing rotates past these rows.
    async fn mark_attempted(&self, ids: &[i64]) -> Result<(), AppError>;

    /// Set `indexed` when `sync_version` is still current and clear it
    /// otherwise. Returns whether the flag was set.
    async fn mark_indexed(&self, id: i64, sync_version: i64) -> Result<bool, AppError>;

    /// Every (title, slug) pair, used to build the auto-link dictionary.
    async fn list_titles(&self) -> Result<Vec<(String, String)>, AppError>;
}
