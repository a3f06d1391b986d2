//! Article Repository Implementation
//!
//! PostgreSQL implementation of the ArticleRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Article, ArticleFilter, ArticleRepository, ArticleUpdate};
use crate::shared::error::AppError;

const ARTICLE_COLUMNS: &str = "id, title, content, slug, category, thumbnail, featured, \
     author_id, created_at, updated_at, indexed, sync_version";

/// Database row representation of the articles table.
#[derive(Debug, sqlx::FromRow)]
struct ArticleRow {
    id: i64,
    title: String,
    content: String,
    slug: String,
    category: String,
    thumbnail: String,
    featured: bool,
    author_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    indexed: bool,
    sync_version: i64,
}

impl ArticleRow {
    fn into_article(self) -> Article {
        Article {
            id: self.id,
            title: self.title,
            content: self.content,
            slug: self.slug,
            category: self.category,
            thumbnail: self.thumbnail,
            featured: self.featured,
            author_id: self.author_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            indexed: self.indexed,
            sync_version: self.sync_version,
        }
    }
}

/// PostgreSQL article repository implementation.
#[derive(Clone)]
pub struct PgArticleRepository {
    pool: PgPool,
}

impl PgArticleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn slug_conflict(slug: &str) -> String {
    format!("Article slug '{}' already exists", slug)
}

#[async_trait]
impl ArticleRepository for PgArticleRepository {
    async fn create(&self, article: &Article) -> Result<Article, AppError> {
        let row = sqlx::query_as::<_, ArticleRow>(&format!(
            r#"
            INSERT INTO articles (id, title, content, slug, category, thumbnail, featured,
                                  author_id, created_at, updated_at, indexed, sync_version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {ARTICLE_COLUMNS}
            "#
        ))
        .bind(article.id)
        .bind(&article.title)
        .bind(&article.content)
        .bind(&article.slug)
        .bind(&article.category)
        .bind(&article.thumbnail)
        .bind(article.featured)
        .bind(article.author_id)
        .bind(article.created_at)
        .bind(article.updated_at)
        .bind(article.indexed)
        .bind(article.sync_version)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_write(e, slug_conflict(&article.slug)))?;

        Ok(row.into_article())
    }

    async fn update(&self, id: i64, update: &ArticleUpdate) -> Result<Article, AppError> {
        let row = sqlx::query_as::<_, ArticleRow>(&format!(
            r#"
            UPDATE articles
            SET title = COALESCE($2, title),
                content = COALESCE($3, content),
                slug = COALESCE($4, slug),
                category = COALESCE($5, category),
                thumbnail = COALESCE($6, thumbnail),
                featured = COALESCE($7, featured),
                updated_at = NOW(),
                indexed = FALSE,
                sync_version = sync_version + 1
            WHERE id = $1
            RETURNING {ARTICLE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&update.title)
        .bind(&update.content)
        .bind(&update.slug)
        .bind(&update.category)
        .bind(&update.thumbnail)
        .bind(update.featured)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::from_write(e, slug_conflict(update.slug.as_deref().unwrap_or(""))))?;

        row.map(|r| r.into_article())
            .ok_or_else(|| AppError::NotFound(format!("Article {} not found", id)))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Article>, AppError> {
        let row = sqlx::query_as::<_, ArticleRow>(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_article()))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Article>, AppError> {
        let row = sqlx::query_as::<_, ArticleRow>(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_article()))
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Article>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, ArticleRow>(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_article()).collect())
    }

    async fn list(
        &self,
        filter: &ArticleFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Article>, AppError> {
        let rows = sqlx::query_as::<_, ArticleRow>(&format!(
            r#"
            SELECT {ARTICLE_COLUMNS}
            FROM articles
            WHERE ($1::TEXT IS NULL OR category = $1)
              AND ($2::BOOLEAN IS NULL OR featured = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(&filter.category)
        .bind(filter.featured)
        .bind(limit.max(0))
        .bind(offset.max(0))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_article()).collect())
    }

    async fn list_unindexed(&self, limit: i64) -> Result<Vec<Article>, AppError> {
        let rows = sqlx::query_as::<_, ArticleRow>(&format!(
            r#"
            SELECT {ARTICLE_COLUMNS}
            FROM articles
            WHERE NOT indexed
            ORDER BY sync_attempted_at NULLS FIRST, id
            LIMIT $1
            "#
        ))
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_article()).collect())
    }

    async fn mark_attempted(&self, ids: &[i64]) -> Result<(), AppError> {
        if ids.is_empty() {
            return Ok(());
        }

        sqlx::query("UPDATE articles SET sync_attempted_at = NOW() WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn mark_indexed(&self, id: i64, sync_version: i64) -> Result<bool, AppError> {
        let indexed: Option<bool> = sqlx::query_scalar(
            "UPDATE articles SET indexed = (sync_version = $2) WHERE id = $1 RETURNING indexed",
        )
        .bind(id)
        .bind(sync_version)
        .fetch_optional(&self.pool)
        .await?;

        Ok(indexed.unwrap_or(false))
    }

    async fn list_titles(&self) -> Result<Vec<(String, String)>, AppError> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT title, slug FROM articles")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}
