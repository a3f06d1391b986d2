//! Article Service
//!
//! Article CRUD plus rendering with auto-linked titles.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use crate::application::dto::{CreateArticleDto, SyncOutcome, UpdateArticleDto};
use crate::application::services::{page, SearchSync};
use crate::domain::search::DocumentKind;
use crate::domain::services::TitleIndex;
use crate::domain::{Article, ArticleFilter, ArticleRepository, ArticleUpdate};
use crate::shared::error::AppError;
use crate::shared::ordering::reorder_by_keys;
use crate::shared::snowflake::{parse_id, parse_ids_lenient, SnowflakeGenerator};
use crate::shared::validation::validate;

pub struct ArticleService {
    articles: Arc<dyn ArticleRepository>,
    sync: Arc<SearchSync>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl ArticleService {
    pub fn new(
        articles: Arc<dyn ArticleRepository>,
        sync: Arc<SearchSync>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            articles,
            sync,
            id_generator,
        }
    }

    #[instrument(skip(self, request), level = "debug")]
    pub async fn create_article(
        &self,
        author_id: &str,
        request: CreateArticleDto,
    ) -> Result<Article, AppError> {
        let author_id = parse_id(author_id)?;
        validate(&request)?;

        let now = Utc::now();
        let article = Article {
            id: self.id_generator.generate(),
            title: request.title,
            content: request.content,
            slug: request.slug,
            category: request.category,
            thumbnail: request.thumbnail,
            featured: request.featured,
            author_id,
            created_at: now,
            updated_at: now,
            indexed: false,
            sync_version: 0,
        };

        let mut article = self.articles.create(&article).await?;
        article.indexed = self.sync.sync_article(&article).await == SyncOutcome::Indexed;

        tracing::info!(article_id = article.id, slug = %article.slug, "Article created");
        Ok(article)
    }

    #[instrument(skip(self, request), level = "debug")]
    pub async fn update_article(
        &self,
        article_id: &str,
        request: UpdateArticleDto,
    ) -> Result<Article, AppError> {
        let article_id = parse_id(article_id)?;
        validate(&request)?;

        let update = ArticleUpdate::from(request);
        if update.is_empty() {
            return self.find(article_id).await;
        }

        let mut article = self.articles.update(article_id, &update).await?;
        article.indexed = self.sync.sync_article(&article).await == SyncOutcome::Indexed;
        Ok(article)
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn delete_article(&self, article_id: &str) -> Result<(), AppError> {
        let article_id = parse_id(article_id)?;
        if !self.articles.delete(article_id).await? {
            return Err(not_found(article_id));
        }

        self.sync.remove(DocumentKind::Article, article_id).await;
        tracing::info!(article_id, "Article deleted");
        Ok(())
    }

    pub async fn get_article(&self, article_id: &str) -> Result<Article, AppError> {
        self.find(parse_id(article_id)?).await
    }

    pub async fn get_article_by_slug(&self, slug: &str) -> Result<Article, AppError> {
        self.articles
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Article '{}' not found", slug)))
    }

    /// Articles in the order of `ids`; unknown or malformed ids are dropped.
    pub async fn get_articles_by_ids(&self, ids: &[String]) -> Result<Vec<Article>, AppError> {
        let ids = parse_ids_lenient(ids);
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let articles = self.articles.find_by_ids(&ids).await?;
        Ok(reorder_by_keys(&ids, articles, |a| a.id))
    }

    pub async fn list_articles(
        &self,
        filter: &ArticleFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Article>, AppError> {
        let (limit, offset) = page(limit, offset);
        self.articles.list(filter, limit, offset).await
    }

    /// Lower-cased title to slug; the smallest slug wins on duplicates.
    pub async fn all_titles(&self) -> Result<BTreeMap<String, String>, AppError> {
        let mut titles = BTreeMap::new();
        for (title, slug) in self.articles.list_titles().await? {
            let key = title.trim().to_lowercase();
            if key.is_empty() {
                continue;
            }
            titles
                .entry(key)
                .and_modify(|current: &mut String| {
                    if slug < *current {
                        *current = slug.clone();
                    }
                })
                .or_insert(slug);
        }
        Ok(titles)
    }

    /// The article with known titles in its body auto-linked.
    #[instrument(skip(self), level = "debug")]
    pub async fn render_article(&self, slug: &str) -> Result<Article, AppError> {
        let mut article = self.get_article_by_slug(slug).await?;
        let index = TitleIndex::new(self.all_titles().await?);
        article.content = index.link(&article.content, &article.slug);
        Ok(article)
    }

    async fn find(&self, article_id: i64) -> Result<Article, AppError> {
        self.articles
            .find_by_id(article_id)
            .await?
            .ok_or_else(|| not_found(article_id))
    }
}

fn not_found(article_id: i64) -> AppError {
    AppError::NotFound(format!("Article {} not found", article_id))
}
