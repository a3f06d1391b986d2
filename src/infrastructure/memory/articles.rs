use async_trait::async_trait;
use chrono::Utc;

use super::{paginate, pick, InMemoryStore};
use crate::domain::entities::{Article, ArticleFilter, ArticleRepository, ArticleUpdate};
use crate::domain::search::DocumentKind;
use crate::shared::error::AppError;

#[async_trait]
impl ArticleRepository for InMemoryStore {
    async fn create(&self, article: &Article) -> Result<Article, AppError> {
        let mut db = self.inner.write();
        if db.articles.values().any(|a| a.slug == article.slug) {
            return Err(AppError::Conflict(format!(
                "Article slug '{}' already exists",
                article.slug
            )));
        }
        db.articles.insert(article.id, article.clone());
        Ok(article.clone())
    }

    async fn update(&self, id: i64, update: &ArticleUpdate) -> Result<Article, AppError> {
        let mut db = self.inner.write();
        if let Some(slug) = &update.slug {
            if db.articles.values().any(|a| a.id != id && &a.slug == slug) {
                return Err(AppError::Conflict(format!(
                    "Article slug '{}' already exists",
                    slug
                )));
            }
        }

        let article = db
            .articles
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Article {} not found", id)))?;
        update.apply_to(article);
        article.updated_at = Utc::now();
        article.indexed = false;
        article.sync_version += 1;
        Ok(article.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.inner.write().articles.remove(&id).is_some())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Article>, AppError> {
        Ok(self.inner.read().articles.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Article>, AppError> {
        Ok(self
            .inner
            .read()
            .articles
            .values()
            .find(|a| a.slug == slug)
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Article>, AppError> {
        Ok(pick(&self.inner.read().articles, ids))
    }

    async fn list(
        &self,
        filter: &ArticleFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Article>, AppError> {
        let db = self.inner.read();
        let mut rows: Vec<Article> = db
            .articles
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(paginate(rows, limit, offset))
    }

    async fn list_unindexed(&self, limit: i64) -> Result<Vec<Article>, AppError> {
        let db = self.inner.read();
        Ok(db.attempts.backlog(
            DocumentKind::Article,
            db.articles.iter().filter(|(_, a)| !a.indexed),
            limit,
        ))
    }

    async fn mark_attempted(&self, ids: &[i64]) -> Result<(), AppError> {
        self.inner.write().attempts.stamp(DocumentKind::Article, ids);
        Ok(())
    }

    async fn mark_indexed(&self, id: i64, sync_version: i64) -> Result<bool, AppError> {
        let mut db = self.inner.write();
        Ok(match db.articles.get_mut(&id) {
            Some(a) => {
                a.indexed = a.sync_version == sync_version;
                a.indexed
            }
            None => false,
        })
    }

    async fn list_titles(&self) -> Result<Vec<(String, String)>, AppError> {
        Ok(self
            .inner
            .read()
            .articles
            .values()
            .map(|a| (a.title.clone(), a.slug.clone()))
            .collect())
    }
}
