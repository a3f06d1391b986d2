//! Repository bundle for the selected primary-store backend.

use std::sync::Arc;

use sqlx::PgPool;

use crate::domain::{
    ArticleRepository, CommentRepository, DiscussionRepository, GroupRepository, PostRepository,
    VoteRepository,
};
use crate::infrastructure::database;
use crate::infrastructure::memory::InMemoryStore;
use crate::infrastructure::repositories::{
    PgArticleRepository, PgCommentRepository, PgDiscussionRepository, PgGroupRepository,
    PgPostRepository, PgVoteRepository,
};
use crate::shared::error::AppError;

/// One handle per collection, all backed by the same store.
#[derive(Clone)]
pub struct Repositories {
    pub articles: Arc<dyn ArticleRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub votes: Arc<dyn VoteRepository>,
    pub discussions: Arc<dyn DiscussionRepository>,
    pool: Option<PgPool>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            articles: Arc::new(PgArticleRepository::new(pool.clone())),
            groups: Arc::new(PgGroupRepository::new(pool.clone())),
            posts: Arc::new(PgPostRepository::new(pool.clone())),
            comments: Arc::new(PgCommentRepository::new(pool.clone())),
            votes: Arc::new(PgVoteRepository::new(pool.clone())),
            discussions: Arc::new(PgDiscussionRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    pub fn in_memory() -> Self {
        Self::from_memory(Arc::new(InMemoryStore::new()))
    }

    pub fn from_memory(store: Arc<InMemoryStore>) -> Self {
        Self {
            articles: store.clone(),
            groups: store.clone(),
            posts: store.clone(),
            comments: store.clone(),
            votes: store.clone(),
            discussions: store,
            pool: None,
        }
    }

    pub fn backend(&self) -> &'static str {
        if self.pool.is_some() {
            "postgres"
        } else {
            "memory"
        }
    }

    /// Check that the store answers queries.
    pub async fn ping(&self) -> Result<(), AppError> {
        match &self.pool {
            Some(pool) => database::ping(pool).await,
            None => Ok(()),
        }
    }
}
