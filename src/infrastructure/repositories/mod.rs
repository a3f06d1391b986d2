//! Repository Implementations
//!
//! PostgreSQL implementations of the domain repository traits, one per
//! collection. All of them share one `PgPool`.
//!
//! ## Available Repositories
//!
//! - **PgArticleRepository** - Wiki articles, unique by slug
//! - **PgGroupRepository** - Groups with `BIGINT[]` member sets
//! - **PgPostRepository** - Posts with comment and vote counters
//! - **PgCommentRepository** - Threaded comments; creation bumps counters transactionally
//! - **PgVoteRepository** - Post and comment vote ledgers
//! - **PgDiscussionRepository** - Discussions, channels and messages
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use sqlx::PgPool;
//! use crate::infrastructure::repositories::{PgGroupRepository, PgPostRepository};
//!
//! async fn setup_repositories(pool: PgPool) {
//!     let groups = PgGroupRepository::new(pool.clone());
//!     let posts = PgPostRepository::new(pool.clone());
//! }
//! ```

pub mod article_repository;
pub mod comment_repository;
pub mod discussion_repository;
pub mod group_repository;
pub mod post_repository;
pub mod vote_repository;

pub use article_repository::PgArticleRepository;
pub use comment_repository::PgCommentRepository;
pub use discussion_repository::PgDiscussionRepository;
pub use group_repository::PgGroupRepository;
pub use post_repository::PgPostRepository;
pub use vote_repository::PgVoteRepository;
