//! Application Services
//!
//! Business logic services that coordinate domain operations.
//!
//! ## Available Services
//!
//! - **ArticleService**: wiki articles and auto-linked rendering
//! - **CommunityService**: groups, membership, posts and comments
//! - **VoteService**: post and comment votes
//! - **DiscussionService**: group discussions, channels and messages
//! - **SearchSync**: mirror submission and the `indexed` backlog
//! - **GroupCascade**: dependent cleanup when a group is deleted
//! - **BacklogSweeper**: periodic backlog reconciliation
//!
//! Identities arrive as decimal strings and are parsed before any store
//! access; a malformed one is `InvalidIdentity`.

pub mod article_service;
pub mod backlog_sweeper;
pub mod cascade;
pub mod community_service;
pub mod discussion_service;
pub mod search_sync;
pub mod vote_service;

pub use article_service::ArticleService;
pub use backlog_sweeper::BacklogSweeper;
pub use cascade::GroupCascade;
pub use community_service::CommunityService;
pub use discussion_service::DiscussionService;
pub use search_sync::SearchSync;
pub use vote_service::VoteService;

/// Largest page any list operation returns.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Clamp caller pagination to `1..=MAX_PAGE_SIZE` and a non-negative offset.
pub fn page(limit: i64, offset: i64) -> (i64, i64) {
    (limit.clamp(1, MAX_PAGE_SIZE), offset.max(0))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{Duration, TimeZone, Utc};

    use crate::domain::{Article, Comment, Group, GroupKind, Post};

    fn at(id: i64) -> chrono::DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(id)
    }

    pub fn article(id: i64, title: &str, slug: &str) -> Article {
        Article {
            id,
            title: title.into(),
            content: format!("About {}", title),
            slug: slug.into(),
            category: "general".into(),
            thumbnail: String::new(),
            featured: false,
            author_id: 100,
            created_at: at(id),
            updated_at: at(id),
            indexed: false,
            sync_version: 0,
        }
    }

    pub fn group(id: i64, slug: &str, owner_id: i64) -> Group {
        Group {
            id,
            name: format!("Group {}", slug),
            description: String::new(),
            slug: slug.into(),
            kind: GroupKind::Public,
            owner_id,
            member_ids: vec![owner_id],
            members_count: 1,
            icon: None,
            created_at: at(id),
            indexed: false,
            sync_version: 0,
        }
    }

    pub fn post(id: i64, group_id: i64, author_id: i64) -> Post {
        Post {
            id,
            title: format!("Post {}", id),
            content: "body".into(),
            author_id,
            group_id,
            comments_count: 0,
            upvotes_count: 0,
            downvotes_count: 0,
            created_at: at(id),
            indexed: false,
            sync_version: 0,
        }
    }

    pub fn comment(id: i64, post_id: i64, parent_id: Option<i64>) -> Comment {
        Comment {
            id,
            content: format!("Comment {}", id),
            author_id: 100,
            post_id,
            parent_id,
            upvotes_count: 0,
            downvotes_count: 0,
            replies_count: 0,
            created_at: at(id),
            indexed: false,
            sync_version: 0,
        }
    }
}
