//! # Domain Entities
//!
//! Core domain entities representing the documents of the community store.
//!
//! ## Core Entities
//!
//! - **Article**: wiki article, unique by slug
//! - **Group**: community with a member set and a denormalized member count
//! - **Post**: post inside a group with comment and vote counters
//! - **Comment**: threaded comment on a post with reply and vote counters
//!
//! ## Supporting Entities
//!
//! - **Vote**: ledger record, one per (voter, target) for posts and comments
//! - **Discussion / Channel / Message**: chat space attached to a group
//!
//! ## Repository Traits
//!
//! Each entity has an associated repository trait defining data access operations.
//! These traits are implemented in the infrastructure layer, following the
//! dependency inversion principle.

mod article;
mod comment;
mod discussion;
mod group;
mod post;
mod vote;

pub use article::{Article, ArticleFilter, ArticleRepository, ArticleUpdate};
pub use comment::{Comment, CommentRepository};
pub use discussion::{Channel, ChannelKind, Discussion, DiscussionRepository, Message};
pub use group::{Group, GroupFilter, GroupKind, GroupRepository, GroupUpdate};
pub use post::{Post, PostRepository};
pub use vote::{Vote, VoteOutcome, VoteRepository};

#[cfg(test)]
pub use comment::MockCommentRepository;
#[cfg(test)]
pub use discussion::MockDiscussionRepository;
#[cfg(test)]
pub use post::MockPostRepository;
