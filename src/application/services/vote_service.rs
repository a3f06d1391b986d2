//! Vote Service
//!
//! Applies vote requests through the ledger. The ledger record and the
//! target's counters change together inside the repository; this layer
//! checks that the target exists and records the transition.

use std::sync::Arc;

use tracing::instrument;

use crate::domain::{
    CommentRepository, PostRepository, VoteDirection, VoteRepository, VoteTally, VoteTarget,
};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;
use crate::shared::snowflake::{parse_id, SnowflakeGenerator};

pub struct VoteService {
    votes: Arc<dyn VoteRepository>,
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl VoteService {
    pub fn new(
        votes: Arc<dyn VoteRepository>,
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            votes,
            posts,
            comments,
            id_generator,
        }
    }

    /// Vote on a post and return its counters afterwards.
    #[instrument(skip(self), level = "debug")]
    pub async fn vote_post(
        &self,
        user_id: &str,
        post_id: &str,
        direction: VoteDirection,
    ) -> Result<VoteTally, AppError> {
        let user_id = parse_id(user_id)?;
        let post_id = parse_id(post_id)?;
        if self.posts.find_by_id(post_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Post {} not found", post_id)));
        }
        self.apply(VoteTarget::Post, user_id, post_id, direction).await
    }

    /// Vote on a comment and return its counters afterwards.
    #[instrument(skip(self), level = "debug")]
    pub async fn vote_comment(
        &self,
        user_id: &str,
        comment_id: &str,
        direction: VoteDirection,
    ) -> Result<VoteTally, AppError> {
        let user_id = parse_id(user_id)?;
        let comment_id = parse_id(comment_id)?;
        if self.comments.find_by_id(comment_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Comment {} not found", comment_id)));
        }
        self.apply(VoteTarget::Comment, user_id, comment_id, direction).await
    }

    /// The user's current vote on a post, `None` when there is no record.
    pub async fn get_user_vote(&self, user_id: &str, post_id: &str) -> Result<VoteDirection, AppError> {
        self.current(VoteTarget::Post, user_id, post_id).await
    }

    pub async fn get_user_comment_vote(
        &self,
        user_id: &str,
        comment_id: &str,
    ) -> Result<VoteDirection, AppError> {
        self.current(VoteTarget::Comment, user_id, comment_id).await
    }

    async fn apply(
        &self,
        target: VoteTarget,
        user_id: i64,
        target_id: i64,
        direction: VoteDirection,
    ) -> Result<VoteTally, AppError> {
        let outcome = self
            .votes
            .apply_vote(
                target,
                user_id,
                target_id,
                direction,
                self.id_generator.generate(),
            )
            .await?;

        let transition = outcome.transition.label();
        metrics::record_vote(target.as_str(), transition);
        tracing::debug!(
            target = %target,
            target_id,
            user_id,
            transition,
            upvotes = outcome.tally.upvotes,
            downvotes = outcome.tally.downvotes,
            "Vote applied"
        );

        Ok(outcome.tally)
    }

    async fn current(
        &self,
        target: VoteTarget,
        user_id: &str,
        target_id: &str,
    ) -> Result<VoteDirection, AppError> {
        let user_id = parse_id(user_id)?;
        let target_id = parse_id(target_id)?;
        let vote = self.votes.find_vote(target, user_id, target_id).await?;
        Ok(VoteDirection::from(vote.map(|v| v.vote_type)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::fixtures;
    use crate::infrastructure::memory::InMemoryStore;
    use test_case::test_case;

    async fn service() -> VoteService {
        let store = Arc::new(InMemoryStore::new());
        PostRepository::create(&*store, &fixtures::post(10, 1, 100))
            .await
            .unwrap();
        CommentRepository::create(&*store, &fixtures::comment(20, 10, None))
            .await
            .unwrap();
        VoteService::new(
            store.clone(),
            store.clone(),
            store,
            Arc::new(SnowflakeGenerator::new(1, 1)),
        )
    }

    #[tokio::test]
    async fn test_up_down_none_up_scenario() {
        let votes = service().await;
        let steps = [
            (VoteDirection::Up, VoteTally::new(1, 0)),
            (VoteDirection::Down, VoteTally::new(0, 1)),
            (VoteDirection::None, VoteTally::new(0, 0)),
            (VoteDirection::Up, VoteTally::new(1, 0)),
        ];

        for (direction, expected) in steps {
            let tally = votes.vote_post("5", "10", direction).await.unwrap();
            assert_eq!(tally, expected, "after {direction}");
        }

        assert_eq!(votes.get_user_vote("5", "10").await.unwrap(), VoteDirection::Up);
        assert_eq!(votes.votes.count_for_target(VoteTarget::Post, 10).await.unwrap(), 1);
    }

    #[test_case(VoteDirection::Up ; "repeat up")]
    #[test_case(VoteDirection::Down ; "repeat down")]
    #[tokio::test]
    async fn test_repeat_does_not_double_count(direction: VoteDirection) {
        let votes = service().await;
        let first = votes.vote_comment("5", "20", direction).await.unwrap();
        let second = votes.vote_comment("5", "20", direction).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.upvotes + first.downvotes, 1);
        assert_eq!(votes.get_user_comment_vote("5", "20").await.unwrap(), direction);
    }

    #[tokio::test]
    async fn test_absent_vote_reads_as_none() {
        let votes = service().await;
        assert_eq!(votes.get_user_vote("5", "10").await.unwrap(), VoteDirection::None);
    }

    #[tokio::test]
    async fn test_missing_target_and_bad_ids() {
        let votes = service().await;
        let err = votes.vote_post("5", "404", VoteDirection::Up).await.unwrap_err();
        assert!(err.is_not_found());

        let err = votes.vote_comment("five", "20", VoteDirection::Up).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidIdentity(_)));
    }

    #[tokio::test]
    async fn test_voters_are_independent() {
        let votes = service().await;
        votes.vote_post("5", "10", VoteDirection::Up).await.unwrap();
        votes.vote_post("6", "10", VoteDirection::Up).await.unwrap();
        let tally = votes.vote_post("7", "10", VoteDirection::Down).await.unwrap();

        assert_eq!(tally, VoteTally::new(2, 1));
        assert_eq!(tally.score(), 1);
    }
}
