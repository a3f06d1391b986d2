use async_trait::async_trait;
use chrono::Utc;

use super::InMemoryStore;
use crate::domain::entities::{Vote, VoteOutcome, VoteRepository};
use crate::domain::services::vote_ledger::{LedgerAction, VoteTransition};
use crate::domain::value_objects::{VoteDirection, VoteTally, VoteTarget};
use crate::shared::error::AppError;

#[async_trait]
impl VoteRepository for InMemoryStore {
    async fn find_vote(
        &self,
        target: VoteTarget,
        user_id: i64,
        target_id: i64,
    ) -> Result<Option<Vote>, AppError> {
        let db = self.inner.read();
        let ledger = match target {
            VoteTarget::Post => &db.post_votes,
            VoteTarget::Comment => &db.comment_votes,
        };
        Ok(ledger.get(&(user_id, target_id)).cloned())
    }

    async fn apply_vote(
        &self,
        target: VoteTarget,
        user_id: i64,
        target_id: i64,
        requested: VoteDirection,
        new_vote_id: i64,
    ) -> Result<VoteOutcome, AppError> {
        let mut guard = self.inner.write();
        let db = &mut *guard;

        let (ledger, counters) = match target {
            VoteTarget::Post => {
                let post = db.posts.get_mut(&target_id).ok_or_else(|| {
                    AppError::NotFound(format!("Post {} not found", target_id))
                })?;
                (
                    &mut db.post_votes,
                    (&mut post.upvotes_count, &mut post.downvotes_count),
                )
            }
            VoteTarget::Comment => {
                let comment = db.comments.get_mut(&target_id).ok_or_else(|| {
                    AppError::NotFound(format!("Comment {} not found", target_id))
                })?;
                (
                    &mut db.comment_votes,
                    (&mut comment.upvotes_count, &mut comment.downvotes_count),
                )
            }
        };

        let key = (user_id, target_id);
        let current = ledger.get(&key).map(|v| v.vote_type);
        let transition = VoteTransition::plan(current, requested);

        match transition.action {
            LedgerAction::Keep => {}
            LedgerAction::Insert(vote_type) => {
                ledger.insert(
                    key,
                    Vote {
                        id: new_vote_id,
                        user_id,
                        target,
                        target_id,
                        vote_type,
                        created_at: Utc::now(),
                    },
                );
            }
            LedgerAction::Flip { to, .. } => {
                if let Some(vote) = ledger.get_mut(&key) {
                    vote.vote_type = to;
                }
            }
            LedgerAction::Remove(_) => {
                ledger.remove(&key);
            }
        }

        let (upvotes, downvotes) = counters;
        *upvotes += transition.delta.upvotes;
        *downvotes += transition.delta.downvotes;

        Ok(VoteOutcome {
            transition,
            tally: VoteTally::new(*upvotes, *downvotes),
        })
    }

    async fn delete_by_targets(
        &self,
        target: VoteTarget,
        target_ids: &[i64],
    ) -> Result<u64, AppError> {
        let mut db = self.inner.write();
        let ledger = match target {
            VoteTarget::Post => &mut db.post_votes,
            VoteTarget::Comment => &mut db.comment_votes,
        };
        let before = ledger.len();
        ledger.retain(|(_, target_id), _| !target_ids.contains(target_id));
        Ok((before - ledger.len()) as u64)
    }

    async fn count_for_target(&self, target: VoteTarget, target_id: i64) -> Result<i64, AppError> {
        let db = self.inner.read();
        let ledger = match target {
            VoteTarget::Post => &db.post_votes,
            VoteTarget::Comment => &db.comment_votes,
        };
        Ok(ledger.keys().filter(|(_, id)| *id == target_id).count() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Post, PostRepository};
    use crate::domain::value_objects::VoteType;

    async fn store_with_post() -> InMemoryStore {
        let store = InMemoryStore::new();
        PostRepository::create(
            &store,
            &Post {
                id: 1,
                title: "t".into(),
                content: "c".into(),
                author_id: 9,
                group_id: 5,
                comments_count: 0,
                upvotes_count: 0,
                downvotes_count: 0,
                created_at: Utc::now(),
                indexed: false,
                sync_version: 0,
            },
        )
        .await
        .unwrap();
        store
    }

    #[tokio::test]
    async fn test_flip_keeps_single_record() {
        let store = store_with_post().await;
        store
            .apply_vote(VoteTarget::Post, 2, 1, VoteDirection::Up, 100)
            .await
            .unwrap();
        let outcome = store
            .apply_vote(VoteTarget::Post, 2, 1, VoteDirection::Down, 101)
            .await
            .unwrap();

        assert_eq!(outcome.tally, VoteTally::new(0, 1));
        let vote = store.find_vote(VoteTarget::Post, 2, 1).await.unwrap().unwrap();
        assert_eq!(vote.id, 100);
        assert_eq!(vote.vote_type, VoteType::Down);
        assert_eq!(store.count_for_target(VoteTarget::Post, 1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_target_is_not_found() {
        let store = InMemoryStore::new();
        let err = store
            .apply_vote(VoteTarget::Comment, 2, 77, VoteDirection::Up, 1)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(store.find_vote(VoteTarget::Comment, 2, 77).await.unwrap().is_none());
    }
}
