//! Group Cascade Deletion
//!
//! Deleting a group removes everything that exists only because of it:
//! posts with their comments and both vote ledgers, then the discussion with
//! its channels and messages. Every step is a conditional bulk delete, so a
//! cascade that stopped half way is finished by running it again.

use std::sync::Arc;

use futures::future::join_all;
use tracing::instrument;

use crate::application::dto::CascadeReport;
use crate::application::services::SearchSync;
use crate::domain::search::DocumentKind;
use crate::domain::{
    CommentRepository, DiscussionRepository, GroupRepository, PostRepository, VoteRepository,
    VoteTarget,
};
use crate::infrastructure::metrics;
use crate::shared::error::{AppError, CascadeStep};

pub struct GroupCascade {
    groups: Arc<dyn GroupRepository>,
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    votes: Arc<dyn VoteRepository>,
    discussions: Arc<dyn DiscussionRepository>,
    sync: Arc<SearchSync>,
}

/// Posts and comments found under a group.
#[derive(Debug)]
struct Dependents {
    post_ids: Vec<i64>,
    comment_ids: Vec<i64>,
}

impl GroupCascade {
    pub fn new(
        groups: Arc<dyn GroupRepository>,
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        votes: Arc<dyn VoteRepository>,
        discussions: Arc<dyn DiscussionRepository>,
        sync: Arc<SearchSync>,
    ) -> Self {
        Self {
            groups,
            posts,
            comments,
            votes,
            discussions,
            sync,
        }
    }

    /// Remove a group and all of its dependents.
    ///
    /// A failed discovery skips only the branch it feeds and is reported
    /// once the other branch has run. A failed delete stops the cascade
    /// immediately. Completed steps are never rolled back.
    #[instrument(skip(self), level = "debug")]
    pub async fn delete_group(&self, group_id: i64) -> Result<CascadeReport, AppError> {
        let mut report = CascadeReport::default();
        let result = self.run(group_id, &mut report).await;
        metrics::record_cascade(result.is_ok());

        match result {
            Ok(()) => {
                tracing::info!(
                    group_id,
                    posts = report.posts,
                    comments = report.comments,
                    messages = report.messages,
                    "Group cascade completed"
                );
                Ok(report)
            }
            Err(e) => {
                tracing::warn!(group_id, error = %e, "Group cascade incomplete");
                Err(e)
            }
        }
    }

    async fn run(&self, group_id: i64, report: &mut CascadeReport) -> Result<(), AppError> {
        report.groups = self
            .groups
            .delete(group_id)
            .await
            .map_err(|e| AppError::cascade(CascadeStep::DeleteGroup, e))?;
        self.remove_from_mirror(DocumentKind::Group, &[group_id]).await;

        let mut deferred = None;

        match self.discover_posts(group_id).await {
            Ok(found) => self.delete_posts(group_id, &found, report).await?,
            Err(e) => {
                tracing::warn!(group_id, error = %e, "Skipping post branch of cascade");
                deferred = Some(e);
            }
        }

        if let Err(e) = self.delete_discussion(group_id, report).await {
            match e {
                AppError::CascadeStep {
                    step: CascadeStep::DiscoverDiscussion | CascadeStep::DiscoverChannels,
                    ..
                } => {
                    tracing::warn!(group_id, error = %e, "Skipping discussion branch of cascade");
                    deferred.get_or_insert(e);
                }
                other => return Err(other),
            }
        }

        match deferred {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn discover_posts(&self, group_id: i64) -> Result<Dependents, AppError> {
        let post_ids = self
            .posts
            .find_ids_by_group(group_id)
            .await
            .map_err(|e| AppError::cascade(CascadeStep::DiscoverPosts, e))?;
        let comment_ids = self
            .comments
            .find_ids_by_posts(&post_ids)
            .await
            .map_err(|e| AppError::cascade(CascadeStep::DiscoverComments, e))?;

        tracing::debug!(
            group_id,
            posts = post_ids.len(),
            comments = comment_ids.len(),
            "Discovered cascade dependents"
        );
        Ok(Dependents {
            post_ids,
            comment_ids,
        })
    }

    async fn delete_posts(
        &self,
        group_id: i64,
        found: &Dependents,
        report: &mut CascadeReport,
    ) -> Result<(), AppError> {
        report.comment_votes = self
            .votes
            .delete_by_targets(VoteTarget::Comment, &found.comment_ids)
            .await
            .map_err(|e| AppError::cascade(CascadeStep::DeleteCommentVotes, e))?;
        report.comments = self
            .comments
            .delete_by_posts(&found.post_ids)
            .await
            .map_err(|e| AppError::cascade(CascadeStep::DeleteComments, e))?;
        self.remove_from_mirror(DocumentKind::Comment, &found.comment_ids)
            .await;
        report.post_votes = self
            .votes
            .delete_by_targets(VoteTarget::Post, &found.post_ids)
            .await
            .map_err(|e| AppError::cascade(CascadeStep::DeletePostVotes, e))?;
        // By group rather than by id, so posts created mid-cascade go too.
        report.posts = self
            .posts
            .delete_by_group(group_id)
            .await
            .map_err(|e| AppError::cascade(CascadeStep::DeletePosts, e))?;
        self.remove_from_mirror(DocumentKind::Post, &found.post_ids).await;
        Ok(())
    }

    async fn delete_discussion(
        &self,
        group_id: i64,
        report: &mut CascadeReport,
    ) -> Result<(), AppError> {
        let Some(discussion) = self
            .discussions
            .find_discussion_by_group(group_id)
            .await
            .map_err(|e| AppError::cascade(CascadeStep::DiscoverDiscussion, e))?
        else {
            return Ok(());
        };

        let channel_ids: Vec<i64> = self
            .discussions
            .list_channels(discussion.id)
            .await
            .map_err(|e| AppError::cascade(CascadeStep::DiscoverChannels, e))?
            .into_iter()
            .map(|c| c.id)
            .collect();

        report.messages = self
            .discussions
            .delete_messages_by_channels(&channel_ids)
            .await
            .map_err(|e| AppError::cascade(CascadeStep::DeleteMessages, e))?;
        report.channels = self
            .discussions
            .delete_channels_by_discussion(discussion.id)
            .await
            .map_err(|e| AppError::cascade(CascadeStep::DeleteChannels, e))?;
        report.discussions = self
            .discussions
            .delete_discussion(discussion.id)
            .await
            .map_err(|e| AppError::cascade(CascadeStep::DeleteDiscussion, e))?;
        Ok(())
    }

    /// Best-effort mirror deletes for rows that just left the primary store.
    /// A later retry no longer discovers them, so this runs right after
    /// each successful delete step.
    async fn remove_from_mirror(&self, kind: DocumentKind, ids: &[i64]) {
        join_all(ids.iter().map(|id| self.sync.remove(kind, *id))).await;
    }
}
