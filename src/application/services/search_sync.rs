//! Search Mirror Synchronization
//!
//! Every write path commits to the primary store first, then calls into
//! [`SearchSync`] to push the flattened projection to the mirror and set the
//! `indexed` flag. A mirror failure is logged and counted but never returned:
//! the document simply stays in the backlog until [`SearchSync::sweep`]
//! picks it up again.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use tracing::instrument;

use crate::application::dto::{KindReport, SweepReport, SyncOutcome};
use crate::domain::search::{
    ArticleDocument, CommentDocument, DocumentKind, GroupDocument, MirrorError, PostDocument,
    SearchMirror,
};
use crate::domain::{
    Article, ArticleRepository, Comment, CommentRepository, Group, GroupRepository, Post,
    PostRepository,
};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;

/// Pushes documents to the search mirror and maintains the `indexed` flags.
pub struct SearchSync {
    articles: Arc<dyn ArticleRepository>,
    groups: Arc<dyn GroupRepository>,
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    mirror: Arc<dyn SearchMirror>,
}

impl SearchSync {
    pub fn new(
        articles: Arc<dyn ArticleRepository>,
        groups: Arc<dyn GroupRepository>,
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        mirror: Arc<dyn SearchMirror>,
    ) -> Self {
        Self {
            articles,
            groups,
            posts,
            comments,
            mirror,
        }
    }

    pub async fn sync_article(&self, article: &Article) -> SyncOutcome {
        let submitted = self.mirror.index_article(&ArticleDocument::new(article)).await;
        self.confirm(
            DocumentKind::Article,
            article.id,
            submitted,
            self.articles.mark_indexed(article.id, article.sync_version),
        )
        .await
    }

    pub async fn sync_group(&self, group: &Group) -> SyncOutcome {
        let submitted = self.mirror.index_group(&GroupDocument::new(group)).await;
        self.confirm(
            DocumentKind::Group,
            group.id,
            submitted,
            self.groups.mark_indexed(group.id, group.sync_version),
        )
        .await
    }

    /// Sync a post, loading its group for the projection.
    pub async fn sync_post(&self, post: &Post) -> SyncOutcome {
        match self.parent(DocumentKind::Post, post.id, self.groups.find_by_id(post.group_id)).await {
            Ok(Some(group)) => self.sync_post_in(post, &group).await,
            Ok(None) => SyncOutcome::Skipped,
            Err(outcome) => outcome,
        }
    }

    /// Sync a post whose group is already at hand.
    pub async fn sync_post_in(&self, post: &Post, group: &Group) -> SyncOutcome {
        let submitted = self.mirror.index_post(&PostDocument::new(post, group)).await;
        self.confirm(
            DocumentKind::Post,
            post.id,
            submitted,
            self.posts.mark_indexed(post.id, post.sync_version),
        )
        .await
    }

    /// Sync a comment, loading its post and group for the projection.
    pub async fn sync_comment(&self, comment: &Comment) -> SyncOutcome {
        let post = match self
            .parent(DocumentKind::Comment, comment.id, self.posts.find_by_id(comment.post_id))
            .await
        {
            Ok(Some(post)) => post,
            Ok(None) => return SyncOutcome::Skipped,
            Err(outcome) => return outcome,
        };
        match self
            .parent(DocumentKind::Comment, comment.id, self.groups.find_by_id(post.group_id))
            .await
        {
            Ok(Some(group)) => self.sync_comment_in(comment, &post, &group).await,
            Ok(None) => SyncOutcome::Skipped,
            Err(outcome) => outcome,
        }
    }

    pub async fn sync_comment_in(&self, comment: &Comment, post: &Post, group: &Group) -> SyncOutcome {
        let submitted = self
            .mirror
            .index_comment(&CommentDocument::new(comment, post, group))
            .await;
        self.confirm(
            DocumentKind::Comment,
            comment.id,
            submitted,
            self.comments.mark_indexed(comment.id, comment.sync_version),
        )
        .await
    }

    /// Best-effort mirror delete. Runs whatever the document's flag says.
    pub async fn remove(&self, kind: DocumentKind, id: i64) {
        let result = self.mirror.delete(kind, id).await;
        metrics::record_mirror_delete(kind.as_str(), result.is_ok());
        if let Err(e) = result {
            tracing::warn!(kind = %kind, id, error = %e, "Search mirror delete failed");
        }
    }

    /// Re-submit up to `limit` unindexed documents of each kind.
    ///
    /// Picked rows are stamped as attempted, so the next run starts with
    /// rows that have waited longest.
    ///
    /// Only listing the backlog can fail the sweep; per-document failures
    /// are counted in the report and left for the next run.
    #[instrument(skip(self), level = "debug")]
    pub async fn sweep(&self, limit: i64) -> Result<SweepReport, AppError> {
        let limit = limit.max(1);
        let mut report = SweepReport::default();

        let articles = self.articles.list_unindexed(limit).await?;
        self.articles
            .mark_attempted(&articles.iter().map(|a| a.id).collect::<Vec<_>>())
            .await?;
        let outcomes = join_all(articles.iter().map(|a| self.sync_article(a))).await;
        tally(report.kind_mut(DocumentKind::Article), outcomes);

        let groups = self.groups.list_unindexed(limit).await?;
        self.groups
            .mark_attempted(&groups.iter().map(|g| g.id).collect::<Vec<_>>())
            .await?;
        let outcomes = join_all(groups.iter().map(|g| self.sync_group(g))).await;
        tally(report.kind_mut(DocumentKind::Group), outcomes);

        let posts = self.posts.list_unindexed(limit).await?;
        self.posts
            .mark_attempted(&posts.iter().map(|p| p.id).collect::<Vec<_>>())
            .await?;
        let outcomes = self.sweep_posts(&posts).await?;
        tally(report.kind_mut(DocumentKind::Post), outcomes);

        let comments = self.comments.list_unindexed(limit).await?;
        self.comments
            .mark_attempted(&comments.iter().map(|c| c.id).collect::<Vec<_>>())
            .await?;
        let outcomes = self.sweep_comments(&comments).await?;
        tally(report.kind_mut(DocumentKind::Comment), outcomes);

        for kind in DocumentKind::ALL {
            let k = report.kind(kind);
            metrics::record_sweep(kind.as_str(), k.indexed, k.failed, k.skipped);
        }
        metrics::record_sweep_completed();

        if report.attempted() > 0 {
            tracing::info!(
                attempted = report.attempted(),
                indexed = report.indexed(),
                "Backlog sweep finished"
            );
        }

        Ok(report)
    }

    async fn sweep_posts(&self, posts: &[Post]) -> Result<Vec<SyncOutcome>, AppError> {
        let group_ids: Vec<i64> = posts.iter().map(|p| p.group_id).collect();
        let groups = &by_id(self.groups.find_by_ids(&group_ids).await?, |g| g.id);

        Ok(join_all(posts.iter().map(|post| async move {
            match groups.get(&post.group_id) {
                Some(group) => self.sync_post_in(post, group).await,
                None => SyncOutcome::Skipped,
            }
        }))
        .await)
    }

    async fn sweep_comments(&self, comments: &[Comment]) -> Result<Vec<SyncOutcome>, AppError> {
        let post_ids: Vec<i64> = comments.iter().map(|c| c.post_id).collect();
        let posts = &by_id(self.posts.find_by_ids(&post_ids).await?, |p| p.id);
        let group_ids: Vec<i64> = posts.values().map(|p| p.group_id).collect();
        let groups = &by_id(self.groups.find_by_ids(&group_ids).await?, |g| g.id);

        Ok(join_all(comments.iter().map(|comment| async move {
            let parents = posts
                .get(&comment.post_id)
                .and_then(|post| groups.get(&post.group_id).map(|group| (post, group)));
            match parents {
                Some((post, group)) => self.sync_comment_in(comment, post, group).await,
                None => SyncOutcome::Skipped,
            }
        }))
        .await)
    }

    /// Resolve a parent record, turning a lookup error into `Failed`.
    async fn parent<T>(
        &self,
        kind: DocumentKind,
        id: i64,
        lookup: impl Future<Output = Result<Option<T>, AppError>>,
    ) -> Result<Option<T>, SyncOutcome> {
        lookup.await.map_err(|e| {
            tracing::warn!(kind = %kind, id, error = %e, "Could not load parent for projection");
            SyncOutcome::Failed
        })
    }

    /// Set the flag after a successful submit. The store only sets it when
    /// the submitted version is still the current one.
    async fn confirm(
        &self,
        kind: DocumentKind,
        id: i64,
        submitted: Result<(), MirrorError>,
        mark: impl Future<Output = Result<bool, AppError>>,
    ) -> SyncOutcome {
        metrics::record_mirror_sync(kind.as_str(), submitted.is_ok());
        if let Err(e) = submitted {
            tracing::warn!(kind = %kind, id, error = %e, "Search mirror sync failed, left in backlog");
            return SyncOutcome::Failed;
        }

        match mark.await {
            Ok(true) => SyncOutcome::Indexed,
            Ok(false) => {
                tracing::debug!(kind = %kind, id, "Document changed since submit, left in backlog");
                SyncOutcome::Failed
            }
            Err(e) => {
                tracing::warn!(kind = %kind, id, error = %e, "Failed to mark document indexed");
                SyncOutcome::Failed
            }
        }
    }
}

fn tally(report: &mut KindReport, outcomes: Vec<SyncOutcome>) {
    for outcome in outcomes {
        report.record(outcome);
    }
}

fn by_id<T>(rows: Vec<T>, key: impl Fn(&T) -> i64) -> HashMap<i64, T> {
    rows.into_iter().map(|row| (key(&row), row)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::fixtures;
    use crate::domain::search::MockSearchMirror;
    use crate::domain::ArticleUpdate;
    use crate::infrastructure::memory::InMemoryStore;
    use crate::infrastructure::search::InMemorySearchMirror;

    fn sync_with(store: &Arc<InMemoryStore>, mirror: MockSearchMirror) -> SearchSync {
        SearchSync::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(mirror),
        )
    }

    fn recording(store: &Arc<InMemoryStore>) -> (SearchSync, Arc<InMemorySearchMirror>) {
        let mirror = Arc::new(InMemorySearchMirror::new());
        let sync = SearchSync::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            mirror.clone(),
        );
        (sync, mirror)
    }

    #[tokio::test]
    async fn test_successful_sync_sets_flag() {
        let store = Arc::new(InMemoryStore::new());
        let article = ArticleRepository::create(&*store, &fixtures::article(1, "Rust", "rust"))
            .await
            .unwrap();

        let mut mirror = MockSearchMirror::new();
        mirror
            .expect_index_article()
            .withf(|doc| doc.id == "1" && doc.slug == "rust")
            .times(1)
            .returning(|_| Ok(()));
        let sync = sync_with(&store, mirror);

        assert_eq!(sync.sync_article(&article).await, SyncOutcome::Indexed);
        let stored = ArticleRepository::find_by_id(&*store, 1).await.unwrap().unwrap();
        assert!(stored.indexed);
    }

    #[tokio::test]
    async fn test_failed_sync_is_swallowed() {
        let store = Arc::new(InMemoryStore::new());
        let group = GroupRepository::create(&*store, &fixtures::group(1, "crabs", 10))
            .await
            .unwrap();

        let mut mirror = MockSearchMirror::new();
        mirror
            .expect_index_group()
            .returning(|_| Err(MirrorError::Unavailable("down".into())));
        let sync = sync_with(&store, mirror);

        assert_eq!(sync.sync_group(&group).await, SyncOutcome::Failed);
        let backlog = GroupRepository::list_unindexed(&*store, 10).await.unwrap();
        assert_eq!(backlog.len(), 1);
    }

    #[tokio::test]
    async fn test_post_without_group_is_skipped() {
        let store = Arc::new(InMemoryStore::new());
        let post = PostRepository::create(&*store, &fixtures::post(5, 404, 10))
            .await
            .unwrap();

        let mut mirror = MockSearchMirror::new();
        mirror.expect_index_post().never();
        let sync = sync_with(&store, mirror);

        assert_eq!(sync.sync_post(&post).await, SyncOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_sweep_reports_per_kind() {
        let store = Arc::new(InMemoryStore::new());
        GroupRepository::create(&*store, &fixtures::group(1, "crabs", 10))
            .await
            .unwrap();
        PostRepository::create(&*store, &fixtures::post(2, 1, 10))
            .await
            .unwrap();
        PostRepository::create(&*store, &fixtures::post(3, 999, 10))
            .await
            .unwrap();
        ArticleRepository::create(&*store, &fixtures::article(4, "Rust", "rust"))
            .await
            .unwrap();

        let mut mirror = MockSearchMirror::new();
        mirror.expect_index_group().returning(|_| Ok(()));
        mirror
            .expect_index_post()
            .withf(|doc| doc.group_type == "PUBLIC")
            .returning(|_| Ok(()));
        mirror
            .expect_index_article()
            .returning(|_| Err(MirrorError::Status { status: 503, body: String::new() }));
        let sync = sync_with(&store, mirror);

        let report = sync.sweep(10).await.unwrap();
        assert_eq!(report.groups.indexed, 1);
        assert_eq!(report.posts.attempted, 2);
        assert_eq!(report.posts.indexed, 1);
        assert_eq!(report.posts.skipped, 1);
        assert_eq!(report.articles.failed, 1);
        assert_eq!(report.comments, KindReport::default());

        // Only the failed and skipped documents remain in the backlog.
        assert!(GroupRepository::list_unindexed(&*store, 10).await.unwrap().is_empty());
        assert_eq!(PostRepository::list_unindexed(&*store, 10).await.unwrap().len(), 1);
        assert_eq!(ArticleRepository::list_unindexed(&*store, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_ignores_mirror_errors() {
        let store = Arc::new(InMemoryStore::new());
        let mut mirror = MockSearchMirror::new();
        mirror
            .expect_delete()
            .withf(|kind, id| *kind == DocumentKind::Comment && *id == 9)
            .times(1)
            .returning(|_, _| Err(MirrorError::Transport("reset".into())));
        let sync = sync_with(&store, mirror);

        sync.remove(DocumentKind::Comment, 9).await;
    }

    #[tokio::test]
    async fn test_stale_submit_does_not_clear_newer_edit() {
        let store = Arc::new(InMemoryStore::new());
        let (sync, mirror) = recording(&store);
        ArticleRepository::create(&*store, &fixtures::article(1, "Draft", "draft"))
            .await
            .unwrap();

        // a sweep has already read the first version
        let stale = ArticleRepository::list_unindexed(&*store, 10)
            .await
            .unwrap()
            .remove(0);

        // an edit lands while the mirror is down
        mirror.set_failing(true);
        let edit = ArticleUpdate {
            content: Some("second draft".into()),
            ..Default::default()
        };
        let edited = ArticleRepository::update(&*store, 1, &edit).await.unwrap();
        assert_eq!(sync.sync_article(&edited).await, SyncOutcome::Failed);

        // then the sweep's submit of the old version goes through
        mirror.set_failing(false);
        assert_eq!(sync.sync_article(&stale).await, SyncOutcome::Failed);

        let stored = ArticleRepository::find_by_id(&*store, 1).await.unwrap().unwrap();
        assert!(!stored.indexed);
        assert_eq!(stored.sync_version, 1);

        let report = sync.sweep(10).await.unwrap();
        assert_eq!(report.articles.indexed, 1);
        assert_eq!(
            mirror.get(DocumentKind::Article, 1).unwrap()["content"],
            "second draft"
        );
        assert!(ArticleRepository::list_unindexed(&*store, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_membership_change_supersedes_inflight_group_submit() {
        let store = Arc::new(InMemoryStore::new());
        let (sync, _mirror) = recording(&store);
        let group = GroupRepository::create(&*store, &fixtures::group(1, "crabs", 10))
            .await
            .unwrap();

        assert!(GroupRepository::add_member(&*store, 1, 11).await.unwrap());
        assert_eq!(sync.sync_group(&group).await, SyncOutcome::Failed);

        let current = GroupRepository::find_by_id(&*store, 1).await.unwrap().unwrap();
        assert!(!current.indexed);
        assert_eq!(sync.sync_group(&current).await, SyncOutcome::Indexed);
    }

    #[tokio::test]
    async fn test_skipped_posts_do_not_starve_the_backlog() {
        let store = Arc::new(InMemoryStore::new());
        let (sync, mirror) = recording(&store);
        GroupRepository::create(&*store, &fixtures::group(50, "crabs", 10))
            .await
            .unwrap();
        for id in 1..=3 {
            PostRepository::create(&*store, &fixtures::post(id, 999, 10))
                .await
                .unwrap();
        }
        PostRepository::create(&*store, &fixtures::post(100, 50, 10))
            .await
            .unwrap();

        let first = sync.sweep(3).await.unwrap();
        assert_eq!(first.posts.skipped, 3);
        assert!(!mirror.contains(DocumentKind::Post, 100));

        let second = sync.sweep(3).await.unwrap();
        assert_eq!(second.posts.indexed, 1);
        assert!(mirror.contains(DocumentKind::Post, 100));
    }
}
