//! Unindexed backlog flows

use pretty_assertions::assert_eq;

use community_store::domain::search::DocumentKind;
use community_store::domain::GroupKind;

use crate::common::{article_dto, comment_dto, group_dto, post_dto, unique_slug, TestApp};

#[tokio::test]
async fn test_outage_leaves_backlog_that_sweep_drains() {
    let app = TestApp::new();
    app.mirror.set_failing(true);

    let slug = unique_slug("outage");
    let article = app
        .state
        .articles
        .create_article("9", article_dto("Outage", &slug, "written while offline"))
        .await
        .unwrap();
    assert!(!article.indexed);

    let backlog = app.repos().articles.list_unindexed(10).await.unwrap();
    assert!(backlog.iter().any(|a| a.id == article.id));

    app.mirror.set_failing(false);
    let report = app.state.sync.sweep(10).await.unwrap();

    assert_eq!(report.articles.indexed, 1);
    assert!(app.mirror.contains(DocumentKind::Article, article.id));
    let backlog = app.repos().articles.list_unindexed(10).await.unwrap();
    assert!(backlog.iter().all(|a| a.id != article.id));
}

#[tokio::test]
async fn test_sweep_covers_every_kind() {
    let app = TestApp::new();
    app.mirror.set_failing(true);

    let community = &app.state.community;
    let group = community
        .create_group("1", group_dto(GroupKind::Public))
        .await
        .unwrap();
    let post = community
        .create_post("1", &group.id.to_string(), post_dto())
        .await
        .unwrap();
    let comment = community
        .create_comment("2", &post.id.to_string(), None, comment_dto())
        .await
        .unwrap();

    app.mirror.set_failing(false);
    let report = app.state.sync.sweep(50).await.unwrap();

    assert_eq!(report.groups.indexed, 1);
    assert_eq!(report.posts.indexed, 1);
    assert_eq!(report.comments.indexed, 1);
    assert!(app.mirror.contains(DocumentKind::Comment, comment.id));

    let second = app.state.sync.sweep(50).await.unwrap();
    assert_eq!(second.attempted(), 0);
}

#[tokio::test]
async fn test_sweep_respects_batch_size() {
    let app = TestApp::new();
    app.mirror.set_failing(true);
    for n in 0..3 {
        app.state
            .articles
            .create_article(
                "9",
                article_dto(&format!("Title {n}"), &unique_slug("batch"), "body"),
            )
            .await
            .unwrap();
    }
    app.mirror.set_failing(false);

    let first = app.state.sync.sweep(2).await.unwrap();
    let second = app.state.sync.sweep(2).await.unwrap();

    assert_eq!(first.articles.indexed, 2);
    assert_eq!(second.articles.indexed, 1);
}

#[tokio::test]
async fn test_mirror_document_reflects_latest_write() {
    let app = TestApp::new();
    let group = app
        .state
        .community
        .create_group("1", group_dto(GroupKind::Public))
        .await
        .unwrap();
    let gid = group.id.to_string();

    app.state.community.join_group(&gid, "55").await.unwrap();

    let doc = app.mirror.get(DocumentKind::Group, group.id).unwrap();
    assert_eq!(doc["membersCount"], 2);
}
