//! Group cascade deletion flows

use pretty_assertions::assert_eq;
use tokio_test::assert_ok;

use community_store::application::dto::{CascadeReport, SendMessageDto};
use community_store::domain::search::DocumentKind;
use community_store::domain::{GroupKind, VoteDirection, VoteTarget};

use crate::common::{comment_dto, group_dto, post_dto, TestApp};

/// One group with two posts, a comment on each, votes on all four and a
/// message in the default channel.
struct Seeded {
    group_id: i64,
    post_ids: Vec<i64>,
    comment_ids: Vec<i64>,
    discussion_id: i64,
}

async fn seed(app: &TestApp) -> Seeded {
    let community = &app.state.community;
    let group = community
        .create_group("1", group_dto(GroupKind::Public))
        .await
        .unwrap();
    let gid = group.id.to_string();

    let mut post_ids = Vec::new();
    let mut comment_ids = Vec::new();
    for _ in 0..2 {
        let post = community.create_post("2", &gid, post_dto()).await.unwrap();
        let pid = post.id.to_string();
        let comment = community
            .create_comment("3", &pid, None, comment_dto())
            .await
            .unwrap();
        app.state.votes.vote_post("4", &pid, VoteDirection::Up).await.unwrap();
        app.state
            .votes
            .vote_comment("4", &comment.id.to_string(), VoteDirection::Down)
            .await
            .unwrap();
        post_ids.push(post.id);
        comment_ids.push(comment.id);
    }

    let discussion = app
        .state
        .discussions
        .get_discussion_by_group(&gid)
        .await
        .unwrap()
        .unwrap();
    let channels = app
        .state
        .discussions
        .list_channels(&discussion.id.to_string())
        .await
        .unwrap();
    app.state
        .discussions
        .send_message(
            &channels[0].id.to_string(),
            "1",
            SendMessageDto {
                content: "welcome".into(),
            },
        )
        .await
        .unwrap();

    Seeded {
        group_id: group.id,
        post_ids,
        comment_ids,
        discussion_id: discussion.id,
    }
}

#[tokio::test]
async fn test_delete_group_removes_everything_beneath_it() {
    let app = TestApp::new();
    let seeded = seed(&app).await;
    let gid = seeded.group_id.to_string();

    let report = app.state.community.delete_group(&gid).await.unwrap();

    assert_eq!(
        report,
        CascadeReport {
            groups: 1,
            posts: 2,
            comments: 2,
            post_votes: 2,
            comment_votes: 2,
            discussions: 1,
            channels: 1,
            messages: 1,
        }
    );

    let repos = app.repos();
    assert!(app.state.community.get_group(&gid).await.unwrap_err().is_not_found());
    assert!(repos.posts.find_by_ids(&seeded.post_ids).await.unwrap().is_empty());
    assert!(repos.comments.find_by_ids(&seeded.comment_ids).await.unwrap().is_empty());
    for post_id in &seeded.post_ids {
        assert_eq!(repos.votes.count_for_target(VoteTarget::Post, *post_id).await.unwrap(), 0);
    }
    for comment_id in &seeded.comment_ids {
        assert_eq!(
            repos.votes.count_for_target(VoteTarget::Comment, *comment_id).await.unwrap(),
            0
        );
    }
    assert!(repos.discussions.find_discussion(seeded.discussion_id).await.unwrap().is_none());
    assert!(repos.discussions.list_channels(seeded.discussion_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_group_clears_search_documents() {
    let app = TestApp::new();
    let seeded = seed(&app).await;
    assert!(app.mirror.contains(DocumentKind::Group, seeded.group_id));
    assert_eq!(app.mirror.count(DocumentKind::Post), 2);

    app.state
        .community
        .delete_group(&seeded.group_id.to_string())
        .await
        .unwrap();

    assert!(!app.mirror.contains(DocumentKind::Group, seeded.group_id));
    assert_eq!(app.mirror.count(DocumentKind::Post), 0);
    assert_eq!(app.mirror.count(DocumentKind::Comment), 0);
}

#[tokio::test]
async fn test_delete_group_twice_is_harmless() {
    let app = TestApp::new();
    let seeded = seed(&app).await;
    let gid = seeded.group_id.to_string();

    assert_ok!(app.state.community.delete_group(&gid).await);
    let again = assert_ok!(app.state.community.delete_group(&gid).await);

    assert_eq!(again, CascadeReport::default());
}

#[tokio::test]
async fn test_delete_group_leaves_other_groups_alone() {
    let app = TestApp::new();
    let doomed = seed(&app).await;
    let survivor = seed(&app).await;

    app.state
        .community
        .delete_group(&doomed.group_id.to_string())
        .await
        .unwrap();

    let posts = app.repos().posts.find_by_ids(&survivor.post_ids).await.unwrap();
    assert_eq!(posts.len(), 2);
    assert!(posts.iter().all(|p| p.upvotes_count == 1));
    assert!(app
        .repos()
        .discussions
        .find_discussion(survivor.discussion_id)
        .await
        .unwrap()
        .is_some());
}
