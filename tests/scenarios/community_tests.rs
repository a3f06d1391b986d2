//! Group membership, posting and threading flows

use pretty_assertions::assert_eq;
use test_case::test_case;

use community_store::application::services::community_service::DEFAULT_CHANNEL;
use community_store::domain::{GroupFilter, GroupKind};
use community_store::shared::error::AppError;

use crate::common::{comment_dto, group_dto, post_dto, TestApp};

#[tokio::test]
async fn test_members_count_tracks_membership() {
    let app = TestApp::new();
    let community = &app.state.community;
    let group = community
        .create_group("1", group_dto(GroupKind::Public))
        .await
        .unwrap();
    let gid = group.id.to_string();
    assert_eq!(group.members_count, 1);
    assert!(community.is_member(&gid, "1").await.unwrap());

    assert!(community.join_group(&gid, "2").await.unwrap());
    assert!(!community.join_group(&gid, "2").await.unwrap());
    assert!(community.join_group(&gid, "3").await.unwrap());
    assert!(community.leave_group(&gid, "2").await.unwrap());
    assert!(!community.leave_group(&gid, "2").await.unwrap());

    let stored = community.get_group(&gid).await.unwrap();
    assert_eq!(stored.members_count as usize, stored.member_ids.len());
    assert_eq!(stored.members_count, 2);

    let mine = community.list_groups_by_member("3").await.unwrap();
    assert_eq!(mine.iter().map(|g| g.id).collect::<Vec<_>>(), vec![group.id]);
}

#[tokio::test]
async fn test_new_group_gets_discussion_and_default_channel() {
    let app = TestApp::new();
    let group = app
        .state
        .community
        .create_group("1", group_dto(GroupKind::Private))
        .await
        .unwrap();

    let discussion = app
        .state
        .discussions
        .get_discussion_by_group(&group.id.to_string())
        .await
        .unwrap()
        .expect("discussion created with the group");
    let channels = app
        .state
        .discussions
        .list_channels(&discussion.id.to_string())
        .await
        .unwrap();

    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0].name, DEFAULT_CHANNEL);
}

#[tokio::test]
async fn test_public_feed_excludes_private_groups() {
    let app = TestApp::new();
    let community = &app.state.community;
    let public = community
        .create_group("1", group_dto(GroupKind::Public))
        .await
        .unwrap();
    let private = community
        .create_group("1", group_dto(GroupKind::Private))
        .await
        .unwrap();
    let visible = community
        .create_post("1", &public.id.to_string(), post_dto())
        .await
        .unwrap();
    community
        .create_post("1", &private.id.to_string(), post_dto())
        .await
        .unwrap();

    let feed = community.list_public_posts(20, 0).await.unwrap();
    assert_eq!(feed.iter().map(|p| p.id).collect::<Vec<_>>(), vec![visible.id]);

    let filter = GroupFilter {
        kind: Some(GroupKind::Private),
        ..Default::default()
    };
    let privates = community.list_groups(&filter, 20, 0).await.unwrap();
    assert_eq!(privates.iter().map(|g| g.id).collect::<Vec<_>>(), vec![private.id]);
}

#[tokio::test]
async fn test_replies_thread_under_their_parent() {
    let app = TestApp::new();
    let community = &app.state.community;
    let group = community
        .create_group("1", group_dto(GroupKind::Public))
        .await
        .unwrap();
    let post = community
        .create_post("1", &group.id.to_string(), post_dto())
        .await
        .unwrap();
    let pid = post.id.to_string();

    let top = community.create_comment("2", &pid, None, comment_dto()).await.unwrap();
    let tid = top.id.to_string();
    let reply = community
        .create_comment("3", &pid, Some(&tid), comment_dto())
        .await
        .unwrap();

    let top_level = community.list_comments(&pid, None, 20, 0).await.unwrap();
    assert_eq!(top_level.iter().map(|c| c.id).collect::<Vec<_>>(), vec![top.id]);
    let replies = community.list_replies(&tid, 20, 0).await.unwrap();
    assert_eq!(replies.iter().map(|c| c.id).collect::<Vec<_>>(), vec![reply.id]);

    assert_eq!(community.get_comment(&tid).await.unwrap().replies_count, 1);
    assert_eq!(community.get_post(&pid).await.unwrap().comments_count, 2);
}

#[tokio::test]
async fn test_reply_to_comment_on_other_post_is_rejected() {
    let app = TestApp::new();
    let community = &app.state.community;
    let group = community
        .create_group("1", group_dto(GroupKind::Public))
        .await
        .unwrap();
    let gid = group.id.to_string();
    let first = community.create_post("1", &gid, post_dto()).await.unwrap();
    let second = community.create_post("1", &gid, post_dto()).await.unwrap();
    let comment = community
        .create_comment("2", &first.id.to_string(), None, comment_dto())
        .await
        .unwrap();

    let err = community
        .create_comment(
            "2",
            &second.id.to_string(),
            Some(&comment.id.to_string()),
            comment_dto(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[test_case("" ; "empty")]
#[test_case("abc" ; "letters")]
#[test_case("12x" ; "trailing junk")]
#[tokio::test]
async fn test_malformed_ids_are_invalid_identity(id: &str) {
    let app = TestApp::new();

    let err = app.state.community.get_group(id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidIdentity(_)));

    let err = app.state.community.delete_group(id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidIdentity(_)));
}

#[tokio::test]
async fn test_bulk_lookup_keeps_request_order() {
    let app = TestApp::new();
    let community = &app.state.community;
    let a = community.create_group("1", group_dto(GroupKind::Public)).await.unwrap();
    let b = community.create_group("1", group_dto(GroupKind::Public)).await.unwrap();

    let ids = vec![b.id.to_string(), "404".to_string(), a.id.to_string(), "nope".to_string()];
    let found = community.get_groups_by_ids(&ids).await.unwrap();

    assert_eq!(found.iter().map(|g| g.id).collect::<Vec<_>>(), vec![b.id, a.id]);
}
