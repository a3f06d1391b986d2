//! Vote ledger flows

use pretty_assertions::assert_eq;

use community_store::domain::{GroupKind, VoteDirection, VoteTally, VoteTarget};

use crate::common::{comment_dto, group_dto, post_dto, TestApp};

async fn seeded_post(app: &TestApp) -> String {
    let group = app
        .state
        .community
        .create_group("1", group_dto(GroupKind::Public))
        .await
        .unwrap();
    let post = app
        .state
        .community
        .create_post("1", &group.id.to_string(), post_dto())
        .await
        .unwrap();
    post.id.to_string()
}

#[tokio::test]
async fn test_vote_sequence_moves_counters() {
    let app = TestApp::new();
    let post_id = seeded_post(&app).await;
    let votes = &app.state.votes;

    assert_eq!(
        votes.vote_post("42", &post_id, VoteDirection::Up).await.unwrap(),
        VoteTally::new(1, 0)
    );
    assert_eq!(
        votes.vote_post("42", &post_id, VoteDirection::Down).await.unwrap(),
        VoteTally::new(0, 1)
    );
    assert_eq!(
        votes.vote_post("42", &post_id, VoteDirection::None).await.unwrap(),
        VoteTally::new(0, 0)
    );
    assert_eq!(
        votes.vote_post("42", &post_id, VoteDirection::Up).await.unwrap(),
        VoteTally::new(1, 0)
    );

    let stored = app.state.community.get_post(&post_id).await.unwrap();
    assert_eq!(stored.tally(), VoteTally::new(1, 0));
    let records = app
        .repos()
        .votes
        .count_for_target(VoteTarget::Post, stored.id)
        .await
        .unwrap();
    assert_eq!(records, 1);
}

#[tokio::test]
async fn test_concurrent_voters_are_all_counted() {
    let app = TestApp::new();
    let post_id = seeded_post(&app).await;

    let requests = (1..=20).map(|user| {
        let votes = app.state.votes.clone();
        let post_id = post_id.clone();
        let direction = if user % 4 == 0 {
            VoteDirection::Down
        } else {
            VoteDirection::Up
        };
        tokio::spawn(async move { votes.vote_post(&user.to_string(), &post_id, direction).await })
    });
    for handle in futures::future::join_all(requests).await {
        handle.unwrap().unwrap();
    }

    let post = app.state.community.get_post(&post_id).await.unwrap();
    assert_eq!(post.tally(), VoteTally::new(15, 5));
}

#[tokio::test]
async fn test_comment_votes_track_separately_from_post_votes() {
    let app = TestApp::new();
    let post_id = seeded_post(&app).await;
    let comment = app
        .state
        .community
        .create_comment("7", &post_id, None, comment_dto())
        .await
        .unwrap();
    let comment_id = comment.id.to_string();

    app.state
        .votes
        .vote_comment("42", &comment_id, VoteDirection::Down)
        .await
        .unwrap();

    assert_eq!(
        app.state.votes.get_user_comment_vote("42", &comment_id).await.unwrap(),
        VoteDirection::Down
    );
    assert_eq!(
        app.state.votes.get_user_vote("42", &post_id).await.unwrap(),
        VoteDirection::None
    );
    let stored = app.state.community.get_comment(&comment_id).await.unwrap();
    assert_eq!((stored.upvotes_count, stored.downvotes_count), (0, 1));
}
