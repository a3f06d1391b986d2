//! Manual backlog sweep endpoint tests.

use axum_test::TestServer;
use pretty_assertions::assert_eq;

use community_store::domain::search::DocumentKind;
use community_store::domain::GroupKind;

use crate::common::{group_dto, TestApp};

#[tokio::test]
async fn test_sweep_reindexes_backlog() {
    let app = TestApp::new();
    app.mirror.set_failing(true);
    let group = app
        .state
        .community
        .create_group("1", group_dto(GroupKind::Public))
        .await
        .unwrap();
    assert!(!group.indexed);

    app.mirror.set_failing(false);
    let server = TestServer::new(app.router.clone()).unwrap();
    let response = server.post("/admin/sweep").add_query_param("limit", 10).await;

    response.assert_status_ok();
    let report: serde_json::Value = response.json();
    assert_eq!(report["groups"]["attempted"], 1);
    assert_eq!(report["groups"]["indexed"], 1);
    assert!(app.mirror.contains(DocumentKind::Group, group.id));
}

#[tokio::test]
async fn test_sweep_with_failing_mirror_reports_failures() {
    let app = TestApp::new();
    app.mirror.set_failing(true);
    app.state
        .community
        .create_group("1", group_dto(GroupKind::Private))
        .await
        .unwrap();

    let server = TestServer::new(app.router.clone()).unwrap();
    let response = server.post("/admin/sweep").await;

    response.assert_status_ok();
    let report: serde_json::Value = response.json();
    assert_eq!(report["groups"]["failed"], 1);
    assert_eq!(report["groups"]["indexed"], 0);
}

#[tokio::test]
async fn test_sweep_rejects_zero_limit() {
    let app = TestApp::new();
    let server = TestServer::new(app.router.clone()).unwrap();

    let response = server
        .post("/admin/sweep")
        .add_query_param("limit", 0)
        .expect_failure()
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], 10007);
}
