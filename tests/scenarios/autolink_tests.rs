//! Article rendering with auto-linked titles

use pretty_assertions::assert_eq;

use crate::common::{article_dto, TestApp};

#[tokio::test]
async fn test_render_links_known_titles_but_not_itself() {
    let app = TestApp::new();
    let articles = &app.state.articles;
    articles
        .create_article("1", article_dto("Rust", "rust", "Rust pairs well with Tokio."))
        .await
        .unwrap();
    articles
        .create_article("1", article_dto("Tokio", "tokio", "An async runtime for Rust."))
        .await
        .unwrap();

    let rust = articles.render_article("rust").await.unwrap();
    let tokio = articles.render_article("tokio").await.unwrap();

    assert_eq!(rust.content, "Rust pairs well with Tokio (tokio).");
    assert_eq!(tokio.content, "An async runtime for Rust (rust).");
}

#[tokio::test]
async fn test_render_does_not_touch_stored_content() {
    let app = TestApp::new();
    let articles = &app.state.articles;
    articles
        .create_article("1", article_dto("Axum", "axum", "Built on Tower."))
        .await
        .unwrap();
    articles
        .create_article("1", article_dto("Tower", "tower", "Service abstractions."))
        .await
        .unwrap();

    articles.render_article("axum").await.unwrap();

    let stored = articles.get_article_by_slug("axum").await.unwrap();
    assert_eq!(stored.content, "Built on Tower.");
}

#[tokio::test]
async fn test_render_unknown_slug_is_not_found() {
    let app = TestApp::new();
    let err = app.state.articles.render_article("missing").await.unwrap_err();
    assert!(err.is_not_found());
}
