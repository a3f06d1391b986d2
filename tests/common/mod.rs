//! Common Test Utilities
//!
//! Shared helpers, fixtures, and test infrastructure. Every test app runs on
//! the in-memory store with an in-memory search mirror whose failures can be
//! switched on and off.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{body::Body, http::Request, Router};
use fake::faker::lorem::en::{Sentence, Words};
use fake::Fake;
use tower::ServiceExt;
use uuid::Uuid;

use community_store::application::dto::{
    CreateArticleDto, CreateCommentDto, CreateGroupDto, CreatePostDto,
};
use community_store::config::Settings;
use community_store::domain::GroupKind;
use community_store::infrastructure::search::InMemorySearchMirror;
use community_store::infrastructure::Repositories;
use community_store::presentation::http::routes;
use community_store::startup::AppState;

/// Test application builder
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub mirror: Arc<InMemorySearchMirror>,
}

impl TestApp {
    pub fn new() -> Self {
        let settings = Settings::defaults().expect("default settings must be valid");
        let mirror = Arc::new(InMemorySearchMirror::new());
        let state = AppState::new(settings, Repositories::in_memory(), mirror.clone());
        let router = routes::create_router(state.clone());

        Self {
            router,
            state,
            mirror,
        }
    }

    pub fn repos(&self) -> &Repositories {
        &self.state.repos
    }

    /// Make a GET request to the application
    pub async fn get(&self, uri: &str) -> axum::response::Response {
        self.request("GET", uri).await
    }

    /// Make a POST request without a body
    pub async fn post(&self, uri: &str) -> axum::response::Response {
        self.request("POST", uri).await
    }

    async fn request(&self, method: &str, uri: &str) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }
}

/// Collect a response body as JSON.
pub async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// A slug that will not collide across tests.
pub fn unique_slug(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

pub fn group_dto(kind: GroupKind) -> CreateGroupDto {
    let words: Vec<String> = Words(2..4).fake();
    CreateGroupDto {
        name: words.join(" "),
        description: Sentence(3..8).fake(),
        slug: unique_slug("group"),
        kind,
        icon: None,
    }
}

pub fn post_dto() -> CreatePostDto {
    CreatePostDto {
        title: Sentence(2..5).fake(),
        content: Sentence(5..12).fake(),
    }
}

pub fn comment_dto() -> CreateCommentDto {
    CreateCommentDto {
        content: Sentence(3..10).fake(),
    }
}

pub fn article_dto(title: &str, slug: &str, content: &str) -> CreateArticleDto {
    CreateArticleDto {
        title: title.to_string(),
        content: content.to_string(),
        slug: slug.to_string(),
        category: "guides".to_string(),
        thumbnail: String::new(),
        featured: false,
    }
}
