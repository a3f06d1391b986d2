//! HTTP search mirror for Meilisearch-compatible document APIs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;

use crate::domain::search::{
    ArticleDocument, CommentDocument, DocumentKind, GroupDocument, MirrorError, PostDocument,
    SearchMirror,
};

/// Connection settings for [`HttpSearchMirror`].
#[derive(Debug, Clone)]
pub struct HttpMirrorConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub index_prefix: String,
    pub request_timeout: Duration,
}

impl Default for HttpMirrorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:7700".to_string(),
            api_key: None,
            index_prefix: String::new(),
            request_timeout: Duration::from_secs(5),
        }
    }
}

/// Upserts documents with `POST /indexes/{index}/documents` and removes them
/// with `DELETE /indexes/{index}/documents/{id}`.
pub struct HttpSearchMirror {
    config: HttpMirrorConfig,
    http_client: reqwest::Client,
}

impl HttpSearchMirror {
    /// Fails when the HTTP client cannot be built, e.g. no usable TLS backend.
    pub fn new(config: HttpMirrorConfig) -> Result<Self, MirrorError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent("community-store/0.1")
            .build()
            .map_err(|e| MirrorError::Transport(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn documents_url(&self, kind: DocumentKind) -> String {
        format!(
            "{}/indexes/{}{}/documents",
            self.config.base_url.trim_end_matches('/'),
            self.config.index_prefix,
            kind.index_name()
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) if !key.is_empty() => request.bearer_auth(key),
            _ => request,
        }
    }

    async fn upsert<T: Serialize + Sync>(
        &self,
        kind: DocumentKind,
        doc: &T,
    ) -> Result<(), MirrorError> {
        let request = self
            .http_client
            .post(self.documents_url(kind))
            .json(&[doc]);

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| MirrorError::Transport(e.to_string()))?;

        check_status(response, false).await
    }
}

async fn check_status(response: reqwest::Response, allow_missing: bool) -> Result<(), MirrorError> {
    let status = response.status();
    if status.is_success() || (allow_missing && status == StatusCode::NOT_FOUND) {
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    Err(MirrorError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl SearchMirror for HttpSearchMirror {
    async fn index_article(&self, doc: &ArticleDocument) -> Result<(), MirrorError> {
        self.upsert(DocumentKind::Article, doc).await
    }

    async fn index_group(&self, doc: &GroupDocument) -> Result<(), MirrorError> {
        self.upsert(DocumentKind::Group, doc).await
    }

    async fn index_post(&self, doc: &PostDocument) -> Result<(), MirrorError> {
        self.upsert(DocumentKind::Post, doc).await
    }

    async fn index_comment(&self, doc: &CommentDocument) -> Result<(), MirrorError> {
        self.upsert(DocumentKind::Comment, doc).await
    }

    async fn delete(&self, kind: DocumentKind, id: i64) -> Result<(), MirrorError> {
        let url = format!("{}/{}", self.documents_url(kind), id);
        let response = self
            .authorize(self.http_client.delete(url))
            .send()
            .await
            .map_err(|e| MirrorError::Transport(e.to_string()))?;

        // Already gone counts as deleted.
        check_status(response, true).await
    }
}
