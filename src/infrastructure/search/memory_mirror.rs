//! In-process search mirror.
//!
//! Keeps the last document received per (kind, id) as JSON. Failure
//! injection lets tests exercise the backlog path.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;

use crate::domain::search::{
    ArticleDocument, CommentDocument, DocumentKind, GroupDocument, MirrorError, PostDocument,
    SearchMirror,
};

#[derive(Default)]
pub struct InMemorySearchMirror {
    documents: DashMap<(DocumentKind, String), serde_json::Value>,
    failing: AtomicBool,
    upserts: AtomicU64,
}

impl InMemorySearchMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn contains(&self, kind: DocumentKind, id: i64) -> bool {
        self.documents.contains_key(&(kind, id.to_string()))
    }

    pub fn get(&self, kind: DocumentKind, id: i64) -> Option<serde_json::Value> {
        self.documents
            .get(&(kind, id.to_string()))
            .map(|entry| entry.value().clone())
    }

    pub fn count(&self, kind: DocumentKind) -> usize {
        self.documents.iter().filter(|e| e.key().0 == kind).count()
    }

    /// Successful upserts since creation.
    pub fn upserts(&self) -> u64 {
        self.upserts.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), MirrorError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MirrorError::Unavailable("mirror offline".to_string()));
        }
        Ok(())
    }

    fn put<T: Serialize>(&self, kind: DocumentKind, id: &str, doc: &T) -> Result<(), MirrorError> {
        self.check()?;
        let value = serde_json::to_value(doc).map_err(|e| MirrorError::Transport(e.to_string()))?;
        self.documents.insert((kind, id.to_string()), value);
        self.upserts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl SearchMirror for InMemorySearchMirror {
    async fn index_article(&self, doc: &ArticleDocument) -> Result<(), MirrorError> {
        self.put(DocumentKind::Article, &doc.id, doc)
    }

    async fn index_group(&self, doc: &GroupDocument) -> Result<(), MirrorError> {
        self.put(DocumentKind::Group, &doc.id, doc)
    }

    async fn index_post(&self, doc: &PostDocument) -> Result<(), MirrorError> {
        self.put(DocumentKind::Post, &doc.id, doc)
    }

    async fn index_comment(&self, doc: &CommentDocument) -> Result<(), MirrorError> {
        self.put(DocumentKind::Comment, &doc.id, doc)
    }

    async fn delete(&self, kind: DocumentKind, id: i64) -> Result<(), MirrorError> {
        self.check()?;
        self.documents.remove(&(kind, id.to_string()));
        Ok(())
    }
}
