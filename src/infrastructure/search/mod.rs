//! Search mirror adapters.
//!
//! - [`HttpSearchMirror`]: Meilisearch-compatible REST client
//! - [`InMemorySearchMirror`]: process-local index with failure injection
//! - [`NoopSearchMirror`]: accepts everything, used when search is disabled

mod http_mirror;
mod memory_mirror;

pub use http_mirror::{HttpMirrorConfig, HttpSearchMirror};
pub use memory_mirror::InMemorySearchMirror;

use async_trait::async_trait;

use crate::domain::search::{
    ArticleDocument, CommentDocument, DocumentKind, GroupDocument, MirrorError, PostDocument,
    SearchMirror,
};

pub struct NoopSearchMirror;

#[async_trait]
impl SearchMirror for NoopSearchMirror {
    async fn index_article(&self, _doc: &ArticleDocument) -> Result<(), MirrorError> {
        Ok(())
    }

    async fn index_group(&self, _doc: &GroupDocument) -> Result<(), MirrorError> {
        Ok(())
    }

    async fn index_post(&self, _doc: &PostDocument) -> Result<(), MirrorError> {
        Ok(())
    }

    async fn index_comment(&self, _doc: &CommentDocument) -> Result<(), MirrorError> {
        Ok(())
    }

    async fn delete(&self, _kind: DocumentKind, _id: i64) -> Result<(), MirrorError> {
        Ok(())
    }
}
