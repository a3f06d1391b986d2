//! Response DTOs
//!
//! Reports returned by the reconciliation and cascade operations.

use serde::Serialize;

use crate::domain::search::DocumentKind;

/// Result of one sync attempt for one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// The mirror accepted the document and the flag was set.
    Indexed,
    /// The mirror or the flag update failed; the document stays in the backlog.
    Failed,
    /// The projection could not be built (parent missing).
    Skipped,
}

/// Per-kind sweep counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindReport {
    pub attempted: u64,
    pub indexed: u64,
    pub failed: u64,
    pub skipped: u64,
}

impl KindReport {
    pub fn record(&mut self, outcome: SyncOutcome) {
        self.attempted += 1;
        match outcome {
            SyncOutcome::Indexed => self.indexed += 1,
            SyncOutcome::Failed => self.failed += 1,
            SyncOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// Outcome of one backlog sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub articles: KindReport,
    pub groups: KindReport,
    pub posts: KindReport,
    pub comments: KindReport,
}

impl SweepReport {
    pub fn kind_mut(&mut self, kind: DocumentKind) -> &mut KindReport {
        match kind {
            DocumentKind::Article => &mut self.articles,
            DocumentKind::Group => &mut self.groups,
            DocumentKind::Post => &mut self.posts,
            DocumentKind::Comment => &mut self.comments,
        }
    }

    pub fn kind(&self, kind: DocumentKind) -> &KindReport {
        match kind {
            DocumentKind::Article => &self.articles,
            DocumentKind::Group => &self.groups,
            DocumentKind::Post => &self.posts,
            DocumentKind::Comment => &self.comments,
        }
    }

    pub fn attempted(&self) -> u64 {
        DocumentKind::ALL.iter().map(|k| self.kind(*k).attempted).sum()
    }

    pub fn indexed(&self) -> u64 {
        DocumentKind::ALL.iter().map(|k| self.kind(*k).indexed).sum()
    }
}

/// Records removed by a group cascade.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub groups: u64,
    pub posts: u64,
    pub comments: u64,
    pub post_votes: u64,
    pub comment_votes: u64,
    pub discussions: u64,
    pub channels: u64,
    pub messages: u64,
}
