//! In-memory primary store.
//!
//! Implements every repository trait over process-local collections guarded
//! by a single `RwLock`. Multi-record operations (comment creation, vote
//! transitions) run inside one write-lock critical section, so they are as
//! atomic here as the transactional Postgres adapter.
//!
//! Used by the test suite and selectable with `store.backend = "memory"`.

mod articles;
mod community;
mod discussions;
mod ledger;

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;

use crate::domain::entities::{Article, Channel, Comment, Discussion, Group, Message, Post, Vote};
use crate::domain::search::DocumentKind;

#[derive(Default)]
struct Collections {
    articles: BTreeMap<i64, Article>,
    groups: BTreeMap<i64, Group>,
    posts: BTreeMap<i64, Post>,
    comments: BTreeMap<i64, Comment>,
    /// Keyed by (user_id, post_id).
    post_votes: HashMap<(i64, i64), Vote>,
    /// Keyed by (user_id, comment_id).
    comment_votes: HashMap<(i64, i64), Vote>,
    discussions: BTreeMap<i64, Discussion>,
    channels: BTreeMap<i64, Channel>,
    messages: BTreeMap<i64, Message>,
    attempts: AttemptLog,
}

/// Stand-in for the `sync_attempted_at` column: a logical clock stamped on
/// rows each time a sweep picks them up.
#[derive(Default)]
struct AttemptLog {
    clock: u64,
    stamps: HashMap<(DocumentKind, i64), u64>,
}

impl AttemptLog {
    fn stamp(&mut self, kind: DocumentKind, ids: &[i64]) {
        self.clock += 1;
        for id in ids {
            self.stamps.insert((kind, *id), self.clock);
        }
    }

    /// Never-attempted rows first, then least recently attempted, then by id.
    fn backlog<'a, T: 'a + Clone>(
        &self,
        kind: DocumentKind,
        rows: impl Iterator<Item = (&'a i64, &'a T)>,
        limit: i64,
    ) -> Vec<T> {
        let mut pending: Vec<_> = rows
            .map(|(id, row)| {
                let stamp = self.stamps.get(&(kind, *id)).copied().unwrap_or(0);
                ((stamp, *id), row)
            })
            .collect();
        pending.sort_by_key(|(key, _)| *key);
        paginate(pending.into_iter().map(|(_, row)| row.clone()), limit, 0)
    }
}

/// Process-local store implementing all repository traits.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Collections>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Apply LIMIT/OFFSET semantics to an already ordered list.
fn paginate<T>(items: impl IntoIterator<Item = T>, limit: i64, offset: i64) -> Vec<T> {
    items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

/// Rows matching `ids`, in store order.
fn pick<T: Clone>(rows: &BTreeMap<i64, T>, ids: &[i64]) -> Vec<T> {
    ids.iter()
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .filter_map(|id| rows.get(id).cloned())
        .collect()
}
