//! Ordered re-assembly of bulk-fetched records.
//!
//! Stores answer "fetch by id set" queries in whatever order they like.
//! Callers asked for a specific sequence, so the results are put back into
//! that sequence here, independent of the entity type.

use std::collections::HashMap;
use std::hash::Hash;

/// Return `items` in the order given by `keys`.
///
/// Keys with no matching item are dropped, items whose key was not
/// requested are ignored, and a key repeated in `keys` yields its item once
/// per occurrence.
pub fn reorder_by_keys<K, T, F>(keys: &[K], items: Vec<T>, key_fn: F) -> Vec<T>
where
    K: Eq + Hash,
    T: Clone,
    F: Fn(&T) -> K,
{
    let mut by_key: HashMap<K, T> = HashMap::with_capacity(items.len());
    for item in items {
        by_key.insert(key_fn(&item), item);
    }

    keys.iter()
        .filter_map(|key| by_key.get(key).cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: i64,
        name: &'static str,
    }

    fn row(id: i64, name: &'static str) -> Row {
        Row { id, name }
    }

    #[test]
    fn test_restores_requested_order() {
        let fetched = vec![row(3, "c"), row(1, "a"), row(2, "b")];
        let ordered = reorder_by_keys(&[2, 3, 1], fetched, |r| r.id);
        assert_eq!(ordered, vec![row(2, "b"), row(3, "c"), row(1, "a")]);
    }

    #[test]
    fn test_drops_unresolved_keys() {
        let fetched = vec![row(1, "a")];
        let ordered = reorder_by_keys(&[9, 1, 8], fetched, |r| r.id);
        assert_eq!(ordered, vec![row(1, "a")]);
    }

    #[test]
    fn test_ignores_unrequested_items() {
        let fetched = vec![row(1, "a"), row(5, "e")];
        let ordered = reorder_by_keys(&[1], fetched, |r| r.id);
        assert_eq!(ordered, vec![row(1, "a")]);
    }

    #[test]
    fn test_repeated_keys() {
        let fetched = vec![row(1, "a")];
        let ordered = reorder_by_keys(&[1, 1], fetched, |r| r.id);
        assert_eq!(ordered.len(), 2);
    }

    #[test]
    fn test_empty_keys() {
        let ordered = reorder_by_keys::<i64, Row, _>(&[], vec![row(1, "a")], |r| r.id);
        assert!(ordered.is_empty());
    }
}
