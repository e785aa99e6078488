//! Set difference by natural key.
//!
//! [`diff_by_key`] is storage-agnostic: it partitions the persisted rows and
//! the declared rows of one collection into what to create, what to update
//! in place and what to delete. Applying the result is the caller's job.

use std::collections::HashMap;
use std::hash::Hash;

use indexmap::IndexMap;

/// Outcome of comparing persisted rows `C` with declared rows `D`.
#[derive(Debug, Clone, PartialEq)]
pub struct SetDiff<C, D> {
    /// Declared rows with no persisted counterpart, in declaration order.
    pub to_create: Vec<D>,
    /// Persisted rows paired with their declaration, in declaration order.
    pub to_update: Vec<(C, D)>,
    /// Persisted rows that are no longer declared, in persisted order.
    pub to_delete: Vec<C>,
}

impl<C, D> SetDiff<C, D> {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }
}

/// Partitions `current` and `desired` by natural key.
///
/// - key only in `desired`: create
/// - key only in `current`: delete
/// - key in both: update, pairing the first persisted row with the declaration
///
/// Extra persisted rows sharing a key are deleted, so the first one wins.
/// Repeated keys in `desired` keep the first declaration; manifests are
/// validated against duplicates before they get here.
pub fn diff_by_key<C, D, K, FC, FD>(
    current: Vec<C>,
    desired: Vec<D>,
    key_current: FC,
    key_desired: FD,
) -> SetDiff<C, D>
where
    K: Eq + Hash,
    FC: Fn(&C) -> K,
    FD: Fn(&D) -> K,
{
    let mut declared: IndexMap<K, D> = IndexMap::with_capacity(desired.len());
    for row in desired {
        declared.entry(key_desired(&row)).or_insert(row);
    }

    let mut matched: HashMap<K, C> = HashMap::new();
    let mut to_delete = Vec::new();
    for row in current {
        let key = key_current(&row);
        if declared.contains_key(&key) && !matched.contains_key(&key) {
            matched.insert(key, row);
        } else {
            to_delete.push(row);
        }
    }

    let mut to_create = Vec::new();
    let mut to_update = Vec::new();
    for (key, row) in declared {
        match matched.remove(&key) {
            Some(existing) => to_update.push((existing, row)),
            None => to_create.push(row),
        }
    }

    SetDiff {
        to_create,
        to_update,
        to_delete,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: u32,
        name: &'static str,
        url: &'static str,
    }

    fn row(id: u32, name: &'static str, url: &'static str) -> Row {
        Row { id, name, url }
    }

    fn by_name(rows: Vec<Row>, desired: Vec<(&'static str, &'static str)>) -> SetDiff<Row, (&'static str, &'static str)> {
        diff_by_key(rows, desired, |r| r.name, |d| d.0)
    }

    #[test]
    fn test_partitions_by_key() {
        let current = vec![
            row(1, "hook1", "oldUrl.com"),
            row(2, "shouldGetDeleted", "test.com"),
            row(3, "hook", "old.com"),
        ];
        let desired = vec![("hook", "https://test.com/hook"), ("hook2", "https://test.com/hook2")];

        let diff = by_name(current, desired);

        assert_eq!(diff.to_create, vec![("hook2", "https://test.com/hook2")]);
        assert_eq!(
            diff.to_update,
            vec![(row(3, "hook", "old.com"), ("hook", "https://test.com/hook"))]
        );
        assert_eq!(
            diff.to_delete,
            vec![row(1, "hook1", "oldUrl.com"), row(2, "shouldGetDeleted", "test.com")]
        );
    }

    #[test]
    fn test_empty_current_creates_everything() {
        let diff = by_name(vec![], vec![("a", "x"), ("b", "y")]);
        assert_eq!(diff.to_create.len(), 2);
        assert!(diff.to_update.is_empty());
        assert!(diff.to_delete.is_empty());
    }

    #[test]
    fn test_empty_desired_deletes_everything() {
        let diff = by_name(vec![row(1, "a", "x"), row(2, "b", "y")], vec![]);
        assert_eq!(diff.to_delete.len(), 2);
        assert!(diff.to_create.is_empty());
    }

    #[test]
    fn test_identical_sets_only_update() {
        let diff = by_name(vec![row(1, "a", "x")], vec![("a", "x")]);
        assert_eq!(diff.to_update.len(), 1);
        assert!(diff.to_create.is_empty() && diff.to_delete.is_empty());
        assert!(!diff.is_empty());
    }

    #[test]
    fn test_persisted_duplicates_keep_first() {
        let current = vec![row(1, "a", "x"), row(2, "a", "y"), row(3, "b", "z")];
        let diff = by_name(current, vec![("a", "new")]);

        assert_eq!(diff.to_update[0].0.id, 1);
        let deleted: Vec<u32> = diff.to_delete.iter().map(|r| r.id).collect();
        assert_eq!(deleted, vec![2, 3]);
    }

    #[test]
    fn test_declared_duplicates_keep_first() {
        let diff = by_name(vec![], vec![("a", "first"), ("a", "second")]);
        assert_eq!(diff.to_create, vec![("a", "first")]);
    }

    #[test]
    fn test_composite_keys() {
        let current = vec![("order", "detail", "test"), ("should", "get", "viewOrder")];
        let desired = vec![("order", "detail", "viewOrder"), ("product", "list", "doStuffWithProducts")];

        let diff = diff_by_key(current, desired, |c| *c, |d| *d);

        assert_eq!(diff.to_create.len(), 2);
        assert_eq!(diff.to_delete.len(), 2);
        assert!(diff.to_update.is_empty());
    }
}
