//! Uncommitted write buffer for the ledger.
//!
//! The overlay buffers every write made during a block and makes it visible
//! to subsequent uncommitted reads. `LedgerStore::commit` drains it into the
//! backend as one atomic batch; `LedgerStore::discard` clears it.

use std::collections::BTreeMap;
use std::ops::Bound;

use crate::backend::WriteBatch;
use crate::mem::prefix_upper_bound;

/// Buffered writes overlaying committed state.
///
/// Uses `BTreeMap` for deterministic iteration order.
#[derive(Debug, Clone, Default)]
pub struct StateOverlay {
    /// Buffered writes: key → Some(value) for sets, key → None for deletions.
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

/// Result of looking up a key in the overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayResult {
    /// Key was found in the overlay with this value.
    Found(Vec<u8>),
    /// Key was explicitly deleted in this overlay.
    Deleted,
    /// Key is not in the overlay: caller must check committed state.
    NotInOverlay,
}

impl StateOverlay {
    pub fn new() -> Self {
        Self {
            writes: BTreeMap::new(),
        }
    }

    /// Set a key-value pair, replacing any earlier set or delete.
    pub fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.writes.insert(key, Some(value));
    }

    /// Mark a key as deleted.
    ///
    /// Subsequent reads for this key return `Deleted` rather than
    /// falling through to committed state.
    pub fn delete(&mut self, key: Vec<u8>) {
        self.writes.insert(key, None);
    }

    pub fn get(&self, key: &[u8]) -> OverlayResult {
        match self.writes.get(key) {
            Some(Some(value)) => OverlayResult::Found(value.clone()),
            Some(None) => OverlayResult::Deleted,
            None => OverlayResult::NotInOverlay,
        }
    }

    /// Returns true if the overlay has any entry (set or delete) for this key.
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.writes.contains_key(key)
    }

    /// Buffered entries (sets and tombstones) whose key starts with `prefix`,
    /// in ascending key order.
    pub fn range_prefix<'a>(
        &'a self,
        prefix: &[u8],
    ) -> impl Iterator<Item = (&'a Vec<u8>, &'a Option<Vec<u8>>)> + 'a {
        let upper = match prefix_upper_bound(prefix) {
            Some(end) => Bound::Excluded(end),
            None => Bound::Unbounded,
        };
        self.writes
            .range::<Vec<u8>, _>((Bound::Included(prefix.to_vec()), upper))
    }

    /// Consume the buffered writes as a backend batch, leaving the overlay empty.
    pub fn take_batch(&mut self) -> WriteBatch {
        WriteBatch::from(std::mem::take(&mut self.writes))
    }

    pub fn clear(&mut self) {
        self.writes.clear();
    }

    /// Number of keys touched (set or deleted).
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_set_and_get() {
        let mut overlay = StateOverlay::new();
        overlay.set(b"key1".to_vec(), b"value1".to_vec());
        assert_eq!(
            overlay.get(b"key1"),
            OverlayResult::Found(b"value1".to_vec())
        );
        assert_eq!(overlay.get(b"missing"), OverlayResult::NotInOverlay);
    }

    #[test]
    fn test_overlay_delete_then_set() {
        let mut overlay = StateOverlay::new();
        overlay.delete(b"key1".to_vec());
        assert_eq!(overlay.get(b"key1"), OverlayResult::Deleted);
        assert!(overlay.contains_key(b"key1"));

        overlay.set(b"key1".to_vec(), b"new_value".to_vec());
        assert_eq!(
            overlay.get(b"key1"),
            OverlayResult::Found(b"new_value".to_vec())
        );
        assert_eq!(overlay.len(), 1);
    }

    #[test]
    fn test_overlay_range_prefix_includes_tombstones() {
        let mut overlay = StateOverlay::new();
        overlay.set(b"b:2".to_vec(), b"2".to_vec());
        overlay.delete(b"b:1".to_vec());
        overlay.set(b"c:1".to_vec(), b"x".to_vec());
        overlay.set(b"a:1".to_vec(), b"x".to_vec());

        let hits: Vec<(Vec<u8>, Option<Vec<u8>>)> = overlay
            .range_prefix(b"b:")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        assert_eq!(
            hits,
            vec![
                (b"b:1".to_vec(), None),
                (b"b:2".to_vec(), Some(b"2".to_vec())),
            ]
        );
    }

    #[test]
    fn test_overlay_take_batch_empties() {
        let mut overlay = StateOverlay::new();
        overlay.set(b"c".to_vec(), b"3".to_vec());
        overlay.set(b"a".to_vec(), b"1".to_vec());
        overlay.delete(b"d".to_vec());

        let batch = overlay.take_batch();
        assert!(overlay.is_empty());
        let keys: Vec<Vec<u8>> = batch.into_ops().into_keys().collect();
        assert_eq!(keys, vec![b"a".to_vec(), b"c".to_vec(), b"d".to_vec()]);
    }

    #[test]
    fn test_overlay_clear() {
        let mut overlay = StateOverlay::new();
        overlay.set(b"key1".to_vec(), b"value1".to_vec());
        overlay.clear();
        assert!(overlay.is_empty());
    }
}
