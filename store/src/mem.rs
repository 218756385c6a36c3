//! In-memory backend.
//!
//! `MemBackend` implements `KvBackend` with a `BTreeMap`, which gives the
//! lexicographic key order the ledger's prefix iteration depends on.

use std::collections::BTreeMap;
use std::ops::Bound;

use crate::backend::{KvBackend, WriteBatch};
use crate::error::StoreResult;

/// In-memory backend backed by `BTreeMap`.
#[derive(Debug, Clone, Default)]
pub struct MemBackend {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
        }
    }

    /// Create a backend pre-populated with data.
    pub fn with_data(data: BTreeMap<Vec<u8>, Vec<u8>>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Smallest key strictly greater than every key starting with `prefix`,
/// or `None` when no such key exists (prefix is empty or all `0xFF`).
pub(crate) fn prefix_upper_bound(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < 0xFF {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

impl KvBackend for MemBackend {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.data.get(key).cloned())
    }

    fn scan_prefix(&self, prefix: &[u8], reverse: bool) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let upper = match prefix_upper_bound(prefix) {
            Some(end) => Bound::Excluded(end),
            None => Bound::Unbounded,
        };
        let range = self
            .data
            .range::<Vec<u8>, _>((Bound::Included(prefix.to_vec()), upper))
            .map(|(k, v)| (k.clone(), v.clone()));
        Ok(if reverse { range.rev().collect() } else { range.collect() })
    }

    fn write_batch(&mut self, batch: WriteBatch) -> StoreResult<()> {
        for (key, value) in batch.into_ops() {
            match value {
                Some(v) => {
                    self.data.insert(key, v);
                }
                None => {
                    self.data.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn clear(&mut self) -> StoreResult<()> {
        self.data.clear();
        Ok(())
    }

    fn contains(&self, key: &[u8]) -> StoreResult<bool> {
        Ok(self.data.contains_key(key))
    }
}
