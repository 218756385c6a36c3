//! Physical storage abstraction for the ledger.
//!
//! `KvBackend` is the ordered byte-key store underneath [`LedgerStore`]:
//! it holds only committed data. The ledger layers a `StateOverlay` (the
//! uncommitted view) on top and flushes it through [`KvBackend::write_batch`]
//! on commit.
//!
//! Implementations:
//! - `MemBackend` (this crate): in-memory BTreeMap
//! - any persistent engine that preserves lexicographic key order
//!
//! [`LedgerStore`]: crate::ledger::LedgerStore

use std::collections::BTreeMap;

use crate::error::StoreResult;

/// Atomic set of writes: `Some(value)` for sets, `None` for deletions.
///
/// Keys are kept sorted so a batch is applied in a deterministic order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.ops.insert(key, Some(value));
    }

    pub fn delete(&mut self, key: Vec<u8>) {
        self.ops.insert(key, None);
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn into_ops(self) -> BTreeMap<Vec<u8>, Option<Vec<u8>>> {
        self.ops
    }
}

impl From<BTreeMap<Vec<u8>, Option<Vec<u8>>>> for WriteBatch {
    fn from(ops: BTreeMap<Vec<u8>, Option<Vec<u8>>>) -> Self {
        Self { ops }
    }
}

/// Ordered byte-key store holding committed ledger data.
///
/// Implementations must be deterministic: identical batch histories
/// produce identical contents and identical iteration order.
pub trait KvBackend: Send + Sync {
    /// Get the committed value for a key. `Ok(None)` if absent.
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// All entries whose key starts with `prefix`, in ascending key order,
    /// or descending when `reverse` is set.
    fn scan_prefix(&self, prefix: &[u8], reverse: bool) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Apply every operation in `batch` atomically.
    fn write_batch(&mut self, batch: WriteBatch) -> StoreResult<()>;

    /// Remove every key.
    fn clear(&mut self) -> StoreResult<()>;

    /// Check if a key exists.
    ///
    /// Default implementation uses `get()`, but backends may optimize this.
    fn contains(&self, key: &[u8]) -> StoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}
