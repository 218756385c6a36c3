//! Versioned ledger store.
//!
//! `LedgerStore` pairs a committed `KvBackend` with an uncommitted
//! `StateOverlay`:
//!
//! - `get(key, false)` / `iterate(.., false)` see overlay then backend
//! - `get(key, true)` / `iterate(.., true)` see the backend only
//! - `commit()` flushes the overlay as one batch, advances the version and
//!   records the new state root
//!
//! Commit is the only place the version counter moves.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use strata_primitives::merkle::compute_root;
use strata_primitives::{Hash, ZERO_HASH};

use crate::backend::KvBackend;
use crate::error::{StoreError, StoreResult};
use crate::mem::MemBackend;
use crate::overlay::{OverlayResult, StateOverlay};

/// Ordered key-value ledger with a committed snapshot and an uncommitted
/// working view.
pub struct LedgerStore {
    backend: Box<dyn KvBackend>,
    overlay: StateOverlay,
    version: u64,
    /// State root recorded at each committed version.
    roots: BTreeMap<u64, Hash>,
}

impl LedgerStore {
    /// Wrap an existing backend. Version starts at 0 with the root of the
    /// backend's current contents.
    pub fn new(backend: Box<dyn KvBackend>) -> StoreResult<Self> {
        let mut store = Self {
            backend,
            overlay: StateOverlay::new(),
            version: 0,
            roots: BTreeMap::new(),
        };
        let root = store.compute_committed_root()?;
        store.roots.insert(0, root);
        Ok(store)
    }

    /// An empty in-memory ledger.
    pub fn in_memory() -> Self {
        Self {
            backend: Box::new(MemBackend::new()),
            overlay: StateOverlay::new(),
            version: 0,
            roots: BTreeMap::from([(0, ZERO_HASH)]),
        }
    }

    // ── Reads ───────────────────────────────────────────────────────────

    pub fn get(&self, key: &[u8], committed: bool) -> StoreResult<Option<Vec<u8>>> {
        if !committed {
            match self.overlay.get(key) {
                OverlayResult::Found(value) => return Ok(Some(value)),
                OverlayResult::Deleted => return Ok(None),
                OverlayResult::NotInOverlay => {}
            }
        }
        self.backend.get(key)
    }

    pub fn contains(&self, key: &[u8], committed: bool) -> StoreResult<bool> {
        if !committed {
            match self.overlay.get(key) {
                OverlayResult::Found(_) => return Ok(true),
                OverlayResult::Deleted => return Ok(false),
                OverlayResult::NotInOverlay => {}
            }
        }
        self.backend.contains(key)
    }

    /// All live entries under `prefix` in key order (descending when
    /// `reverse`). Uncommitted iteration merges the overlay over the backend
    /// and drops tombstoned keys.
    pub fn iterate(
        &self,
        prefix: &[u8],
        reverse: bool,
        committed: bool,
    ) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        if committed || self.overlay.is_empty() {
            return self.backend.scan_prefix(prefix, reverse);
        }

        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.backend.scan_prefix(prefix, false)?.into_iter().collect();
        for (key, value) in self.overlay.range_prefix(prefix) {
            match value {
                Some(v) => {
                    merged.insert(key.clone(), v.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        Ok(if reverse {
            merged.into_iter().rev().collect()
        } else {
            merged.into_iter().collect()
        })
    }

    /// Decode the JSON value stored at `key`.
    pub fn get_json<T: DeserializeOwned>(&self, key: &[u8], committed: bool) -> StoreResult<Option<T>> {
        match self.get(key, committed)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| StoreError::corrupt(key, e)),
            None => Ok(None),
        }
    }

    // ── Writes ──────────────────────────────────────────────────────────

    pub fn set(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.overlay.set(key.into(), value.into());
    }

    pub fn remove(&mut self, key: impl Into<Vec<u8>>) {
        self.overlay.delete(key.into());
    }

    /// Encode `value` as JSON and write it at `key`.
    pub fn set_json<T: Serialize>(&mut self, key: impl Into<Vec<u8>>, value: &T) -> StoreResult<()> {
        let bytes = serde_json::to_vec(value).map_err(|e| StoreError::Encode(e.to_string()))?;
        self.set(key, bytes);
        Ok(())
    }

    // ── Versioning ──────────────────────────────────────────────────────

    /// Flush every uncommitted write to the backend, advance the version and
    /// return `(version, state_root)`.
    pub fn commit(&mut self) -> StoreResult<(u64, Hash)> {
        let batch = self.overlay.take_batch();
        let writes = batch.len();
        self.backend.write_batch(batch)?;
        self.version += 1;
        let root = self.compute_committed_root()?;
        self.roots.insert(self.version, root);
        tracing::debug!(
            version = self.version,
            writes,
            root = %hex_root(&root),
            "ledger committed"
        );
        Ok((self.version, root))
    }

    /// Drop every uncommitted write.
    pub fn discard(&mut self) {
        self.overlay.clear();
    }

    /// Clear every key, committed and uncommitted, and reset the version
    /// history.
    pub fn purge(&mut self) -> StoreResult<()> {
        self.backend.clear()?;
        self.overlay.clear();
        self.version = 0;
        self.roots.clear();
        self.roots.insert(0, ZERO_HASH);
        Ok(())
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Root of the latest committed version.
    pub fn root_hash(&self) -> Hash {
        self.roots.get(&self.version).copied().unwrap_or(ZERO_HASH)
    }

    /// Root recorded for a past committed version.
    pub fn root_at(&self, version: u64) -> Option<Hash> {
        self.roots.get(&version).copied()
    }

    /// Number of keys touched since the last commit.
    pub fn pending_writes(&self) -> usize {
        self.overlay.len()
    }

    fn compute_committed_root(&self) -> StoreResult<Hash> {
        let entries = self.backend.scan_prefix(&[], false)?;
        Ok(compute_root(
            entries.iter().map(|(k, v)| (k.as_slice(), v.as_slice())),
        ))
    }
}

impl Default for LedgerStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl std::fmt::Debug for LedgerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerStore")
            .field("version", &self.version)
            .field("pending_writes", &self.overlay.len())
            .finish()
    }
}

fn hex_root(root: &Hash) -> String {
    strata_primitives::types::hash_to_hex(root)
}
