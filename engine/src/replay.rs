//! Replay prevention over a sliding window of heights.
//!
//! Hashes delivered in the current block sit in an in-memory bucket until
//! EndBlock flushes them into the persisted `blocktx`/`txblock` index. The
//! index only keeps the last `index_range` heights; replay outside the
//! window is not prevented.

use std::collections::BTreeSet;

use strata_primitives::{BlockHeight, Hash, ResultCode};
use strata_store::{LedgerStore, StoreResult};

use crate::error::TxResult;

#[derive(Debug, Clone)]
pub struct ReplayPreventer {
    from_height: BlockHeight,
    to_height: BlockHeight,
    index_range: u64,
    bucket: BTreeSet<Hash>,
}

impl ReplayPreventer {
    pub fn new(index_range: u64) -> Self {
        Self {
            from_height: 1,
            to_height: 0,
            index_range,
            bucket: BTreeSet::new(),
        }
    }

    /// Slide the window to end at `height`. Called at BeginBlock.
    pub fn update(&mut self, height: BlockHeight) {
        self.to_height = height;
        self.from_height = window_start(height, self.index_range);
        self.bucket.clear();
    }

    pub fn from_height(&self) -> BlockHeight {
        self.from_height
    }

    pub fn to_height(&self) -> BlockHeight {
        self.to_height
    }

    /// Hashes appended in the current block.
    pub fn pending(&self) -> usize {
        self.bucket.len()
    }

    /// `Replayed` if `hash` was delivered within the window.
    pub fn check(&self, hash: &Hash, store: &LedgerStore, committed: bool) -> TxResult<()> {
        if self.bucket.contains(hash) {
            return Err(ResultCode::Replayed.into());
        }
        match store.tx_height(hash, committed)? {
            Some(height) if height >= self.from_height => Err(ResultCode::Replayed.into()),
            _ => Ok(()),
        }
    }

    /// `Replayed` if the committed index holds `hash` inside the window of a
    /// block at `height`. The block in progress is not consulted.
    pub fn check_committed(
        &self,
        hash: &Hash,
        store: &LedgerStore,
        height: BlockHeight,
    ) -> TxResult<()> {
        match store.tx_height(hash, true)? {
            Some(at) if at >= window_start(height, self.index_range) => {
                Err(ResultCode::Replayed.into())
            }
            _ => Ok(()),
        }
    }

    /// Accept `hash` into the current block.
    pub fn append(&mut self, hash: Hash, store: &LedgerStore) -> TxResult<()> {
        self.check(&hash, store, false)?;
        self.bucket.insert(hash);
        Ok(())
    }

    /// Persist the bucket at `to_height` and prune heights that left the
    /// window. Called at EndBlock.
    pub fn index(&mut self, store: &mut LedgerStore) -> StoreResult<()> {
        let hashes: Vec<Hash> = std::mem::take(&mut self.bucket).into_iter().collect();
        store.index_block_txs(self.to_height, &hashes)?;

        let mut pruned = 0;
        while let Some(oldest) = store.oldest_indexed_height()? {
            if oldest >= self.from_height {
                break;
            }
            pruned += store.remove_block_txs(oldest)?;
        }
        tracing::debug!(
            height = self.to_height,
            indexed = hashes.len(),
            pruned,
            "replay index updated"
        );
        Ok(())
    }
}

/// First height of the `range`-height window ending at `height`.
fn window_start(height: BlockHeight, range: u64) -> BlockHeight {
    (height + 1).saturating_sub(range).max(1)
}
