//! Delivered-transaction index backing replay prevention.
//!
//! `blocktx:<height>` lists the hashes delivered at a height and
//! `txblock:<hash>` points back at that height.

use strata_primitives::types::hash_to_hex;
use strata_primitives::{BlockHeight, Hash};

use crate::error::{StoreError, StoreResult};
use crate::keys;
use crate::ledger::LedgerStore;

impl LedgerStore {
    /// Height at which `hash` was delivered, if it is still indexed.
    pub fn tx_height(&self, hash: &Hash, committed: bool) -> StoreResult<Option<BlockHeight>> {
        self.get_json(&keys::tx_block(hash), committed)
    }

    pub fn block_txs(&self, height: BlockHeight, committed: bool) -> StoreResult<Vec<Hash>> {
        let key = keys::block_txs(height);
        let hexes: Vec<String> = self.get_json(&key, committed)?.unwrap_or_default();
        hexes
            .iter()
            .map(|h| {
                let bytes = hex::decode(h).map_err(|e| StoreError::corrupt(&key, e))?;
                bytes
                    .try_into()
                    .map_err(|_| StoreError::corrupt(&key, "hash is not 32 bytes"))
            })
            .collect()
    }

    /// Index `hashes` as delivered at `height`, appending to any hashes
    /// already indexed there.
    pub fn index_block_txs(&mut self, height: BlockHeight, hashes: &[Hash]) -> StoreResult<()> {
        if hashes.is_empty() {
            return Ok(());
        }
        let mut all = self.block_txs(height, false)?;
        for hash in hashes {
            if !all.contains(hash) {
                all.push(*hash);
            }
            self.set_json(keys::tx_block(hash), &height)?;
        }
        let hexes: Vec<String> = all.iter().map(hash_to_hex).collect();
        self.set_json(keys::block_txs(height), &hexes)
    }

    /// Forget every hash delivered at `height`. Returns how many were dropped.
    ///
    /// A hash re-delivered at a later height keeps its newer pointer.
    pub fn remove_block_txs(&mut self, height: BlockHeight) -> StoreResult<usize> {
        let hashes = self.block_txs(height, false)?;
        for hash in &hashes {
            if self.tx_height(hash, false)? == Some(height) {
                self.remove(keys::tx_block(hash));
            }
        }
        self.remove(keys::block_txs(height));
        Ok(hashes.len())
    }

    /// Lowest height that still has an index entry.
    pub fn oldest_indexed_height(&self) -> StoreResult<Option<BlockHeight>> {
        let entries = self.iterate(keys::BLOCK_TXS, false, false)?;
        match entries.first() {
            Some((key, _)) => keys::u64_at(key, keys::BLOCK_TXS.len())
                .map(Some)
                .ok_or_else(|| StoreError::corrupt(key, "truncated height")),
            None => Ok(None),
        }
    }
}
