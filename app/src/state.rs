//! Persisted application state.

use serde::{Deserialize, Serialize};
use strata_primitives::{BlockHeight, Hash, ZERO_HASH};
use strata_store::{keys, LedgerStore, StoreResult};

/// Chain progress stored under `meta:state`.
///
/// The app hash is not part of the record: it is the store root after the
/// commit that wrote the record, and is restored from the store on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    /// Last committed block height; 0 before the first block.
    pub height: BlockHeight,
    pub protocol_version: u32,
    #[serde(skip)]
    pub last_app_hash: Hash,
}

impl AppState {
    pub fn genesis(protocol_version: u32) -> Self {
        Self {
            height: 0,
            protocol_version,
            last_app_hash: ZERO_HASH,
        }
    }

    /// Read the committed record, if the chain has been initialized.
    pub fn load(store: &LedgerStore) -> StoreResult<Option<Self>> {
        let state: Option<AppState> = store.get_json(keys::META_STATE, true)?;
        Ok(state.map(|s| Self {
            last_app_hash: store.root_hash(),
            ..s
        }))
    }

    /// Stage the record for the next commit.
    pub fn save(&self, store: &mut LedgerStore) -> StoreResult<()> {
        store.set_json(keys::META_STATE.to_vec(), self)
    }
}
