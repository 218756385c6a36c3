//! Active validator set selection.
//!
//! At EndBlock the top `max_validators` holders by effective stake become
//! the set, leaving out hibernating holders and holders without a live
//! stake. Voting power is effective stake in units of
//! `minimum_staking_unit`. The result is diffed against the stored set and
//! only changes are handed to consensus; power 0 removes a validator.

use std::collections::BTreeMap;

use strata_primitives::PubKey;
use strata_store::{keys, LedgerStore, StoreResult, ValidatorEntry};

use crate::error::BlockResult;
use crate::params::ChainParams;

/// The set consensus currently runs with.
pub fn stored_set(store: &LedgerStore, committed: bool) -> StoreResult<Vec<ValidatorEntry>> {
    Ok(store
        .get_json(keys::META_VALSET, committed)?
        .unwrap_or_default())
}

fn store_set(store: &mut LedgerStore, set: &[ValidatorEntry]) -> StoreResult<()> {
    store.set_json(keys::META_VALSET.to_vec(), &set)
}

/// Select the validator set from the working state.
pub fn compute_set(store: &LedgerStore, params: &ChainParams) -> BlockResult<Vec<ValidatorEntry>> {
    let limit = params.max_validators as usize;
    let mut set = Vec::new();
    for (holder, effective) in store.effective_stakes_desc(false)? {
        if set.len() >= limit {
            break;
        }
        if store.is_hibernating(&holder, false)? {
            continue;
        }
        let Some(stake) = store.stake(&holder, false)? else {
            continue;
        };
        let units = effective
            .checked_div(params.minimum_staking_unit)?
            .saturating_to_u64();
        let power = i64::try_from(units).unwrap_or(i64::MAX);
        if power == 0 {
            continue;
        }
        set.push(ValidatorEntry {
            pub_key: stake.validator,
            power,
        });
    }
    Ok(set)
}

/// Store `compute_set` as the initial set and return it in full.
pub fn init_set(store: &mut LedgerStore, params: &ChainParams) -> BlockResult<Vec<ValidatorEntry>> {
    let mut set = compute_set(store, params)?;
    set.sort_by(|a, b| a.pub_key.cmp(&b.pub_key));
    store_set(store, &set)?;
    Ok(set)
}

/// Recompute the set and return the updates against the stored one, ordered
/// by public key. An empty selection keeps the previous set.
pub fn update_set(store: &mut LedgerStore, params: &ChainParams) -> BlockResult<Vec<ValidatorEntry>> {
    let next = compute_set(store, params)?;
    if next.is_empty() {
        tracing::warn!("no eligible validators; keeping the previous set");
        return Ok(Vec::new());
    }

    let prev: BTreeMap<PubKey, i64> = stored_set(store, false)?
        .into_iter()
        .map(|v| (v.pub_key, v.power))
        .collect();
    let next_map: BTreeMap<PubKey, i64> = next.iter().map(|v| (v.pub_key, v.power)).collect();

    let mut updates: BTreeMap<PubKey, i64> = BTreeMap::new();
    for (key, power) in &next_map {
        if prev.get(key) != Some(power) {
            updates.insert(*key, *power);
        }
    }
    for key in prev.keys() {
        if !next_map.contains_key(key) {
            updates.insert(*key, 0);
        }
    }

    if !updates.is_empty() {
        let stored: Vec<ValidatorEntry> = next_map
            .into_iter()
            .map(|(pub_key, power)| ValidatorEntry { pub_key, power })
            .collect();
        store_set(store, &stored)?;
        tracing::info!(size = stored.len(), changes = updates.len(), "validator set changed");
    }
    Ok(updates
        .into_iter()
        .map(|(pub_key, power)| ValidatorEntry { pub_key, power })
        .collect())
}
