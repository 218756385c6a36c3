//! Hibernation records and per-validator miss runs.

use strata_primitives::{Address, BlockHeight, ADDRESS_LEN};

use crate::error::{StoreError, StoreResult};
use crate::keys;
use crate::ledger::LedgerStore;
use crate::records::{Hibernate, MissRun};

impl LedgerStore {
    pub fn hibernate(&self, addr: &Address, committed: bool) -> StoreResult<Option<Hibernate>> {
        self.get_json(&keys::hibernate(addr), committed)
    }

    pub fn set_hibernate(&mut self, addr: &Address, hibernate: &Hibernate) -> StoreResult<()> {
        self.set_json(keys::hibernate(addr), hibernate)
    }

    pub fn remove_hibernate(&mut self, addr: &Address) {
        self.remove(keys::hibernate(addr));
    }

    pub fn is_hibernating(&self, addr: &Address, committed: bool) -> StoreResult<bool> {
        self.contains(&keys::hibernate(addr), committed)
    }

    pub fn hibernates(&self, committed: bool) -> StoreResult<Vec<(Address, Hibernate)>> {
        self.iterate(keys::HIBERNATE, false, committed)?
            .into_iter()
            .map(|(key, value)| {
                let addr = keys::address_after(&key, keys::HIBERNATE.len())
                    .ok_or_else(|| StoreError::corrupt(&key, "truncated address"))?;
                let record = serde_json::from_slice(&value).map_err(|e| StoreError::corrupt(&key, e))?;
                Ok((addr, record))
            })
            .collect()
    }

    // ── Miss runs ───────────────────────────────────────────────────────

    /// Every stored run, ordered by validator then start height.
    pub fn miss_runs(&self, committed: bool) -> StoreResult<Vec<MissRun>> {
        decode_runs(self.iterate(keys::MISS_RUN, false, committed)?)
    }

    /// Runs of one validator, ordered by start height.
    pub fn miss_runs_of(&self, addr: &Address, committed: bool) -> StoreResult<Vec<MissRun>> {
        decode_runs(self.iterate(&keys::miss_run_prefix(addr), false, committed)?)
    }

    pub fn set_miss_run(&mut self, run: &MissRun) -> StoreResult<()> {
        self.set_json(keys::miss_run(&run.validator, run.start), &run.length)
    }

    pub fn remove_miss_run(&mut self, addr: &Address, start: BlockHeight) {
        self.remove(keys::miss_run(addr, start));
    }
}

fn decode_runs(entries: Vec<(Vec<u8>, Vec<u8>)>) -> StoreResult<Vec<MissRun>> {
    let start_offset = keys::MISS_RUN.len() + ADDRESS_LEN;
    entries
        .into_iter()
        .map(|(key, value)| {
            let validator = keys::address_after(&key, keys::MISS_RUN.len())
                .ok_or_else(|| StoreError::corrupt(&key, "truncated address"))?;
            let start = keys::u64_at(&key, start_offset)
                .ok_or_else(|| StoreError::corrupt(&key, "truncated height"))?;
            let length = serde_json::from_slice(&value).map_err(|e| StoreError::corrupt(&key, e))?;
            Ok(MissRun {
                validator,
                start,
                length,
            })
        })
        .collect()
}
