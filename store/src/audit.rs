//! Incentive and penalty audit records.
//!
//! Each payout is written twice, under `<kind>:<height><addr>` and
//! `<kind>_addr:<addr><height>`, so it can be listed by height or by
//! address. Several payouts to the same address at the same height are
//! accumulated into one record.

use strata_primitives::{Address, BlockHeight, Currency};

use crate::error::{StoreError, StoreResult};
use crate::keys;
use crate::ledger::LedgerStore;
use crate::records::DistributionRecord;

/// Which audit trail a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditKind {
    Incentive,
    Penalty,
}

impl AuditKind {
    fn by_height(self, height: BlockHeight, addr: &Address) -> Vec<u8> {
        match self {
            AuditKind::Incentive => keys::incentive(height, addr),
            AuditKind::Penalty => keys::penalty(height, addr),
        }
    }

    fn by_addr(self, addr: &Address, height: BlockHeight) -> Vec<u8> {
        match self {
            AuditKind::Incentive => keys::incentive_by_addr(addr, height),
            AuditKind::Penalty => keys::penalty_by_addr(addr, height),
        }
    }

    fn height_prefix(self, height: BlockHeight) -> Vec<u8> {
        match self {
            AuditKind::Incentive => keys::incentive_prefix(height),
            AuditKind::Penalty => keys::penalty_prefix(height),
        }
    }

    fn addr_prefix(self, addr: &Address) -> Vec<u8> {
        match self {
            AuditKind::Incentive => keys::incentive_by_addr_prefix(addr),
            AuditKind::Penalty => keys::penalty_by_addr_prefix(addr),
        }
    }
}

impl LedgerStore {
    /// Add `amount` to the `kind` record of `addr` at `height`.
    pub fn record_distribution(
        &mut self,
        kind: AuditKind,
        height: BlockHeight,
        addr: &Address,
        amount: Currency,
    ) -> StoreResult<()> {
        if amount.is_zero() {
            return Ok(());
        }
        let key = kind.by_height(height, addr);
        let prev: Currency = self.get_json(&key, false)?.unwrap_or(Currency::ZERO);
        let total = prev.checked_add(amount).unwrap_or(Currency::MAX);
        self.set_json(key, &total)?;
        self.set_json(kind.by_addr(addr, height), &total)
    }

    /// Records written at `height`, in address order.
    pub fn distributions_at(
        &self,
        kind: AuditKind,
        height: BlockHeight,
        committed: bool,
    ) -> StoreResult<Vec<DistributionRecord>> {
        let prefix = kind.height_prefix(height);
        self.iterate(&prefix, false, committed)?
            .into_iter()
            .map(|(key, value)| {
                let address = keys::address_after(&key, prefix.len())
                    .ok_or_else(|| StoreError::corrupt(&key, "truncated address"))?;
                let amount = serde_json::from_slice(&value).map_err(|e| StoreError::corrupt(&key, e))?;
                Ok(DistributionRecord {
                    height,
                    address,
                    amount,
                })
            })
            .collect()
    }

    /// Records for `addr`, in height order.
    pub fn distributions_of(
        &self,
        kind: AuditKind,
        addr: &Address,
        committed: bool,
    ) -> StoreResult<Vec<DistributionRecord>> {
        let prefix = kind.addr_prefix(addr);
        self.iterate(&prefix, false, committed)?
            .into_iter()
            .map(|(key, value)| {
                let height = keys::u64_at(&key, prefix.len())
                    .ok_or_else(|| StoreError::corrupt(&key, "truncated height"))?;
                let amount = serde_json::from_slice(&value).map_err(|e| StoreError::corrupt(&key, e))?;
                Ok(DistributionRecord {
                    height,
                    address: *addr,
                    amount,
                })
            })
            .collect()
    }
}
