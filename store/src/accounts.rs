//! Native balances and user-defined currencies.
//!
//! Accounts are implicit: an absent balance reads as zero, and writing a
//! zero balance removes the key.

use strata_primitives::{Address, Currency};

use crate::error::{StoreError, StoreResult};
use crate::keys;
use crate::ledger::LedgerStore;
use crate::records::Udc;

impl LedgerStore {
    pub fn balance(&self, addr: &Address, committed: bool) -> StoreResult<Currency> {
        Ok(self
            .get_json(&keys::balance(addr), committed)?
            .unwrap_or(Currency::ZERO))
    }

    pub fn set_balance(&mut self, addr: &Address, amount: Currency) -> StoreResult<()> {
        set_or_remove(self, keys::balance(addr), amount)
    }

    /// Every non-zero balance in address order.
    pub fn balances(&self, committed: bool) -> StoreResult<Vec<(Address, Currency)>> {
        self.iterate(keys::BALANCE, false, committed)?
            .into_iter()
            .map(|(key, value)| {
                let addr = keys::address_after(&key, keys::BALANCE.len())
                    .ok_or_else(|| StoreError::corrupt(&key, "truncated address"))?;
                let amount = decode_currency(&key, &value)?;
                Ok((addr, amount))
            })
            .collect()
    }

    // ── UDC ─────────────────────────────────────────────────────────────

    pub fn udc(&self, id: u32, committed: bool) -> StoreResult<Option<Udc>> {
        self.get_json(&keys::udc(id), committed)
    }

    pub fn set_udc(&mut self, id: u32, udc: &Udc) -> StoreResult<()> {
        self.set_json(keys::udc(id), udc)
    }

    pub fn udc_balance(&self, id: u32, holder: &Address, committed: bool) -> StoreResult<Currency> {
        Ok(self
            .get_json(&keys::udc_balance(id, holder), committed)?
            .unwrap_or(Currency::ZERO))
    }

    pub fn set_udc_balance(&mut self, id: u32, holder: &Address, amount: Currency) -> StoreResult<()> {
        set_or_remove(self, keys::udc_balance(id, holder), amount)
    }

    /// Every holder of UDC `id` with a non-zero balance.
    pub fn udc_holders(&self, id: u32, committed: bool) -> StoreResult<Vec<(Address, Currency)>> {
        let prefix = keys::udc_balance_prefix(id);
        self.iterate(&prefix, false, committed)?
            .into_iter()
            .map(|(key, value)| {
                let addr = keys::address_after(&key, prefix.len())
                    .ok_or_else(|| StoreError::corrupt(&key, "truncated address"))?;
                Ok((addr, decode_currency(&key, &value)?))
            })
            .collect()
    }

    /// Minimum balance `holder` must keep in UDC `id`.
    pub fn udc_lock(&self, id: u32, holder: &Address, committed: bool) -> StoreResult<Currency> {
        Ok(self
            .get_json(&keys::udc_lock(id, holder), committed)?
            .unwrap_or(Currency::ZERO))
    }

    pub fn set_udc_lock(&mut self, id: u32, holder: &Address, amount: Currency) -> StoreResult<()> {
        set_or_remove(self, keys::udc_lock(id, holder), amount)
    }
}

fn set_or_remove(store: &mut LedgerStore, key: Vec<u8>, amount: Currency) -> StoreResult<()> {
    if amount.is_zero() {
        store.remove(key);
        Ok(())
    } else {
        store.set_json(key, &amount)
    }
}

fn decode_currency(key: &[u8], value: &[u8]) -> StoreResult<Currency> {
    serde_json::from_slice(value).map_err(|e| StoreError::corrupt(key, e))
}
