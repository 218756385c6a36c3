//! Stakes, delegates and the effective-stake ranking index.
//!
//! Writing a stake or a delegate keeps three derived indexes in step:
//!
//! - `valaddr:<consensus address>` → holder, for resolving votes
//! - `delegatee:<holder><delegator>`, listing a holder's delegators
//! - `effstake:<amount BE><holder>` plus `effstake_of:<holder>`, ranking
//!   holders by effective stake
//!
//! A holder without a live stake always has effective stake zero, even if
//! delegates still point at it.

use strata_primitives::crypto::address_from_pubkey;
use strata_primitives::{Address, Currency};

use crate::error::{StoreError, StoreResult};
use crate::keys;
use crate::ledger::LedgerStore;
use crate::records::{Delegate, Stake};

impl LedgerStore {
    // ── Stake ───────────────────────────────────────────────────────────

    pub fn stake(&self, holder: &Address, committed: bool) -> StoreResult<Option<Stake>> {
        self.get_json(&keys::stake(holder), committed)
    }

    /// Write `holder`'s stake. A zero amount deletes it.
    pub fn set_stake(&mut self, holder: &Address, stake: &Stake) -> StoreResult<()> {
        if let Some(prev) = self.stake(holder, false)? {
            if prev.validator != stake.validator || stake.amount.is_zero() {
                self.remove(keys::valaddr(&address_from_pubkey(&prev.validator)));
            }
        }
        if stake.amount.is_zero() {
            self.remove(keys::stake(holder));
        } else {
            self.set_json(keys::stake(holder), stake)?;
            let validator_addr = address_from_pubkey(&stake.validator);
            self.set(keys::valaddr(&validator_addr), holder.as_bytes().to_vec());
        }
        self.refresh_effective_stake(holder)?;
        Ok(())
    }

    pub fn remove_stake(&mut self, holder: &Address) -> StoreResult<()> {
        if let Some(mut stake) = self.stake(holder, false)? {
            stake.amount = Currency::ZERO;
            self.set_stake(holder, &stake)?;
        }
        Ok(())
    }

    /// Every stake in holder order.
    pub fn stakes(&self, committed: bool) -> StoreResult<Vec<(Address, Stake)>> {
        self.iterate(keys::STAKE, false, committed)?
            .into_iter()
            .map(|(key, value)| {
                let holder = keys::address_after(&key, keys::STAKE.len())
                    .ok_or_else(|| StoreError::corrupt(&key, "truncated address"))?;
                let stake = serde_json::from_slice(&value).map_err(|e| StoreError::corrupt(&key, e))?;
                Ok((holder, stake))
            })
            .collect()
    }

    pub fn stake_holder_count(&self, committed: bool) -> StoreResult<usize> {
        Ok(self.iterate(keys::STAKE, false, committed)?.len())
    }

    /// Reduce `holder`'s stake by up to `amount`, deleting it at zero.
    /// Returns the amount actually removed.
    pub fn slash_stake(&mut self, holder: &Address, amount: Currency) -> StoreResult<Currency> {
        let Some(mut stake) = self.stake(holder, false)? else {
            return Ok(Currency::ZERO);
        };
        let slashed = if amount > stake.amount { stake.amount } else { amount };
        stake.amount = stake.amount.saturating_sub(slashed);
        self.set_stake(holder, &stake)?;
        Ok(slashed)
    }

    /// Holder owning the stake whose consensus key hashes to `validator`.
    pub fn holder_by_validator_address(
        &self,
        validator: &Address,
        committed: bool,
    ) -> StoreResult<Option<Address>> {
        let key = keys::valaddr(validator);
        match self.get(&key, committed)? {
            Some(bytes) => Address::from_slice(&bytes)
                .map(Some)
                .map_err(|e| StoreError::corrupt(&key, e)),
            None => Ok(None),
        }
    }

    // ── Delegate ────────────────────────────────────────────────────────

    pub fn delegate(&self, delegator: &Address, committed: bool) -> StoreResult<Option<Delegate>> {
        self.get_json(&keys::delegate(delegator), committed)
    }

    /// Write `delegator`'s delegate. A zero amount deletes it.
    pub fn set_delegate(&mut self, delegator: &Address, delegate: &Delegate) -> StoreResult<()> {
        let prev = self.delegate(delegator, false)?;
        if let Some(prev) = &prev {
            if prev.delegatee != delegate.delegatee || delegate.amount.is_zero() {
                self.remove(keys::delegatee(&prev.delegatee, delegator));
            }
        }
        if delegate.amount.is_zero() {
            self.remove(keys::delegate(delegator));
        } else {
            self.set_json(keys::delegate(delegator), delegate)?;
            self.set(keys::delegatee(&delegate.delegatee, delegator), Vec::new());
        }
        if let Some(prev) = prev {
            if prev.delegatee != delegate.delegatee {
                self.refresh_effective_stake(&prev.delegatee)?;
            }
        }
        self.refresh_effective_stake(&delegate.delegatee)?;
        Ok(())
    }

    pub fn remove_delegate(&mut self, delegator: &Address) -> StoreResult<()> {
        if let Some(mut delegate) = self.delegate(delegator, false)? {
            delegate.amount = Currency::ZERO;
            self.set_delegate(delegator, &delegate)?;
        }
        Ok(())
    }

    /// Every delegate in delegator order.
    pub fn delegates(&self, committed: bool) -> StoreResult<Vec<(Address, Delegate)>> {
        self.iterate(keys::DELEGATE, false, committed)?
            .into_iter()
            .map(|(key, value)| {
                let delegator = keys::address_after(&key, keys::DELEGATE.len())
                    .ok_or_else(|| StoreError::corrupt(&key, "truncated address"))?;
                let delegate = serde_json::from_slice(&value).map_err(|e| StoreError::corrupt(&key, e))?;
                Ok((delegator, delegate))
            })
            .collect()
    }

    /// Delegators of `holder` with their delegate records, in delegator order.
    pub fn delegators_of(
        &self,
        holder: &Address,
        committed: bool,
    ) -> StoreResult<Vec<(Address, Delegate)>> {
        let prefix = keys::delegatee_prefix(holder);
        let mut out = Vec::new();
        for (key, _) in self.iterate(&prefix, false, committed)? {
            let delegator = keys::address_after(&key, prefix.len())
                .ok_or_else(|| StoreError::corrupt(&key, "truncated address"))?;
            let delegate = self
                .delegate(&delegator, committed)?
                .ok_or_else(|| StoreError::corrupt(&key, "dangling delegatee entry"))?;
            out.push((delegator, delegate));
        }
        Ok(out)
    }

    pub fn has_delegators(&self, holder: &Address, committed: bool) -> StoreResult<bool> {
        Ok(!self
            .iterate(&keys::delegatee_prefix(holder), false, committed)?
            .is_empty())
    }

    // ── Effective stake ─────────────────────────────────────────────────

    pub fn effective_stake(&self, holder: &Address, committed: bool) -> StoreResult<Currency> {
        Ok(self
            .get_json(&keys::effstake_of(holder), committed)?
            .unwrap_or(Currency::ZERO))
    }

    /// Recompute `holder`'s effective stake from its stake and delegates and
    /// move its ranking entry. Fails with `Arithmetic` past the currency bound.
    pub fn refresh_effective_stake(&mut self, holder: &Address) -> StoreResult<Currency> {
        let total = match self.stake(holder, false)? {
            Some(stake) => {
                let mut total = stake.amount;
                for (_, delegate) in self.delegators_of(holder, false)? {
                    total = total.checked_add(delegate.amount)?;
                }
                total
            }
            None => Currency::ZERO,
        };

        let prev = self.effective_stake(holder, false)?;
        if prev == total {
            return Ok(total);
        }
        if !prev.is_zero() {
            self.remove(keys::effstake(&prev, holder));
        }
        if total.is_zero() {
            self.remove(keys::effstake_of(holder));
        } else {
            self.set(keys::effstake(&total, holder), Vec::new());
            self.set_json(keys::effstake_of(holder), &total)?;
        }
        Ok(total)
    }

    /// What `holder`'s effective stake would become after `extra` more is
    /// staked by it or delegated to it.
    pub fn projected_effective_stake(
        &self,
        holder: &Address,
        extra: Currency,
        committed: bool,
    ) -> StoreResult<Currency> {
        let own = match self.stake(holder, committed)? {
            Some(stake) => stake.amount,
            None => Currency::ZERO,
        };
        let mut total = own.checked_add(extra)?;
        for (_, delegate) in self.delegators_of(holder, committed)? {
            total = total.checked_add(delegate.amount)?;
        }
        Ok(total)
    }

    /// Drop the ranking index and rebuild it from stakes and delegates.
    pub fn rebuild_effective_stakes(&mut self) -> StoreResult<usize> {
        for (key, _) in self.iterate(keys::EFFSTAKE, false, false)? {
            self.remove(key);
        }
        for (key, _) in self.iterate(keys::EFFSTAKE_OF, false, false)? {
            self.remove(key);
        }
        let holders: Vec<Address> = self
            .stakes(false)?
            .into_iter()
            .map(|(holder, _)| holder)
            .collect();
        for holder in &holders {
            self.refresh_effective_stake(holder)?;
        }
        Ok(holders.len())
    }

    /// Holders with non-zero effective stake, largest first.
    pub fn effective_stakes_desc(&self, committed: bool) -> StoreResult<Vec<(Address, Currency)>> {
        let amount_offset = keys::EFFSTAKE.len();
        let holder_offset = amount_offset + 32;
        self.iterate(keys::EFFSTAKE, true, committed)?
            .into_iter()
            .map(|(key, _)| {
                let amount_bytes: [u8; 32] = key
                    .get(amount_offset..holder_offset)
                    .and_then(|b| b.try_into().ok())
                    .ok_or_else(|| StoreError::corrupt(&key, "truncated amount"))?;
                let holder = keys::address_after(&key, holder_offset)
                    .ok_or_else(|| StoreError::corrupt(&key, "truncated address"))?;
                Ok((holder, Currency::from_be_bytes(&amount_bytes)))
            })
            .collect()
    }

    /// The `limit` largest effective stakes.
    pub fn top_effective_stakes(
        &self,
        limit: usize,
        committed: bool,
    ) -> StoreResult<Vec<(Address, Currency)>> {
        let mut all = self.effective_stakes_desc(committed)?;
        all.truncate(limit);
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_primitives::{PubKey, ADDRESS_LEN};

    fn addr(b: u8) -> Address {
        Address::new([b; ADDRESS_LEN])
    }

    fn stake_of(key: u8, amount: u64) -> Stake {
        Stake {
            validator: PubKey::new([key; 32]),
            amount: Currency::from_u64(amount),
            lockup_height: 0,
        }
    }

    fn delegate_to(holder: Address, amount: u64) -> Delegate {
        Delegate {
            delegatee: holder,
            amount: Currency::from_u64(amount),
        }
    }

    // ── Test: stake and validator index ──

    #[test]
    fn test_set_stake_indexes_validator_address() {
        let mut store = LedgerStore::in_memory();
        store.set_stake(&addr(1), &stake_of(9, 100)).unwrap();

        let val_addr = address_from_pubkey(&PubKey::new([9; 32]));
        assert_eq!(
            store.holder_by_validator_address(&val_addr, false).unwrap(),
            Some(addr(1))
        );
        assert_eq!(
            store.effective_stake(&addr(1), false).unwrap(),
            Currency::from_u64(100)
        );
    }

    #[test]
    fn test_zero_stake_deletes_everything() {
        let mut store = LedgerStore::in_memory();
        store.set_stake(&addr(1), &stake_of(9, 100)).unwrap();
        store.remove_stake(&addr(1)).unwrap();

        let val_addr = address_from_pubkey(&PubKey::new([9; 32]));
        assert_eq!(store.stake(&addr(1), false).unwrap(), None);
        assert_eq!(store.holder_by_validator_address(&val_addr, false).unwrap(), None);
        assert!(store.effective_stakes_desc(false).unwrap().is_empty());
        assert_eq!(store.stake_holder_count(false).unwrap(), 0);
    }

    #[test]
    fn test_slash_stake_caps_at_stake() {
        let mut store = LedgerStore::in_memory();
        store.set_stake(&addr(1), &stake_of(9, 100)).unwrap();

        let slashed = store.slash_stake(&addr(1), Currency::from_u64(30)).unwrap();
        assert_eq!(slashed, Currency::from_u64(30));
        assert_eq!(
            store.stake(&addr(1), false).unwrap().unwrap().amount,
            Currency::from_u64(70)
        );

        let slashed = store.slash_stake(&addr(1), Currency::from_u64(500)).unwrap();
        assert_eq!(slashed, Currency::from_u64(70));
        assert_eq!(store.stake(&addr(1), false).unwrap(), None);

        assert_eq!(
            store.slash_stake(&addr(2), Currency::from_u64(1)).unwrap(),
            Currency::ZERO
        );
    }

    // ── Test: delegates and effective stake ──

    #[test]
    fn test_delegate_updates_effective_stake() {
        let mut store = LedgerStore::in_memory();
        store.set_stake(&addr(1), &stake_of(9, 100)).unwrap();
        store.set_delegate(&addr(2), &delegate_to(addr(1), 50)).unwrap();
        store.set_delegate(&addr(3), &delegate_to(addr(1), 25)).unwrap();

        assert_eq!(
            store.effective_stake(&addr(1), false).unwrap(),
            Currency::from_u64(175)
        );
        let delegators: Vec<Address> = store
            .delegators_of(&addr(1), false)
            .unwrap()
            .into_iter()
            .map(|(a, _)| a)
            .collect();
        assert_eq!(delegators, vec![addr(2), addr(3)]);

        store.remove_delegate(&addr(2)).unwrap();
        assert_eq!(
            store.effective_stake(&addr(1), false).unwrap(),
            Currency::from_u64(125)
        );
        assert!(store.has_delegators(&addr(1), false).unwrap());
    }

    #[test]
    fn test_effective_stake_past_bound_fails() {
        let mut store = LedgerStore::in_memory();
        let mut top = stake_of(9, 0);
        top.amount = Currency::MAX;
        store.set_stake(&addr(1), &top).unwrap();

        let projected = store.projected_effective_stake(&addr(1), Currency::from_u64(5), false);
        assert!(matches!(projected, Err(StoreError::Arithmetic(_))));

        let err = store.set_delegate(&addr(2), &delegate_to(addr(1), 5)).unwrap_err();
        assert!(matches!(err, StoreError::Arithmetic(_)));
        assert_eq!(store.effective_stake(&addr(1), false).unwrap(), Currency::MAX);
    }

    #[test]
    fn test_orphaned_delegates_do_not_rank() {
        let mut store = LedgerStore::in_memory();
        store.set_stake(&addr(1), &stake_of(9, 100)).unwrap();
        store.set_delegate(&addr(2), &delegate_to(addr(1), 50)).unwrap();

        store.slash_stake(&addr(1), Currency::from_u64(100)).unwrap();
        assert_eq!(store.effective_stake(&addr(1), false).unwrap(), Currency::ZERO);
        assert!(store.effective_stakes_desc(false).unwrap().is_empty());
        assert!(store.has_delegators(&addr(1), false).unwrap());
    }

    #[test]
    fn test_ranking_is_descending() {
        let mut store = LedgerStore::in_memory();
        store.set_stake(&addr(1), &stake_of(1, 100)).unwrap();
        store.set_stake(&addr(2), &stake_of(2, 300)).unwrap();
        store.set_stake(&addr(3), &stake_of(3, 200)).unwrap();

        let ranked = store.effective_stakes_desc(false).unwrap();
        assert_eq!(
            ranked,
            vec![
                (addr(2), Currency::from_u64(300)),
                (addr(3), Currency::from_u64(200)),
                (addr(1), Currency::from_u64(100)),
            ]
        );
        assert_eq!(store.top_effective_stakes(2, false).unwrap().len(), 2);
    }

    #[test]
    fn test_rebuild_effective_stakes_recovers_index() {
        let mut store = LedgerStore::in_memory();
        store.set_stake(&addr(1), &stake_of(1, 100)).unwrap();
        store.set_delegate(&addr(2), &delegate_to(addr(1), 10)).unwrap();
        store.commit().unwrap();

        for (key, _) in store.iterate(keys::EFFSTAKE, false, false).unwrap() {
            store.remove(key);
        }
        assert!(store.effective_stakes_desc(false).unwrap().is_empty());

        assert_eq!(store.rebuild_effective_stakes().unwrap(), 1);
        assert_eq!(
            store.effective_stakes_desc(false).unwrap(),
            vec![(addr(1), Currency::from_u64(110))]
        );
    }
}
