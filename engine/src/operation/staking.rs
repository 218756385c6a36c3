//! Stake, withdraw, delegate and retract.

use serde::{Deserialize, Serialize};
use strata_primitives::crypto::address_from_pubkey;
use strata_primitives::{Address, Currency, Event, PubKey, ResultCode};
use strata_store::{Delegate, LedgerStore, Stake};

use super::{credit, debit, require_balance, require_positive, TxContext};
use crate::error::TxResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeParam {
    /// Consensus public key of the validator node.
    pub validator: PubKey,
    pub amount: Currency,
}

impl StakeParam {
    pub fn check(&self, ctx: &TxContext<'_>, store: &LedgerStore) -> TxResult<()> {
        require_positive(self.amount)?;
        if !self
            .amount
            .checked_rem(ctx.params.minimum_staking_unit)?
            .is_zero()
        {
            return Err(ResultCode::InvalidAmount.into());
        }
        require_balance(ctx, store, &ctx.sender, self.amount)?;

        if let Some(stake) = store.stake(&ctx.sender, ctx.committed)? {
            if stake.validator != self.validator {
                return Err(ResultCode::PermissionDenied.into());
            }
            stake.amount.checked_add(self.amount)?;
        }
        let validator_addr = address_from_pubkey(&self.validator);
        if let Some(holder) = store.holder_by_validator_address(&validator_addr, ctx.committed)? {
            if holder != ctx.sender {
                return Err(ResultCode::PermissionDenied.into());
            }
        }
        if store.delegate(&ctx.sender, ctx.committed)?.is_some() {
            return Err(ResultCode::DelegateExists.into());
        }
        store.projected_effective_stake(&ctx.sender, self.amount, ctx.committed)?;
        Ok(())
    }

    pub fn execute(&self, ctx: &TxContext<'_>, store: &mut LedgerStore) -> TxResult<Vec<Event>> {
        self.check(ctx, store)?;

        let amount = match store.stake(&ctx.sender, false)? {
            Some(stake) => stake.amount.checked_add(self.amount)?,
            None => self.amount,
        };
        debit(store, &ctx.sender, self.amount)?;
        store.set_stake(
            &ctx.sender,
            &Stake {
                validator: self.validator,
                amount,
                lockup_height: ctx.height.saturating_add(ctx.params.lockup_period),
            },
        )?;
        Ok(vec![Event::new("stake")
            .attr("holder", ctx.sender)
            .attr("validator", self.validator)
            .attr("amount", self.amount)])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawParam {
    pub amount: Currency,
}

impl WithdrawParam {
    pub fn check(&self, ctx: &TxContext<'_>, store: &LedgerStore) -> TxResult<()> {
        let stake = store
            .stake(&ctx.sender, ctx.committed)?
            .ok_or(ResultCode::NoStake)?;
        require_positive(self.amount)?;
        if self.amount > stake.amount {
            return Err(ResultCode::InvalidAmount.into());
        }
        if ctx.height < stake.lockup_height {
            return Err(ResultCode::StakeLocked.into());
        }
        if self.amount == stake.amount {
            if store.has_delegators(&ctx.sender, ctx.committed)? {
                return Err(ResultCode::DelegateExists.into());
            }
            if store.stake_holder_count(ctx.committed)? <= 1 {
                return Err(ResultCode::LastValidator.into());
            }
        }
        store.balance(&ctx.sender, ctx.committed)?.checked_add(self.amount)?;
        Ok(())
    }

    pub fn execute(&self, ctx: &TxContext<'_>, store: &mut LedgerStore) -> TxResult<Vec<Event>> {
        self.check(ctx, store)?;

        let mut stake = store.stake(&ctx.sender, false)?.ok_or(ResultCode::NoStake)?;
        stake.amount = stake.amount.checked_sub(self.amount)?;
        store.set_stake(&ctx.sender, &stake)?;
        credit(store, &ctx.sender, self.amount)?;
        Ok(vec![Event::new("withdraw")
            .attr("holder", ctx.sender)
            .attr("amount", self.amount)])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateParam {
    /// Holder receiving the delegation.
    pub to: Address,
    pub amount: Currency,
}

impl DelegateParam {
    pub fn check(&self, ctx: &TxContext<'_>, store: &LedgerStore) -> TxResult<()> {
        if ctx.sender == self.to {
            return Err(ResultCode::SelfTransaction.into());
        }
        require_positive(self.amount)?;
        match store.stake(&self.to, ctx.committed)? {
            Some(stake) if !stake.amount.is_zero() => {}
            _ => return Err(ResultCode::NoStake.into()),
        }
        if let Some(delegate) = store.delegate(&ctx.sender, ctx.committed)? {
            if delegate.delegatee != self.to {
                return Err(ResultCode::MultipleDelegates.into());
            }
            delegate.amount.checked_add(self.amount)?;
        }
        if store.stake(&ctx.sender, ctx.committed)?.is_some() {
            return Err(ResultCode::PermissionDenied.into());
        }
        require_balance(ctx, store, &ctx.sender, self.amount)?;
        store.projected_effective_stake(&self.to, self.amount, ctx.committed)?;
        Ok(())
    }

    pub fn execute(&self, ctx: &TxContext<'_>, store: &mut LedgerStore) -> TxResult<Vec<Event>> {
        self.check(ctx, store)?;

        let amount = match store.delegate(&ctx.sender, false)? {
            Some(delegate) => delegate.amount.checked_add(self.amount)?,
            None => self.amount,
        };
        debit(store, &ctx.sender, self.amount)?;
        store.set_delegate(
            &ctx.sender,
            &Delegate {
                delegatee: self.to,
                amount,
            },
        )?;
        Ok(vec![Event::new("delegate")
            .attr("delegator", ctx.sender)
            .attr("holder", self.to)
            .attr("amount", self.amount)])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetractParam {
    pub amount: Currency,
}

impl RetractParam {
    pub fn check(&self, ctx: &TxContext<'_>, store: &LedgerStore) -> TxResult<()> {
        let delegate = store
            .delegate(&ctx.sender, ctx.committed)?
            .ok_or(ResultCode::DelegateNotFound)?;
        require_positive(self.amount)?;
        if self.amount > delegate.amount {
            return Err(ResultCode::InvalidAmount.into());
        }
        store.balance(&ctx.sender, ctx.committed)?.checked_add(self.amount)?;
        Ok(())
    }

    pub fn execute(&self, ctx: &TxContext<'_>, store: &mut LedgerStore) -> TxResult<Vec<Event>> {
        self.check(ctx, store)?;

        let mut delegate = store
            .delegate(&ctx.sender, false)?
            .ok_or(ResultCode::DelegateNotFound)?;
        delegate.amount = delegate.amount.checked_sub(self.amount)?;
        let holder = delegate.delegatee;
        store.set_delegate(&ctx.sender, &delegate)?;
        credit(store, &ctx.sender, self.amount)?;
        Ok(vec![Event::new("retract")
            .attr("delegator", ctx.sender)
            .attr("holder", holder)
            .attr("amount", self.amount)])
    }
}
