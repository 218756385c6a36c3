//! User-defined currencies: issue, lock and burn.
//!
//! Ids are claimed first come, first served: there is no issuer registry,
//! so any account may create an unused id and becomes its owner. From then
//! on the owner is the issuer. Later issues need the owner or an operator,
//! only the owner may replace the operator list or the description, and an
//! outsider issuing into a claimed id is `PermissionDenied`.

use serde::{Deserialize, Serialize};
use strata_primitives::{Address, Currency, Event, ResultCode};
use strata_store::{LedgerStore, Udc};

use super::{require_positive, TxContext};
use crate::error::TxResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueParam {
    pub udc: u32,
    /// Replacement operator list; `None` keeps the current one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operators: Option<Vec<Address>>,
    #[serde(default)]
    pub desc: String,
    pub amount: Currency,
}

impl IssueParam {
    pub fn check(&self, ctx: &TxContext<'_>, store: &LedgerStore) -> TxResult<()> {
        require_positive(self.amount)?;
        if let Some(udc) = store.udc(self.udc, ctx.committed)? {
            if !udc.can_manage(&ctx.sender) {
                return Err(ResultCode::PermissionDenied.into());
            }
            if self.operators.is_some() && udc.owner != ctx.sender {
                return Err(ResultCode::PermissionDenied.into());
            }
            udc.total_supply.checked_add(self.amount)?;
        }
        store
            .udc_balance(self.udc, &ctx.sender, ctx.committed)?
            .checked_add(self.amount)?;
        Ok(())
    }

    pub fn execute(&self, ctx: &TxContext<'_>, store: &mut LedgerStore) -> TxResult<Vec<Event>> {
        self.check(ctx, store)?;

        let udc = match store.udc(self.udc, false)? {
            Some(mut udc) => {
                udc.total_supply = udc.total_supply.checked_add(self.amount)?;
                if let Some(operators) = &self.operators {
                    udc.operators = operators.clone();
                }
                if !self.desc.is_empty() && udc.owner == ctx.sender {
                    udc.description = self.desc.clone();
                }
                udc
            }
            None => Udc {
                owner: ctx.sender,
                operators: self.operators.clone().unwrap_or_default(),
                description: self.desc.clone(),
                total_supply: self.amount,
            },
        };
        store.set_udc(self.udc, &udc)?;
        let balance = store
            .udc_balance(self.udc, &ctx.sender, false)?
            .checked_add(self.amount)?;
        store.set_udc_balance(self.udc, &ctx.sender, balance)?;

        Ok(vec![Event::new("issue")
            .attr("udc", self.udc)
            .attr("issuer", ctx.sender)
            .attr("amount", self.amount)
            .attr("total_supply", udc.total_supply)])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockParam {
    pub udc: u32,
    pub holder: Address,
    /// New lock floor; zero releases the lock.
    pub amount: Currency,
}

impl LockParam {
    pub fn check(&self, ctx: &TxContext<'_>, store: &LedgerStore) -> TxResult<()> {
        let udc = store
            .udc(self.udc, ctx.committed)?
            .ok_or(ResultCode::UdcNotFound)?;
        if !udc.can_manage(&ctx.sender) {
            return Err(ResultCode::PermissionDenied.into());
        }
        Ok(())
    }

    pub fn execute(&self, ctx: &TxContext<'_>, store: &mut LedgerStore) -> TxResult<Vec<Event>> {
        self.check(ctx, store)?;

        store.set_udc_lock(self.udc, &self.holder, self.amount)?;
        Ok(vec![Event::new("lock")
            .attr("udc", self.udc)
            .attr("holder", self.holder)
            .attr("amount", self.amount)])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnParam {
    pub udc: u32,
    pub amount: Currency,
}

impl BurnParam {
    pub fn check(&self, ctx: &TxContext<'_>, store: &LedgerStore) -> TxResult<()> {
        let udc = store
            .udc(self.udc, ctx.committed)?
            .ok_or(ResultCode::UdcNotFound)?;
        require_positive(self.amount)?;
        let remaining = store
            .udc_balance(self.udc, &ctx.sender, ctx.committed)?
            .checked_sub(self.amount)?;
        if remaining < store.udc_lock(self.udc, &ctx.sender, ctx.committed)? {
            return Err(ResultCode::NotEnoughBalance.into());
        }
        udc.total_supply.checked_sub(self.amount)?;
        Ok(())
    }

    pub fn execute(&self, ctx: &TxContext<'_>, store: &mut LedgerStore) -> TxResult<Vec<Event>> {
        self.check(ctx, store)?;

        let mut udc = store
            .udc(self.udc, false)?
            .ok_or(ResultCode::UdcNotFound)?;
        udc.total_supply = udc.total_supply.checked_sub(self.amount)?;
        store.set_udc(self.udc, &udc)?;
        let balance = store
            .udc_balance(self.udc, &ctx.sender, false)?
            .checked_sub(self.amount)?;
        store.set_udc_balance(self.udc, &ctx.sender, balance)?;

        Ok(vec![Event::new("burn")
            .attr("udc", self.udc)
            .attr("holder", ctx.sender)
            .attr("amount", self.amount)
            .attr("total_supply", udc.total_supply)])
    }
}
