//! Value transfer in the native coin or a user-defined currency.

use serde::{Deserialize, Serialize};
use strata_primitives::{Address, Currency, Event, ResultCode};
use strata_store::LedgerStore;

use super::{credit, debit, require_balance, require_credit, require_positive, TxContext};
use crate::error::TxResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferParam {
    pub to: Address,
    pub amount: Currency,
    /// Move UDC `udc` instead of the native coin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub udc: Option<u32>,
}

impl TransferParam {
    pub fn check(&self, ctx: &TxContext<'_>, store: &LedgerStore) -> TxResult<()> {
        if ctx.sender == self.to {
            return Err(ResultCode::SelfTransaction.into());
        }
        require_positive(self.amount)?;

        match self.udc {
            None => {
                require_balance(ctx, store, &ctx.sender, self.amount)?;
                require_credit(ctx, store, &self.to, self.amount)
            }
            Some(id) => {
                if store.udc(id, ctx.committed)?.is_none() {
                    return Err(ResultCode::UdcNotFound.into());
                }
                let remaining = store
                    .udc_balance(id, &ctx.sender, ctx.committed)?
                    .checked_sub(self.amount)?;
                if remaining < store.udc_lock(id, &ctx.sender, ctx.committed)? {
                    return Err(ResultCode::NotEnoughBalance.into());
                }
                store
                    .udc_balance(id, &self.to, ctx.committed)?
                    .checked_add(self.amount)?;
                Ok(())
            }
        }
    }

    pub fn execute(&self, ctx: &TxContext<'_>, store: &mut LedgerStore) -> TxResult<Vec<Event>> {
        self.check(ctx, store)?;

        let mut event = Event::new("transfer")
            .attr("sender", ctx.sender)
            .attr("recipient", self.to)
            .attr("amount", self.amount);

        match self.udc {
            None => {
                debit(store, &ctx.sender, self.amount)?;
                credit(store, &self.to, self.amount)?;
            }
            Some(id) => {
                let from = store.udc_balance(id, &ctx.sender, false)?.checked_sub(self.amount)?;
                store.set_udc_balance(id, &ctx.sender, from)?;
                let to = store.udc_balance(id, &self.to, false)?.checked_add(self.amount)?;
                store.set_udc_balance(id, &self.to, to)?;
                event = event.attr("udc", id);
            }
        }
        Ok(vec![event])
    }
}
