//! Operation catalog.
//!
//! Every operation implements the same two-step contract:
//!
//! - `check(ctx, store)`: read-only precondition validation against the
//!   view selected by `ctx.committed`
//! - `execute(ctx, store)`: runs `check` first and returns its rejection
//!   untouched, then mutates the uncommitted view and returns events
//!
//! Checks never interleave with mutations, so a rejected execute leaves no
//! trace in the store.

mod parcel;
mod staking;
mod transfer;
mod udc;

pub use parcel::{
    sweep_expired, total_escrow, CancelParam, DiscardParam, GrantParam, RegisterParam, RequestParam,
    RevokeParam,
};
pub use staking::{DelegateParam, RetractParam, StakeParam, WithdrawParam};
pub use transfer::TransferParam;
pub use udc::{BurnParam, IssueParam, LockParam};

use serde::de::DeserializeOwned;
use strata_primitives::{Address, BlockHeight, Currency, Event, ResultCode};
use strata_store::LedgerStore;

use crate::error::TxResult;
use crate::params::ChainParams;

/// Per-transaction execution context.
#[derive(Debug, Clone, Copy)]
pub struct TxContext<'a> {
    pub sender: Address,
    /// Height used for lockups and expiries.
    pub height: BlockHeight,
    /// Read the committed view (CheckTx) instead of the working view.
    pub committed: bool,
    pub params: &'a ChainParams,
}

/// Wire names of every operation type.
pub const TRANSFER: &str = "transfer";
pub const STAKE: &str = "stake";
pub const WITHDRAW: &str = "withdraw";
pub const DELEGATE: &str = "delegate";
pub const RETRACT: &str = "retract";
pub const REGISTER: &str = "register";
pub const REQUEST: &str = "request";
pub const CANCEL: &str = "cancel";
pub const GRANT: &str = "grant";
pub const REVOKE: &str = "revoke";
pub const DISCARD: &str = "discard";
pub const ISSUE: &str = "issue";
pub const LOCK: &str = "lock";
pub const BURN: &str = "burn";

/// A typed operation decoded from an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Transfer(TransferParam),
    Stake(StakeParam),
    Withdraw(WithdrawParam),
    Delegate(DelegateParam),
    Retract(RetractParam),
    Register(RegisterParam),
    Request(RequestParam),
    Cancel(CancelParam),
    Grant(GrantParam),
    Revoke(RevokeParam),
    Discard(DiscardParam),
    Issue(IssueParam),
    Lock(LockParam),
    Burn(BurnParam),
}

impl Operation {
    /// Decode `payload` for the operation named `tx_type`.
    ///
    /// An unrecognized type is `Unknown`; a payload that does not fit the
    /// type is `BadParam`.
    pub fn parse(tx_type: &str, payload: &serde_json::Value) -> Result<Self, ResultCode> {
        let op = match tx_type {
            TRANSFER => Operation::Transfer(decode(payload)?),
            STAKE => Operation::Stake(decode(payload)?),
            WITHDRAW => Operation::Withdraw(decode(payload)?),
            DELEGATE => Operation::Delegate(decode(payload)?),
            RETRACT => Operation::Retract(decode(payload)?),
            REGISTER => Operation::Register(decode(payload)?),
            REQUEST => Operation::Request(decode(payload)?),
            CANCEL => Operation::Cancel(decode(payload)?),
            GRANT => Operation::Grant(decode(payload)?),
            REVOKE => Operation::Revoke(decode(payload)?),
            DISCARD => Operation::Discard(decode(payload)?),
            ISSUE => Operation::Issue(decode(payload)?),
            LOCK => Operation::Lock(decode(payload)?),
            BURN => Operation::Burn(decode(payload)?),
            _ => return Err(ResultCode::Unknown),
        };
        Ok(op)
    }

    /// Wire name of this operation.
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Transfer(_) => TRANSFER,
            Operation::Stake(_) => STAKE,
            Operation::Withdraw(_) => WITHDRAW,
            Operation::Delegate(_) => DELEGATE,
            Operation::Retract(_) => RETRACT,
            Operation::Register(_) => REGISTER,
            Operation::Request(_) => REQUEST,
            Operation::Cancel(_) => CANCEL,
            Operation::Grant(_) => GRANT,
            Operation::Revoke(_) => REVOKE,
            Operation::Discard(_) => DISCARD,
            Operation::Issue(_) => ISSUE,
            Operation::Lock(_) => LOCK,
            Operation::Burn(_) => BURN,
        }
    }

    /// Whether the operation touches user-defined currencies.
    pub fn uses_udc(&self) -> bool {
        match self {
            Operation::Issue(_) | Operation::Lock(_) | Operation::Burn(_) => true,
            Operation::Transfer(p) => p.udc.is_some(),
            _ => false,
        }
    }

    pub fn check(&self, ctx: &TxContext<'_>, store: &LedgerStore) -> TxResult<()> {
        match self {
            Operation::Transfer(p) => p.check(ctx, store),
            Operation::Stake(p) => p.check(ctx, store),
            Operation::Withdraw(p) => p.check(ctx, store),
            Operation::Delegate(p) => p.check(ctx, store),
            Operation::Retract(p) => p.check(ctx, store),
            Operation::Register(p) => p.check(ctx, store),
            Operation::Request(p) => p.check(ctx, store),
            Operation::Cancel(p) => p.check(ctx, store),
            Operation::Grant(p) => p.check(ctx, store),
            Operation::Revoke(p) => p.check(ctx, store),
            Operation::Discard(p) => p.check(ctx, store),
            Operation::Issue(p) => p.check(ctx, store),
            Operation::Lock(p) => p.check(ctx, store),
            Operation::Burn(p) => p.check(ctx, store),
        }
    }

    pub fn execute(&self, ctx: &TxContext<'_>, store: &mut LedgerStore) -> TxResult<Vec<Event>> {
        match self {
            Operation::Transfer(p) => p.execute(ctx, store),
            Operation::Stake(p) => p.execute(ctx, store),
            Operation::Withdraw(p) => p.execute(ctx, store),
            Operation::Delegate(p) => p.execute(ctx, store),
            Operation::Retract(p) => p.execute(ctx, store),
            Operation::Register(p) => p.execute(ctx, store),
            Operation::Request(p) => p.execute(ctx, store),
            Operation::Cancel(p) => p.execute(ctx, store),
            Operation::Grant(p) => p.execute(ctx, store),
            Operation::Revoke(p) => p.execute(ctx, store),
            Operation::Discard(p) => p.execute(ctx, store),
            Operation::Issue(p) => p.execute(ctx, store),
            Operation::Lock(p) => p.execute(ctx, store),
            Operation::Burn(p) => p.execute(ctx, store),
        }
    }
}

fn decode<T: DeserializeOwned>(payload: &serde_json::Value) -> Result<T, ResultCode> {
    T::deserialize(payload).map_err(|e| {
        tracing::debug!(error = %e, "malformed operation payload");
        ResultCode::BadParam
    })
}

/// Reject a zero amount.
fn require_positive(amount: Currency) -> TxResult<()> {
    if amount.is_zero() {
        Err(ResultCode::InvalidAmount.into())
    } else {
        Ok(())
    }
}

/// Reject an empty parcel id.
fn require_target(target: &[u8]) -> TxResult<()> {
    if target.is_empty() {
        Err(ResultCode::BadParam.into())
    } else {
        Ok(())
    }
}

/// `balance(addr) >= amount` in the context's view.
fn require_balance(ctx: &TxContext<'_>, store: &LedgerStore, addr: &Address, amount: Currency) -> TxResult<()> {
    store.balance(addr, ctx.committed)?.checked_sub(amount)?;
    Ok(())
}

/// `balance(addr) + amount` stays within the currency bound.
fn require_credit(ctx: &TxContext<'_>, store: &LedgerStore, addr: &Address, amount: Currency) -> TxResult<()> {
    store.balance(addr, ctx.committed)?.checked_add(amount)?;
    Ok(())
}

pub(crate) fn credit(store: &mut LedgerStore, addr: &Address, amount: Currency) -> TxResult<()> {
    let balance = store.balance(addr, false)?.checked_add(amount)?;
    store.set_balance(addr, balance)?;
    Ok(())
}

pub(crate) fn debit(store: &mut LedgerStore, addr: &Address, amount: Currency) -> TxResult<()> {
    let balance = store.balance(addr, false)?.checked_sub(amount)?;
    store.set_balance(addr, balance)?;
    Ok(())
}
