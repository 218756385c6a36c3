//! Data-parcel marketplace: register, request, cancel, grant, revoke and
//! discard, plus the block-end expiry sweep.
//!
//! A request escrows its payment out of the buyer's balance. The escrow goes
//! to the owner on grant and back to the buyer on cancel or expiry.

use serde::{Deserialize, Serialize};
use strata_primitives::types::hex_bytes;
use strata_primitives::{Address, BlockHeight, Currency, Event, ResultCode};
use strata_store::{LedgerStore, Parcel, Request, Usage};

use super::{credit, debit, require_balance, require_target, TxContext};
use crate::error::{BlockResult, TxResult};

fn target_hex(target: &[u8]) -> String {
    hex::encode_upper(target)
}

/// `base + period`, where a zero period means the record never lapses.
fn expiry(base: BlockHeight, period: u64) -> BlockHeight {
    if period == 0 {
        0
    } else {
        base.saturating_add(period)
    }
}

/// A usage still in force at `height`. Lapsed usages may linger until the
/// sweep removes them, or forever when the protocol never expires usages.
fn usage_is_live(usage: &Usage, height: BlockHeight) -> bool {
    usage.expire_height == 0 || usage.expire_height > height
}

fn owned_parcel(ctx: &TxContext<'_>, store: &LedgerStore, target: &[u8]) -> TxResult<Parcel> {
    require_target(target)?;
    let parcel = store
        .parcel(target, ctx.committed)?
        .ok_or(ResultCode::ParcelNotFound)?;
    if parcel.owner != ctx.sender {
        return Err(ResultCode::PermissionDenied.into());
    }
    Ok(parcel)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterParam {
    #[serde(with = "hex_bytes")]
    pub target: Vec<u8>,
    #[serde(with = "hex_bytes")]
    pub custody: Vec<u8>,
    #[serde(default)]
    pub extra: serde_json::Value,
}

impl RegisterParam {
    pub fn check(&self, ctx: &TxContext<'_>, store: &LedgerStore) -> TxResult<()> {
        require_target(&self.target)?;
        if store.parcel(&self.target, ctx.committed)?.is_some() {
            return Err(ResultCode::AlreadyRegistered.into());
        }
        Ok(())
    }

    pub fn execute(&self, ctx: &TxContext<'_>, store: &mut LedgerStore) -> TxResult<Vec<Event>> {
        self.check(ctx, store)?;

        store.set_parcel(
            &self.target,
            &Parcel {
                owner: ctx.sender,
                custody: self.custody.clone(),
                extra: self.extra.clone(),
            },
        )?;
        Ok(vec![Event::new("register")
            .attr("owner", ctx.sender)
            .attr("target", target_hex(&self.target))])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestParam {
    #[serde(with = "hex_bytes")]
    pub target: Vec<u8>,
    pub payment: Currency,
    #[serde(default)]
    pub extra: serde_json::Value,
}

impl RequestParam {
    pub fn check(&self, ctx: &TxContext<'_>, store: &LedgerStore) -> TxResult<()> {
        require_target(&self.target)?;
        let parcel = store
            .parcel(&self.target, ctx.committed)?
            .ok_or(ResultCode::ParcelNotFound)?;
        if parcel.owner == ctx.sender {
            return Err(ResultCode::SelfTransaction.into());
        }
        if store.request(&ctx.sender, &self.target, ctx.committed)?.is_some() {
            return Err(ResultCode::AlreadyRequested.into());
        }
        if let Some(usage) = store.usage(&ctx.sender, &self.target, ctx.committed)? {
            if usage_is_live(&usage, ctx.height) {
                return Err(ResultCode::AlreadyGranted.into());
            }
        }
        require_balance(ctx, store, &ctx.sender, self.payment)
    }

    pub fn execute(&self, ctx: &TxContext<'_>, store: &mut LedgerStore) -> TxResult<Vec<Event>> {
        self.check(ctx, store)?;

        debit(store, &ctx.sender, self.payment)?;
        let request = Request {
            payment: self.payment,
            expire_height: expiry(ctx.height, ctx.params.request_expiry),
            extra: self.extra.clone(),
        };
        store.set_request(&ctx.sender, &self.target, &request)?;
        Ok(vec![Event::new("request")
            .attr("buyer", ctx.sender)
            .attr("target", target_hex(&self.target))
            .attr("payment", self.payment)
            .attr("expire_height", request.expire_height)])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelParam {
    #[serde(with = "hex_bytes")]
    pub target: Vec<u8>,
}

impl CancelParam {
    pub fn check(&self, ctx: &TxContext<'_>, store: &LedgerStore) -> TxResult<()> {
        require_target(&self.target)?;
        let request = store
            .request(&ctx.sender, &self.target, ctx.committed)?
            .ok_or(ResultCode::RequestNotFound)?;
        store
            .balance(&ctx.sender, ctx.committed)?
            .checked_add(request.payment)?;
        Ok(())
    }

    pub fn execute(&self, ctx: &TxContext<'_>, store: &mut LedgerStore) -> TxResult<Vec<Event>> {
        self.check(ctx, store)?;

        let request = store
            .request(&ctx.sender, &self.target, false)?
            .ok_or(ResultCode::RequestNotFound)?;
        store.remove_request(&ctx.sender, &self.target)?;
        credit(store, &ctx.sender, request.payment)?;
        Ok(vec![Event::new("cancel")
            .attr("buyer", ctx.sender)
            .attr("target", target_hex(&self.target))
            .attr("refund", request.payment)])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantParam {
    #[serde(with = "hex_bytes")]
    pub target: Vec<u8>,
    pub grantee: Address,
    #[serde(with = "hex_bytes")]
    pub custody: Vec<u8>,
}

impl GrantParam {
    pub fn check(&self, ctx: &TxContext<'_>, store: &LedgerStore) -> TxResult<()> {
        owned_parcel(ctx, store, &self.target)?;
        let request = store
            .request(&self.grantee, &self.target, ctx.committed)?
            .ok_or(ResultCode::RequestNotFound)?;
        if let Some(usage) = store.usage(&self.grantee, &self.target, ctx.committed)? {
            if usage_is_live(&usage, ctx.height) {
                return Err(ResultCode::AlreadyGranted.into());
            }
        }
        store
            .balance(&ctx.sender, ctx.committed)?
            .checked_add(request.payment)?;
        Ok(())
    }

    pub fn execute(&self, ctx: &TxContext<'_>, store: &mut LedgerStore) -> TxResult<Vec<Event>> {
        self.check(ctx, store)?;

        let request = store
            .request(&self.grantee, &self.target, false)?
            .ok_or(ResultCode::RequestNotFound)?;
        store.remove_request(&self.grantee, &self.target)?;
        credit(store, &ctx.sender, request.payment)?;
        let usage = Usage {
            custody: self.custody.clone(),
            expire_height: expiry(ctx.height, ctx.params.usage_expiry),
        };
        store.set_usage(&self.grantee, &self.target, &usage)?;
        Ok(vec![Event::new("grant")
            .attr("owner", ctx.sender)
            .attr("grantee", self.grantee)
            .attr("target", target_hex(&self.target))
            .attr("payment", request.payment)
            .attr("expire_height", usage.expire_height)])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokeParam {
    #[serde(with = "hex_bytes")]
    pub target: Vec<u8>,
    pub grantee: Address,
}

impl RevokeParam {
    pub fn check(&self, ctx: &TxContext<'_>, store: &LedgerStore) -> TxResult<()> {
        owned_parcel(ctx, store, &self.target)?;
        if store.usage(&self.grantee, &self.target, ctx.committed)?.is_none() {
            return Err(ResultCode::UsageNotFound.into());
        }
        Ok(())
    }

    pub fn execute(&self, ctx: &TxContext<'_>, store: &mut LedgerStore) -> TxResult<Vec<Event>> {
        self.check(ctx, store)?;

        store.remove_usage(&self.grantee, &self.target)?;
        Ok(vec![Event::new("revoke")
            .attr("owner", ctx.sender)
            .attr("grantee", self.grantee)
            .attr("target", target_hex(&self.target))])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscardParam {
    #[serde(with = "hex_bytes")]
    pub target: Vec<u8>,
}

impl DiscardParam {
    pub fn check(&self, ctx: &TxContext<'_>, store: &LedgerStore) -> TxResult<()> {
        owned_parcel(ctx, store, &self.target)?;
        Ok(())
    }

    pub fn execute(&self, ctx: &TxContext<'_>, store: &mut LedgerStore) -> TxResult<Vec<Event>> {
        self.check(ctx, store)?;

        store.remove_parcel(&self.target);
        Ok(vec![Event::new("discard")
            .attr("owner", ctx.sender)
            .attr("target", target_hex(&self.target))])
    }
}

/// Lapse everything due at `height`: pending requests are refunded to the
/// buyer and, when `expire_usages` is set, granted usages are dropped.
pub fn sweep_expired(
    store: &mut LedgerStore,
    height: BlockHeight,
    expire_usages: bool,
) -> BlockResult<Vec<Event>> {
    let mut events = Vec::new();

    for (buyer, target) in store.requests_expiring_at(height)? {
        let Some(request) = store.request(&buyer, &target, false)? else {
            continue;
        };
        store.remove_request(&buyer, &target)?;
        let balance = store.balance(&buyer, false)?.checked_add(request.payment)?;
        store.set_balance(&buyer, balance)?;
        events.push(
            Event::new("request_expired")
                .attr("buyer", buyer)
                .attr("target", target_hex(&target))
                .attr("refund", request.payment),
        );
    }

    if expire_usages {
        for (grantee, target) in store.usages_expiring_at(height)? {
            store.remove_usage(&grantee, &target)?;
            events.push(
                Event::new("usage_expired")
                    .attr("grantee", grantee)
                    .attr("target", target_hex(&target)),
            );
        }
    }

    if !events.is_empty() {
        tracing::debug!(height, expired = events.len(), "swept expired marketplace records");
    }
    Ok(events)
}

/// Sum of every escrowed request payment.
pub fn total_escrow(store: &LedgerStore, committed: bool) -> BlockResult<Currency> {
    let mut total = Currency::ZERO;
    for (_, _, request) in store.requests(committed)? {
        total = total.checked_add(request.payment)?;
    }
    Ok(total)
}
