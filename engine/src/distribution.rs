//! Incentive and penalty distribution over a holder and its delegators.
//!
//! An amount `T` is split in proportion to weighted stake:
//!
//! ```text
//! weighted_sum    = wV * S + Σ wD * dᵢ
//! share(dᵢ)       = floor(wD * dᵢ * T / weighted_sum)
//! validator_share = T - Σ share(dᵢ)
//! ```
//!
//! The validator absorbs the rounding remainder, so the shares always sum to
//! exactly `T`. Incentives credit balances; penalties come out of delegate
//! amounts and the stake.

use strata_primitives::{Address, BlockHeight, Currency, CurrencyError, Event};
use strata_store::{AuditKind, LedgerStore};

use crate::error::BlockResult;
use crate::hibernation::miss_count;
use crate::params::{ChainParams, Ratio};

/// `T` split between a validator and its delegators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shares {
    pub validator: Currency,
    pub delegates: Vec<(Address, Currency)>,
}

/// Split `total` by weighted stake. `None` when the weighted sum is zero.
pub fn weighted_shares(
    total: Currency,
    stake: Currency,
    delegates: &[(Address, Currency)],
    weight_validator: u64,
    weight_delegator: u64,
) -> Result<Option<Shares>, CurrencyError> {
    let wv = Currency::from_u64(weight_validator);
    let wd = Currency::from_u64(weight_delegator);

    let mut weighted_sum = stake.checked_mul(wv)?;
    for (_, amount) in delegates {
        weighted_sum = weighted_sum.checked_add(amount.checked_mul(wd)?)?;
    }
    if weighted_sum.is_zero() {
        return Ok(None);
    }

    let mut distributed = Currency::ZERO;
    let mut shares = Vec::with_capacity(delegates.len());
    for (addr, amount) in delegates {
        let share = amount.checked_mul(wd)?.mul_div_floor(total, weighted_sum)?;
        distributed = distributed.checked_add(share)?;
        shares.push((*addr, share));
    }
    Ok(Some(Shares {
        validator: total.checked_sub(distributed)?,
        delegates: shares,
    }))
}

fn shares_of(
    store: &LedgerStore,
    holder: &Address,
    total: Currency,
    params: &ChainParams,
) -> BlockResult<Option<Shares>> {
    let stake = store
        .stake(holder, false)?
        .map(|s| s.amount)
        .unwrap_or(Currency::ZERO);
    let delegates: Vec<(Address, Currency)> = store
        .delegators_of(holder, false)?
        .into_iter()
        .map(|(delegator, d)| (delegator, d.amount))
        .collect();
    Ok(weighted_shares(
        total,
        stake,
        &delegates,
        params.weight_validator,
        params.weight_delegator,
    )?)
}

/// Reward the proposer's holder for a block with `tx_count` delivered
/// transactions.
pub fn distribute_incentive(
    store: &mut LedgerStore,
    height: BlockHeight,
    holder: &Address,
    tx_count: u64,
    params: &ChainParams,
) -> BlockResult<Vec<Event>> {
    let total = params
        .tx_reward
        .checked_mul(Currency::from_u64(tx_count))?
        .checked_add(params.block_reward)?;
    if total.is_zero() {
        return Ok(Vec::new());
    }
    let Some(shares) = shares_of(store, holder, total, params)? else {
        tracing::debug!(%holder, height, "proposer holder has no weight; incentive skipped");
        return Ok(Vec::new());
    };

    let mut events = Vec::new();
    let recipients = std::iter::once((*holder, shares.validator)).chain(shares.delegates);
    for (addr, amount) in recipients {
        if amount.is_zero() {
            continue;
        }
        let balance = store.balance(&addr, false)?.checked_add(amount)?;
        store.set_balance(&addr, balance)?;
        store.record_distribution(AuditKind::Incentive, height, &addr, amount)?;
        events.push(
            Event::new("incentive")
                .attr("address", addr)
                .attr("amount", amount),
        );
    }
    tracing::debug!(%holder, height, %total, recipients = events.len(), "incentive distributed");
    Ok(events)
}

/// Take `total` out of `holder`'s stake and its delegates.
pub fn apply_penalty(
    store: &mut LedgerStore,
    height: BlockHeight,
    holder: &Address,
    total: Currency,
    reason: &str,
    params: &ChainParams,
) -> BlockResult<Vec<Event>> {
    if total.is_zero() {
        return Ok(Vec::new());
    }
    let Some(shares) = shares_of(store, holder, total, params)? else {
        return Ok(Vec::new());
    };

    let mut taken: Vec<(Address, Currency)> = Vec::with_capacity(shares.delegates.len() + 1);
    for (delegator, share) in shares.delegates {
        let Some(mut delegate) = store.delegate(&delegator, false)? else {
            continue;
        };
        let slashed = share.min(delegate.amount);
        delegate.amount = delegate.amount.saturating_sub(slashed);
        store.set_delegate(&delegator, &delegate)?;
        taken.push((delegator, slashed));
    }
    let slashed = store.slash_stake(holder, shares.validator)?;
    taken.insert(0, (*holder, slashed));

    let mut events = Vec::new();
    for (addr, amount) in taken {
        if amount.is_zero() {
            continue;
        }
        store.record_distribution(AuditKind::Penalty, height, &addr, amount)?;
        events.push(
            Event::new("penalty")
                .attr("address", addr)
                .attr("amount", amount)
                .attr("reason", reason),
        );
    }
    tracing::info!(%holder, height, %total, reason, "penalty applied");
    Ok(events)
}

/// Penalize holders whose validators were reported for misbehavior.
pub fn penalize_evidence(
    store: &mut LedgerStore,
    height: BlockHeight,
    holders: &[Address],
    params: &ChainParams,
) -> BlockResult<Vec<Event>> {
    let mut events = Vec::new();
    for holder in holders {
        let total = penalty_of(store, holder, params.penalty_ratio_m)?;
        events.extend(apply_penalty(store, height, holder, total, "evidence", params)?);
    }
    Ok(events)
}

/// At the end of every laziness window, penalize holders whose validators
/// missed more than the allowed share of the window.
pub fn penalize_laziness(
    store: &mut LedgerStore,
    height: BlockHeight,
    params: &ChainParams,
) -> BlockResult<Vec<Event>> {
    let window = params.laziness_window;
    if window == 0 || height == 0 || height % window != 0 {
        return Ok(Vec::new());
    }
    let range_start = (height + 1).saturating_sub(window).max(1);

    let mut lazy = Vec::new();
    for (holder, _) in store.stakes(false)? {
        let missed = miss_count(store, &holder, range_start, height, false)?;
        if params.laziness_threshold.exceeded_by(missed, window) {
            lazy.push((holder, missed));
        }
    }

    let mut events = Vec::new();
    for (holder, missed) in lazy {
        tracing::info!(%holder, height, missed, window, "validator lazy");
        let total = penalty_of(store, &holder, params.penalty_ratio_l)?;
        events.extend(apply_penalty(store, height, &holder, total, "laziness", params)?);
    }
    Ok(events)
}

fn penalty_of(store: &LedgerStore, holder: &Address, ratio: Ratio) -> BlockResult<Currency> {
    Ok(ratio.apply(store.effective_stake(holder, false)?)?)
}
