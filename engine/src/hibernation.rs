//! Downtime tracking and hibernation.
//!
//! Every block the application reports which holders' validators failed to
//! sign the previous block. Consecutive misses form a run `{start, length}`
//! where an open run has `length == 0`. A run reaching
//! `hibernate_threshold` puts the holder into hibernation for
//! `hibernate_period` heights, during which it is left out of the
//! validator set.

use std::collections::BTreeSet;

use strata_primitives::{Address, BlockHeight, Event};
use strata_store::{Hibernate, LedgerStore, MissRun, StoreResult};

use crate::params::ChainParams;

/// Fold this block's missing holders into the miss runs. Returns the
/// `hibernate` events of holders that crossed the threshold.
pub fn update_miss_runs(
    store: &mut LedgerStore,
    height: BlockHeight,
    missing: &[Address],
    params: &ChainParams,
) -> StoreResult<Vec<Event>> {
    let missing: BTreeSet<Address> = missing.iter().copied().collect();
    let mut open: BTreeSet<Address> = BTreeSet::new();

    for run in store.miss_runs(false)? {
        if run.start > height {
            store.remove_miss_run(&run.validator, run.start);
            continue;
        }
        if !run.is_open() {
            continue;
        }
        if missing.contains(&run.validator) {
            open.insert(run.validator);
        } else if run.start == height {
            store.remove_miss_run(&run.validator, run.start);
        } else {
            store.set_miss_run(&MissRun {
                length: height - run.start,
                ..run
            })?;
        }
    }

    for holder in &missing {
        if !open.contains(holder) {
            store.set_miss_run(&MissRun {
                validator: *holder,
                start: height,
                length: 0,
            })?;
        }
    }

    let mut events = Vec::new();
    if params.hibernate_threshold > 0 {
        for holder in &missing {
            let Some(start) = open_run_start(store, holder)? else {
                continue;
            };
            if height + 1 - start < params.hibernate_threshold || store.is_hibernating(holder, false)? {
                continue;
            }
            let record = Hibernate {
                start: height,
                end: height.saturating_add(params.hibernate_period),
            };
            store.set_hibernate(holder, &record)?;
            tracing::info!(%holder, start = record.start, end = record.end, "validator hibernating");
            events.push(
                Event::new("hibernate")
                    .attr("holder", holder)
                    .attr("start", record.start)
                    .attr("end", record.end),
            );
        }
    }

    prune_closed_runs(store, height, params.laziness_window)?;
    Ok(events)
}

/// End every hibernation due at or before `height`. Records are deleted as
/// they fire, so each wakes exactly once.
pub fn wake_up(store: &mut LedgerStore, height: BlockHeight) -> StoreResult<Vec<Event>> {
    let mut events = Vec::new();
    for (holder, record) in store.hibernates(false)? {
        if record.end > height {
            continue;
        }
        store.remove_hibernate(&holder);
        tracing::info!(%holder, height, "validator woke up");
        events.push(
            Event::new("wakeup")
                .attr("holder", holder)
                .attr("start", record.start)
                .attr("end", record.end),
        );
    }
    Ok(events)
}

/// Missed heights of `holder` within `[range_start, range_end]`. An open run
/// counts as missing through `range_end`.
pub fn miss_count(
    store: &LedgerStore,
    holder: &Address,
    range_start: BlockHeight,
    range_end: BlockHeight,
    committed: bool,
) -> StoreResult<u64> {
    let mut count = 0;
    for run in store.miss_runs_of(holder, committed)? {
        let last = if run.is_open() {
            range_end
        } else {
            run.start + run.length - 1
        };
        let lo = run.start.max(range_start);
        let hi = last.min(range_end);
        if lo <= hi {
            count += hi - lo + 1;
        }
    }
    Ok(count)
}

fn open_run_start(store: &LedgerStore, holder: &Address) -> StoreResult<Option<BlockHeight>> {
    Ok(store
        .miss_runs_of(holder, false)?
        .into_iter()
        .find(MissRun::is_open)
        .map(|run| run.start))
}

/// Drop closed runs that ended before the current laziness window.
fn prune_closed_runs(store: &mut LedgerStore, height: BlockHeight, window: u64) -> StoreResult<()> {
    let horizon = height.saturating_sub(window);
    for run in store.miss_runs(false)? {
        if !run.is_open() && run.start + run.length <= horizon {
            store.remove_miss_run(&run.validator, run.start);
        }
    }
    Ok(())
}
