//! Block binding: bounds how stale a transaction's declared height may be.

use strata_primitives::{BlockHeight, ResultCode};

use crate::error::TxResult;

/// Valid iff `max(0, block_height - grace_period + 1) <= tx_height <= block_height`.
pub fn is_valid(tx_height: BlockHeight, block_height: BlockHeight, grace_period: u64) -> bool {
    let lower = (block_height + 1).saturating_sub(grace_period);
    lower <= tx_height && tx_height <= block_height
}

/// `is_valid` as a transaction check.
pub fn check(tx_height: BlockHeight, block_height: BlockHeight, grace_period: u64) -> TxResult<()> {
    if is_valid(tx_height, block_height, grace_period) {
        Ok(())
    } else {
        Err(ResultCode::ImproperTxHeight.into())
    }
}
