//! Protocol versions as strategy objects.
//!
//! The application picks one `Protocol` per block from the persisted
//! protocol version and injects it into the [`crate::TransactionEngine`].
//!
//! | version | UDC operations | usage expiry |
//! |---------|----------------|--------------|
//! | 1       | `Unknown`      | never        |
//! | 2       | enabled        | swept        |

use strata_primitives::ResultCode;
use strata_store::LedgerStore;

use crate::error::{BlockError, BlockResult};
use crate::operation::Operation;

/// Newest protocol version this build understands.
pub const LATEST_VERSION: u32 = 2;

/// Version-dependent transaction and block behavior.
pub trait Protocol: Send + Sync {
    fn version(&self) -> u32;

    /// Map an envelope's type and payload to an operation this version
    /// accepts.
    fn parse_operation(
        &self,
        tx_type: &str,
        payload: &serde_json::Value,
    ) -> Result<Operation, ResultCode>;

    /// Whether the block-end sweep drops expired usages.
    fn expires_usages(&self) -> bool;
}

/// Genesis protocol: native coin, staking and the parcel marketplace.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtocolV1;

impl Protocol for ProtocolV1 {
    fn version(&self) -> u32 {
        1
    }

    fn parse_operation(
        &self,
        tx_type: &str,
        payload: &serde_json::Value,
    ) -> Result<Operation, ResultCode> {
        let op = Operation::parse(tx_type, payload)?;
        if op.uses_udc() {
            return Err(ResultCode::Unknown);
        }
        Ok(op)
    }

    fn expires_usages(&self) -> bool {
        false
    }
}

/// Adds user-defined currencies and usage expiry.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtocolV2;

impl Protocol for ProtocolV2 {
    fn version(&self) -> u32 {
        2
    }

    fn parse_operation(
        &self,
        tx_type: &str,
        payload: &serde_json::Value,
    ) -> Result<Operation, ResultCode> {
        Operation::parse(tx_type, payload)
    }

    fn expires_usages(&self) -> bool {
        true
    }
}

/// Strategy for `version`, if this build knows it.
pub fn protocol_for(version: u32) -> Option<Box<dyn Protocol>> {
    match version {
        1 => Some(Box::new(ProtocolV1)),
        2 => Some(Box::new(ProtocolV2)),
        _ => None,
    }
}

/// Run the state migration from protocol `from` to `to`.
pub fn migrate(store: &mut LedgerStore, from: u32, to: u32) -> BlockResult<()> {
    match (from, to) {
        (1, 2) => {
            let holders = store.rebuild_effective_stakes()?;
            tracing::info!(from, to, holders, "migrated protocol state");
            Ok(())
        }
        _ => Err(BlockError::UnsupportedUpgrade { from, to }),
    }
}
