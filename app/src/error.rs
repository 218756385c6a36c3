//! Application error types.
//!
//! Every `AppError` is fatal: the consensus driver is expected to halt.
//! Rejected transactions are not errors; they come back as a `TxResponse`
//! with a non-OK code.

use strata_engine::BlockError;
use strata_primitives::BlockHeight;
use strata_store::StoreError;

use crate::config::ConfigError;
use crate::genesis::GenesisError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("block processing error: {0}")]
    Block(#[from] BlockError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("genesis error: {0}")]
    Genesis(#[from] GenesisError),

    /// BeginBlock or EndBlock for a height other than the next one.
    #[error("unexpected block height: expected {expected}, got {got}")]
    UnexpectedHeight {
        expected: BlockHeight,
        got: BlockHeight,
    },

    /// DeliverTx or EndBlock outside BeginBlock..Commit.
    #[error("no block in progress")]
    NoBlockInProgress,

    /// The persisted protocol version is unknown to this build.
    #[error("unsupported protocol version {0}")]
    UnknownProtocol(u32),
}
