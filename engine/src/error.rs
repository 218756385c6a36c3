//! Engine error types.
//!
//! Two layers:
//!
//! - `TxError`: per-transaction. `Rejected` carries the result code handed
//!   back to the submitter; `Store` is fatal and must reach the orchestrator.
//! - `BlockError`: block-boundary processing (distribution, hibernation,
//!   validator set). Always fatal.

use strata_primitives::{CurrencyError, ResultCode};
use strata_store::StoreError;

/// Outcome of a failed transaction check or execution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TxError {
    /// Precondition failed; no state was touched.
    #[error("rejected: {0}")]
    Rejected(ResultCode),

    /// The store failed underneath the transaction.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for TxError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Arithmetic(e) => TxError::from(e),
            other => TxError::Store(other),
        }
    }
}

impl TxError {
    /// Result code to report; store failures report `Unknown`.
    pub fn code(&self) -> ResultCode {
        match self {
            TxError::Rejected(code) => *code,
            TxError::Store(_) => ResultCode::Unknown,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, TxError::Store(_))
    }
}

impl From<ResultCode> for TxError {
    fn from(code: ResultCode) -> Self {
        TxError::Rejected(code)
    }
}

impl From<CurrencyError> for TxError {
    fn from(err: CurrencyError) -> Self {
        TxError::Rejected(ResultCode::from(err))
    }
}

pub type TxResult<T> = Result<T, TxError>;

/// Fatal failure during block-boundary processing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlockError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Arithmetic left the currency bound while distributing.
    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] CurrencyError),

    /// Migration between two protocol versions is not defined.
    #[error("unsupported protocol upgrade {from} -> {to}")]
    UnsupportedUpgrade { from: u32, to: u32 },
}

pub type BlockResult<T> = Result<T, BlockError>;
