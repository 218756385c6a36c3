//! `strata-engine`: transaction processing and validator economics.
//!
//! This crate implements everything between raw transaction bytes and the
//! ledger store:
//!
//! - [`transaction`]: envelope decoding, canonical signing bytes, signatures
//! - [`operation`]: the closed catalog of operations, each with a read-only
//!   `check` and a mutating `execute`
//! - [`protocol`]: per-version behavior as a strategy object
//! - [`engine::TransactionEngine`]: decode, verify and dispatch
//! - [`replay::ReplayPreventer`]: sliding-window duplicate rejection
//! - [`binding`]: block-binding validity window
//! - [`hibernation`], [`distribution`], [`validator_set`]: block-boundary
//!   economics run by the application at BeginBlock and EndBlock
//!
//! Everything here is deterministic: no clocks, no randomness, no I/O apart
//! from the `LedgerStore` handed in by the caller.

pub mod binding;
pub mod distribution;
pub mod engine;
pub mod error;
pub mod hibernation;
pub mod operation;
pub mod params;
pub mod protocol;
pub mod replay;
pub mod transaction;
pub mod validator_set;

// Re-export key types for convenience
pub use engine::{ParsedTx, TransactionEngine};
pub use error::{BlockError, BlockResult, TxError, TxResult};
pub use operation::{Operation, TxContext};
pub use params::{ChainParams, Ratio};
pub use protocol::{protocol_for, Protocol, ProtocolV1, ProtocolV2, LATEST_VERSION};
pub use replay::ReplayPreventer;
pub use transaction::{Envelope, TxSignature};
