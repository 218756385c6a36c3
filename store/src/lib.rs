//! `strata-store`: versioned ledger store for the Strata state machine.
//!
//! This crate owns every persisted entity. It provides:
//!
//! - `KvBackend` trait: ordered byte-key storage abstraction
//! - `MemBackend`: in-memory `KvBackend`
//! - `StateOverlay`: uncommitted write buffer
//! - `LedgerStore`: committed/uncommitted views, commit, state roots
//! - typed accessors for balances, stakes, delegates, marketplace records,
//!   UDCs, hibernation, miss runs, audit records and the replay index
//!
//! Typed accessors are `impl LedgerStore` blocks spread over the entity
//! modules, so callers only ever hold a `LedgerStore`.

pub mod error;
pub mod backend;
pub mod mem;
pub mod overlay;
pub mod ledger;
pub mod keys;
pub mod records;
pub mod accounts;
pub mod staking;
pub mod market;
pub mod downtime;
pub mod audit;
pub mod txindex;

// Re-export commonly used types at the crate root.
pub use error::{StoreError, StoreResult};
pub use backend::{KvBackend, WriteBatch};
pub use mem::MemBackend;
pub use overlay::StateOverlay;
pub use ledger::LedgerStore;
pub use audit::AuditKind;
pub use records::{
    Delegate, DistributionRecord, Hibernate, MissRun, Parcel, Request, Stake, Udc, Usage,
    ValidatorEntry,
};
