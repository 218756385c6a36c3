//! `strata-primitives`: foundational types for the Strata ledger.
//!
//! This crate provides the identifiers, bounded currency arithmetic,
//! result codes, cryptographic helpers, events, and Merkle root shared by
//! the store, the transaction engine, and the application orchestrator.

pub mod types;
pub mod currency;
pub mod error;
pub mod crypto;
pub mod event;
pub mod merkle;

// Re-export commonly used types at the crate root for convenience.
pub use types::{Address, BlockHeight, Hash, PubKey, ADDRESS_LEN, PUBKEY_LEN, ZERO_HASH};
pub use currency::{Currency, CurrencyError};
pub use error::{QueryCode, ResultCode};
pub use event::{Event, EventAttribute};
