//! Store error type.
//!
//! Store errors are never part of a transaction's result code: a failing
//! backend or an undecodable record means the node can no longer produce a
//! trustworthy state root, so callers propagate these up to the
//! orchestrator, which halts. `Arithmetic` is the exception; the engine
//! turns it into a rejection.

use strata_primitives::CurrencyError;

/// Error raised by the ledger store or its backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The physical backend failed (I/O, closed handle, ...).
    #[error("backend error: {0}")]
    Backend(String),

    /// A persisted value could not be decoded.
    #[error("corrupt value at key {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// A record could not be encoded.
    #[error("encoding error: {0}")]
    Encode(String),

    /// A derived total left the currency bound.
    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] CurrencyError),
}

impl StoreError {
    /// Build a `Corrupt` error for `key`, rendering non-ASCII key bytes as hex.
    pub fn corrupt(key: &[u8], reason: impl ToString) -> Self {
        Self::Corrupt {
            key: render_key(key),
            reason: reason.to_string(),
        }
    }
}

/// Render a store key for diagnostics: the ASCII prefix up to and including
/// the first `:` verbatim, the binary remainder as hex.
pub fn render_key(key: &[u8]) -> String {
    match key.iter().position(|b| *b == b':') {
        Some(idx) if key[..idx].is_ascii() => {
            let prefix = String::from_utf8_lossy(&key[..=idx]);
            let rest: String = key[idx + 1..].iter().map(|b| format!("{:02X}", b)).collect();
            format!("{}{}", prefix, rest)
        }
        _ => key.iter().map(|b| format!("{:02X}", b)).collect(),
    }
}

/// Convenience result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
