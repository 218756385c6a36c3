//! Persisted entity records.
//!
//! Values are stored as JSON. Currency amounts serialize as decimal
//! strings, addresses and keys as upper-case hex.

use serde::{Deserialize, Serialize};
use strata_primitives::types::hex_bytes;
use strata_primitives::{Address, BlockHeight, Currency, PubKey};

/// A validator candidate's own stake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stake {
    /// Consensus public key of the validator node.
    pub validator: PubKey,
    pub amount: Currency,
    /// Height at which the stake becomes withdrawable.
    pub lockup_height: BlockHeight,
}

/// Stake a delegator has lent to a holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegate {
    pub delegatee: Address,
    pub amount: Currency,
}

/// A registered data parcel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parcel {
    pub owner: Address,
    #[serde(with = "hex_bytes")]
    pub custody: Vec<u8>,
    #[serde(default)]
    pub extra: serde_json::Value,
}

/// A buyer's pending request for a parcel. `payment` is held in escrow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub payment: Currency,
    /// Height at which the request lapses; 0 means never.
    pub expire_height: BlockHeight,
    #[serde(default)]
    pub extra: serde_json::Value,
}

/// Granted access to a parcel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(with = "hex_bytes")]
    pub custody: Vec<u8>,
    /// Height at which the grant lapses; 0 means never.
    pub expire_height: BlockHeight,
}

/// A user-defined currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Udc {
    pub owner: Address,
    #[serde(default)]
    pub operators: Vec<Address>,
    #[serde(default)]
    pub description: String,
    pub total_supply: Currency,
}

impl Udc {
    pub fn is_operator(&self, addr: &Address) -> bool {
        self.operators.contains(addr)
    }

    /// Owner or one of its operators.
    pub fn can_manage(&self, addr: &Address) -> bool {
        self.owner == *addr || self.is_operator(addr)
    }
}

/// Height range during which a validator is kept out of the active set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hibernate {
    pub start: BlockHeight,
    pub end: BlockHeight,
}

/// A contiguous run of missed blocks. `length == 0` means still open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissRun {
    pub validator: Address,
    pub start: BlockHeight,
    pub length: u64,
}

impl MissRun {
    pub fn is_open(&self) -> bool {
        self.length == 0
    }
}

/// One incentive or penalty payout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionRecord {
    pub height: BlockHeight,
    pub address: Address,
    pub amount: Currency,
}

/// An entry of the validator set handed to consensus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorEntry {
    pub pub_key: PubKey,
    pub power: i64,
}
