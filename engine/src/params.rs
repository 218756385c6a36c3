//! Chain parameters consumed by the engine.
//!
//! These are fixed for the life of a chain and are carried inside the
//! application config. Every field has a default so a partial config file
//! deserializes.

use serde::{Deserialize, Serialize};
use strata_primitives::{Currency, CurrencyError};

/// A non-negative fraction `num / den`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratio {
    pub num: u64,
    pub den: u64,
}

impl Ratio {
    pub const fn new(num: u64, den: u64) -> Self {
        Self { num, den }
    }

    /// `floor(amount * num / den)`.
    pub fn apply(&self, amount: Currency) -> Result<Currency, CurrencyError> {
        amount.mul_ratio(self.num, self.den)
    }

    /// True when `value / total > num / den`.
    pub fn exceeded_by(&self, value: u64, total: u64) -> bool {
        (value as u128) * (self.den as u128) > (self.num as u128) * (total as u128)
    }

    pub fn is_valid_fraction(&self) -> bool {
        self.den != 0 && self.num <= self.den
    }
}

/// Economic and safety parameters of the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainParams {
    /// Size cap of the active validator set.
    pub max_validators: u32,
    /// Weight of a validator's own stake in distributions.
    pub weight_validator: u64,
    /// Weight of delegated stake in distributions.
    pub weight_delegator: u64,
    /// Stakes are multiples of this; it is also one unit of voting power.
    pub minimum_staking_unit: Currency,
    /// Minted to the proposer's holder every block.
    pub block_reward: Currency,
    /// Minted per delivered transaction.
    pub tx_reward: Currency,
    /// Share of effective stake slashed on evidence of misbehavior.
    pub penalty_ratio_m: Ratio,
    /// Share of effective stake slashed for laziness.
    pub penalty_ratio_l: Ratio,
    /// Heights per laziness evaluation; 0 disables it.
    pub laziness_window: u64,
    /// Allowed fraction of missed blocks per laziness window.
    pub laziness_threshold: Ratio,
    /// Consecutive misses that put a validator into hibernation.
    pub hibernate_threshold: u64,
    /// Length of a hibernation in heights.
    pub hibernate_period: u64,
    /// Grace period for a transaction's declared height.
    pub block_binding_window: u64,
    /// Heights covered by the replay index.
    pub tx_index_range: u64,
    /// Heights a fresh stake stays locked.
    pub lockup_period: u64,
    /// Heights before a pending request lapses and is refunded.
    pub request_expiry: u64,
    /// Heights a granted usage stays valid; 0 means forever.
    pub usage_expiry: u64,
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            max_validators: 100,
            weight_validator: 2,
            weight_delegator: 1,
            minimum_staking_unit: Currency::from_u64(1_000_000),
            block_reward: Currency::from_u64(10_000_000),
            tx_reward: Currency::from_u64(1_000),
            penalty_ratio_m: Ratio::new(3, 10),
            penalty_ratio_l: Ratio::new(1, 100),
            laziness_window: 8_000,
            laziness_threshold: Ratio::new(8, 10),
            hibernate_threshold: 100,
            hibernate_period: 10_000,
            block_binding_window: 10_000,
            tx_index_range: 10_000,
            lockup_period: 1_000_000,
            request_expiry: 100_000,
            usage_expiry: 0,
        }
    }
}
