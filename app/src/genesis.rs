//! Genesis state.
//!
//! ```text
//! {
//!   "balances":  [{"owner": "<addr>", "amount": "1000"}],
//!   "stakes":    [{"holder": "<addr>", "amount": "500", "validator": "<pubkey>"}],
//!   "delegates": [{"holder": "<addr>", "delegator": "<addr>", "amount": "50"}]
//! }
//! ```
//!
//! Stakes and delegates are minted directly; they are not taken out of the
//! listed balances. Genesis stakes carry no lockup.

use serde::{Deserialize, Serialize};
use strata_primitives::crypto::address_from_pubkey;
use strata_primitives::{Address, Currency, PubKey};
use strata_store::{Delegate, LedgerStore, Stake, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenesisError {
    #[error("malformed genesis: {0}")]
    Parse(String),

    #[error("zero amount for {0}")]
    ZeroAmount(Address),

    #[error("amount overflow for {0}")]
    Overflow(Address),

    #[error("duplicate stake for holder {0}")]
    DuplicateStake(Address),

    #[error("validator key {0} used by more than one holder")]
    DuplicateValidator(PubKey),

    #[error("duplicate delegate for delegator {0}")]
    DuplicateDelegate(Address),

    #[error("delegate references holder {0} without a stake")]
    UnknownHolder(Address),

    #[error("holder {0} cannot also delegate")]
    DelegatorIsStaker(Address),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisBalance {
    pub owner: Address,
    pub amount: Currency,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisStake {
    pub holder: Address,
    pub amount: Currency,
    pub validator: PubKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisDelegate {
    pub holder: Address,
    pub delegator: Address,
    pub amount: Currency,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenesisState {
    pub balances: Vec<GenesisBalance>,
    pub stakes: Vec<GenesisStake>,
    pub delegates: Vec<GenesisDelegate>,
}

impl GenesisState {
    /// Parse app-state bytes. Empty input is an empty genesis.
    pub fn from_json(bytes: &[u8]) -> Result<Self, GenesisError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(bytes).map_err(|e| GenesisError::Parse(e.to_string()))
    }

    /// Write every entry into the working view of `store`.
    pub fn apply(&self, store: &mut LedgerStore) -> Result<(), GenesisError> {
        for entry in &self.balances {
            let balance = store
                .balance(&entry.owner, false)?
                .checked_add(entry.amount)
                .map_err(|_| GenesisError::Overflow(entry.owner))?;
            store.set_balance(&entry.owner, balance)?;
        }

        for entry in &self.stakes {
            if entry.amount.is_zero() {
                return Err(GenesisError::ZeroAmount(entry.holder));
            }
            if store.stake(&entry.holder, false)?.is_some() {
                return Err(GenesisError::DuplicateStake(entry.holder));
            }
            let validator_addr = address_from_pubkey(&entry.validator);
            if store.holder_by_validator_address(&validator_addr, false)?.is_some() {
                return Err(GenesisError::DuplicateValidator(entry.validator));
            }
            store.set_stake(
                &entry.holder,
                &Stake {
                    validator: entry.validator,
                    amount: entry.amount,
                    lockup_height: 0,
                },
            )?;
        }

        for entry in &self.delegates {
            if entry.amount.is_zero() {
                return Err(GenesisError::ZeroAmount(entry.delegator));
            }
            if store.stake(&entry.holder, false)?.is_none() {
                return Err(GenesisError::UnknownHolder(entry.holder));
            }
            if store.stake(&entry.delegator, false)?.is_some() {
                return Err(GenesisError::DelegatorIsStaker(entry.delegator));
            }
            if store.delegate(&entry.delegator, false)?.is_some() {
                return Err(GenesisError::DuplicateDelegate(entry.delegator));
            }
            store.set_delegate(
                &entry.delegator,
                &Delegate {
                    delegatee: entry.holder,
                    amount: entry.amount,
                },
            )?;
        }

        tracing::info!(
            balances = self.balances.len(),
            stakes = self.stakes.len(),
            delegates = self.delegates.len(),
            "genesis applied"
        );
        Ok(())
    }
}
