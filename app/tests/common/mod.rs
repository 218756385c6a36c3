//! Shared test helpers for integration tests.
//!
//! Provides deterministic keypairs, transaction builders, genesis builders,
//! and block drivers used across all integration test files.

#![allow(dead_code)]

use serde_json::{json, Value};
use strata_app::{
    App, AppConfig, BeginBlockRequest, EndBlockResponse, GenesisBalance, GenesisDelegate,
    GenesisStake, GenesisState, TxResponse, VoteInfo,
};
use strata_engine::operation::total_escrow;
use strata_engine::transaction::encode_tx;
use strata_engine::{ChainParams, Ratio};
use strata_primitives::crypto::address_from_pubkey;
use strata_primitives::{Address, BlockHeight, Currency, Event, Hash, PubKey};

// ── Deterministic Keypairs ──

/// Create a deterministic Ed25519 signing key from a single seed byte.
///
/// The secret key is `[seed; 32]`, giving reproducible keys across machines.
pub fn deterministic_keypair(seed: u8) -> (ed25519_dalek::VerifyingKey, ed25519_dalek::SigningKey) {
    let secret_bytes = [seed; 32];
    let signing_key = ed25519_dalek::SigningKey::from_bytes(&secret_bytes);
    let verifying_key = signing_key.verifying_key();
    (verifying_key, signing_key)
}

/// Account for `seed`: its address and signing key.
pub fn account(seed: u8) -> (Address, ed25519_dalek::SigningKey) {
    let (vk, sk) = deterministic_keypair(seed);
    (address_from_pubkey(&PubKey::new(vk.to_bytes())), sk)
}

/// Alice: seed=1, stable address across all tests.
pub fn alice() -> (Address, ed25519_dalek::SigningKey) {
    account(1)
}

/// Bob: seed=2, stable address across all tests.
pub fn bob() -> (Address, ed25519_dalek::SigningKey) {
    account(2)
}

/// Charlie: seed=3, stable address across all tests.
pub fn charlie() -> (Address, ed25519_dalek::SigningKey) {
    account(3)
}

/// Validator (consensus) key for `seed`, kept apart from account keys.
pub fn validator_key(seed: u8) -> PubKey {
    let (vk, _) = deterministic_keypair(seed.wrapping_add(100));
    PubKey::new(vk.to_bytes())
}

/// Consensus address of `validator_key(seed)`, as reported in votes.
pub fn validator_address(seed: u8) -> Address {
    address_from_pubkey(&validator_key(seed))
}

// ── Configuration ──

/// Small parameters so windows and thresholds are reached in a few blocks.
///
/// Rewards are zero; tests that exercise incentives set them explicitly.
pub fn test_config() -> AppConfig {
    AppConfig {
        chain: ChainParams {
            max_validators: 10,
            weight_validator: 2,
            weight_delegator: 1,
            minimum_staking_unit: Currency::from_u64(10),
            block_reward: Currency::ZERO,
            tx_reward: Currency::ZERO,
            penalty_ratio_m: Ratio::new(1, 10),
            penalty_ratio_l: Ratio::new(1, 100),
            laziness_window: 0,
            laziness_threshold: Ratio::new(8, 10),
            hibernate_threshold: 3,
            hibernate_period: 5,
            block_binding_window: 5,
            tx_index_range: 4,
            lockup_period: 2,
            request_expiry: 10,
            usage_expiry: 0,
        },
        ..AppConfig::default()
    }
}

// ── Genesis Builders ──

pub fn c(v: u64) -> Currency {
    Currency::from_u64(v)
}

/// Genesis with funded balances, stakes (holder, amount, validator seed),
/// and delegates (holder, delegator, amount).
pub fn genesis(
    balances: &[(Address, u64)],
    stakes: &[(Address, u64, u8)],
    delegates: &[(Address, Address, u64)],
) -> Vec<u8> {
    let state = GenesisState {
        balances: balances
            .iter()
            .map(|(owner, amount)| GenesisBalance {
                owner: *owner,
                amount: c(*amount),
            })
            .collect(),
        stakes: stakes
            .iter()
            .map(|(holder, amount, seed)| GenesisStake {
                holder: *holder,
                amount: c(*amount),
                validator: validator_key(*seed),
            })
            .collect(),
        delegates: delegates
            .iter()
            .map(|(holder, delegator, amount)| GenesisDelegate {
                holder: *holder,
                delegator: *delegator,
                amount: c(*amount),
            })
            .collect(),
    };
    serde_json::to_vec(&state).unwrap()
}

/// Alice, Bob and Charlie funded with 1000 each; Alice stakes 100 with
/// validator seed 1.
pub fn standard_genesis() -> Vec<u8> {
    genesis(
        &[(alice().0, 1_000), (bob().0, 1_000), (charlie().0, 1_000)],
        &[(alice().0, 100, 1)],
        &[],
    )
}

/// In-memory app after InitChain and the genesis commit (height 0).
pub fn start_app(config: AppConfig, genesis: &[u8]) -> App {
    let mut app = App::in_memory(config).unwrap();
    app.init_chain(genesis).unwrap();
    app.commit().unwrap();
    app
}

// ── Transaction Builders ──

pub fn tx(
    signing_key: &ed25519_dalek::SigningKey,
    tx_type: &str,
    last_height: BlockHeight,
    payload: Value,
) -> Vec<u8> {
    encode_tx(tx_type, last_height, payload, signing_key)
}

pub fn transfer_tx(
    signing_key: &ed25519_dalek::SigningKey,
    last_height: BlockHeight,
    to: &Address,
    amount: u64,
) -> Vec<u8> {
    tx(
        signing_key,
        "transfer",
        last_height,
        json!({"to": to, "amount": amount.to_string()}),
    )
}

pub fn stake_tx(
    signing_key: &ed25519_dalek::SigningKey,
    last_height: BlockHeight,
    validator_seed: u8,
    amount: u64,
) -> Vec<u8> {
    tx(
        signing_key,
        "stake",
        last_height,
        json!({"validator": validator_key(validator_seed), "amount": amount.to_string()}),
    )
}

pub fn delegate_tx(
    signing_key: &ed25519_dalek::SigningKey,
    last_height: BlockHeight,
    to: &Address,
    amount: u64,
) -> Vec<u8> {
    tx(
        signing_key,
        "delegate",
        last_height,
        json!({"to": to, "amount": amount.to_string()}),
    )
}

pub fn register_tx(
    signing_key: &ed25519_dalek::SigningKey,
    last_height: BlockHeight,
    target: &str,
) -> Vec<u8> {
    tx(
        signing_key,
        "register",
        last_height,
        json!({"target": target, "custody": "C0FFEE"}),
    )
}

pub fn request_tx(
    signing_key: &ed25519_dalek::SigningKey,
    last_height: BlockHeight,
    target: &str,
    payment: u64,
) -> Vec<u8> {
    tx(
        signing_key,
        "request",
        last_height,
        json!({"target": target, "payment": payment.to_string()}),
    )
}

pub fn grant_tx(
    signing_key: &ed25519_dalek::SigningKey,
    last_height: BlockHeight,
    target: &str,
    grantee: &Address,
) -> Vec<u8> {
    tx(
        signing_key,
        "grant",
        last_height,
        json!({"target": target, "grantee": grantee, "custody": "BEEF"}),
    )
}

pub fn issue_tx(
    signing_key: &ed25519_dalek::SigningKey,
    last_height: BlockHeight,
    udc: u32,
    amount: u64,
) -> Vec<u8> {
    tx(
        signing_key,
        "issue",
        last_height,
        json!({"udc": udc, "desc": "test coin", "amount": amount.to_string()}),
    )
}

// ── Block Drivers ──

/// Everything a block produced.
#[derive(Debug)]
pub struct BlockOutcome {
    pub begin_events: Vec<Event>,
    pub txs: Vec<TxResponse>,
    pub end: EndBlockResponse,
    pub app_hash: Hash,
}

impl BlockOutcome {
    /// Every event of the block, in emission order.
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.begin_events
            .iter()
            .chain(self.txs.iter().flat_map(|r| r.events.iter()))
            .chain(self.end.events.iter())
    }

    pub fn events_of<'a>(&'a self, kind: &'a str) -> Vec<&'a Event> {
        self.events().filter(|e| e.kind == kind).collect()
    }
}

/// BeginBlock request for the next height with no proposer, votes or
/// evidence.
pub fn next_block(app: &App) -> BeginBlockRequest {
    BeginBlockRequest {
        height: app.state().height + 1,
        ..BeginBlockRequest::default()
    }
}

/// Votes in which the validators of `missing` seeds did not sign.
pub fn missing_votes(missing: &[u8]) -> Vec<VoteInfo> {
    missing
        .iter()
        .map(|seed| VoteInfo {
            validator_address: validator_address(*seed),
            signed_last_block: false,
        })
        .collect()
}

/// Run BeginBlock, DeliverTx for each of `txs`, EndBlock and Commit.
pub fn run_block(app: &mut App, req: BeginBlockRequest, txs: &[Vec<u8>]) -> BlockOutcome {
    let height = req.height;
    let begin_events = app.begin_block(req).unwrap();
    let txs = txs.iter().map(|raw| app.deliver_tx(raw).unwrap()).collect();
    let end = app.end_block(height).unwrap();
    let app_hash = app.commit().unwrap();
    BlockOutcome {
        begin_events,
        txs,
        end,
        app_hash,
    }
}

/// Run an empty block at the next height.
pub fn empty_block(app: &mut App) -> BlockOutcome {
    let req = next_block(app);
    run_block(app, req, &[])
}

// ── State Helpers ──

/// Committed native coin in existence: balances, stakes, delegates and
/// escrowed request payments.
pub fn total_supply(app: &App) -> Currency {
    let store = app.store();
    let mut total = Currency::ZERO;
    for (_, amount) in store.balances(true).unwrap() {
        total = total.checked_add(amount).unwrap();
    }
    for (_, stake) in store.stakes(true).unwrap() {
        total = total.checked_add(stake.amount).unwrap();
    }
    for (_, delegate) in store.delegates(true).unwrap() {
        total = total.checked_add(delegate.amount).unwrap();
    }
    total.checked_add(total_escrow(store, true).unwrap()).unwrap()
}

pub fn balance(app: &App, addr: &Address) -> Currency {
    app.store().balance(addr, true).unwrap()
}
