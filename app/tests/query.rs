//! Queries against a running chain.

mod common;

use common::*;
use serde_json::{json, Value};
use strata_app::App;
use strata_primitives::{Currency, QueryCode};
use strata_store::{DistributionRecord, Parcel, Request, Stake, ValidatorEntry};

fn query(app: &App, path: &str, key: Value) -> strata_app::QueryResponse {
    app.query(path, key.to_string().as_bytes())
}

/// Alice registers "AB01", Bob requests it, and Alice proposes with a
/// block reward.
fn busy_app() -> App {
    let mut config = test_config();
    config.chain.block_reward = c(20);
    let mut app = start_app(config, &standard_genesis());
    let (_, alice_sk) = alice();
    let (_, bob_sk) = bob();
    let mut req = next_block(&app);
    req.proposer = validator_address(1);
    run_block(
        &mut app,
        req,
        &[
            register_tx(&alice_sk, 0, "AB01"),
            request_tx(&bob_sk, 0, "AB01", 40),
        ],
    );
    app
}

#[test]
fn test_account_queries() {
    let app = busy_app();
    let (alice_addr, _) = alice();

    let resp = app.query("/balance", alice_addr.to_hex().as_bytes());
    assert_eq!(resp.code, QueryCode::Ok);
    assert_eq!(resp.json::<Currency>(), Some(c(1_020)));

    let stake: Stake = query(&app, "/stake", json!(alice_addr)).json().unwrap();
    assert_eq!(stake.amount, c(100));
    assert_eq!(stake.validator, validator_key(1));

    assert_eq!(query(&app, "/delegate", json!(bob().0)).code, QueryCode::NoMatch);
    // an unknown account simply has nothing
    assert_eq!(
        query(&app, "/balance", json!(account(42).0)).json::<Currency>(),
        Some(Currency::ZERO)
    );
}

#[test]
fn test_marketplace_queries() {
    let app = busy_app();
    let (alice_addr, _) = alice();
    let (bob_addr, _) = bob();

    let parcel: Parcel = query(&app, "/parcel", json!("AB01")).json().unwrap();
    assert_eq!(parcel.owner, alice_addr);
    assert_eq!(parcel.custody, vec![0xC0, 0xFF, 0xEE]);

    let request: Request = query(&app, "/request", json!({"buyer": bob_addr, "target": "AB01"}))
        .json()
        .unwrap();
    assert_eq!(request.payment, c(40));
    assert_eq!(request.expire_height, 1 + app.config().chain.request_expiry);

    assert_eq!(
        query(&app, "/usage", json!({"grantee": bob_addr, "target": "AB01"})).code,
        QueryCode::NoMatch
    );
    assert_eq!(
        query(&app, "/request", json!({"buyer": bob_addr})).code,
        QueryCode::NoKey
    );
    assert_eq!(
        query(&app, "/parcel", json!("not hex")).code,
        QueryCode::BadKey
    );
}

#[test]
fn test_incentive_record_queries() {
    let app = busy_app();
    let (alice_addr, _) = alice();

    let at_height: Vec<DistributionRecord> = app.query("/inc_height", b"1").json().unwrap();
    assert_eq!(at_height.len(), 1);
    assert_eq!(at_height[0].address, alice_addr);
    assert_eq!(at_height[0].amount, c(20));

    let of_alice: Vec<DistributionRecord> =
        query(&app, "/inc_address", json!(alice_addr)).json().unwrap();
    assert_eq!(of_alice, at_height);

    assert_eq!(app.query("/inc_height", b"2").code, QueryCode::NoMatch);
    assert_eq!(app.query("/penalty_height", b"1").code, QueryCode::NoMatch);
}

#[test]
fn test_chain_queries() {
    let app = busy_app();

    let validators: Vec<ValidatorEntry> = app.query("/validators", b"").json().unwrap();
    assert_eq!(
        validators,
        vec![ValidatorEntry {
            pub_key: validator_key(1),
            power: 10,
        }]
    );

    let state: Value = app.query("/app_state", b"").json().unwrap();
    assert_eq!(state["height"], 1);
    assert_eq!(
        state["app_hash"],
        hex::encode_upper(app.info().last_block_app_hash)
    );

    let config: Value = app.query("/config", b"").json().unwrap();
    assert_eq!(config["block_reward"], "20");
    assert_eq!(config["tx_index_range"], 4);
}

#[test]
fn test_query_sees_only_committed_state() {
    let mut app = busy_app();
    let (alice_addr, alice_sk) = alice();

    let req = next_block(&app);
    app.begin_block(req).unwrap();
    app.deliver_tx(&transfer_tx(&alice_sk, 1, &bob().0, 1_000)).unwrap();
    let resp = query(&app, "/balance", json!(alice_addr));
    assert_eq!(resp.json::<Currency>(), Some(c(1_020)));

    app.end_block(2).unwrap();
    app.commit().unwrap();
    let resp = query(&app, "/balance", json!(alice_addr));
    assert_eq!(resp.json::<Currency>(), Some(c(20)));
}

#[test]
fn test_udc_queries() {
    let mut app = start_app(test_config(), &standard_genesis());
    let (alice_addr, alice_sk) = alice();
    let req = next_block(&app);
    run_block(&mut app, req, &[issue_tx(&alice_sk, 0, 3, 250)]);

    let udc: Value = app.query("/udc", b"3").json().unwrap();
    assert_eq!(udc["owner"], json!(alice_addr));
    assert_eq!(udc["total_supply"], "250");

    let held = query(&app, "/udc_balance", json!({"udc": 3, "address": alice_addr}));
    assert_eq!(held.json::<Currency>(), Some(c(250)));
    let locked = query(&app, "/udc_lock", json!({"udc": 3, "address": alice_addr}));
    assert_eq!(locked.json::<Currency>(), Some(Currency::ZERO));

    assert_eq!(app.query("/udc", b"4").code, QueryCode::NoMatch);
    assert_eq!(app.query("/udc", b"\"x\"").code, QueryCode::BadKey);
    assert_eq!(app.query("/nope", b"").code, QueryCode::BadPath);
}
