//! CheckTx and DeliverTx through the application: conservation, check
//! idempotence, replay prevention and block binding.

mod common;

use common::*;
use serde_json::json;
use strata_app::{App, AppConfig, TxResponse};
use strata_engine::transaction::hash_of;
use strata_primitives::ResultCode;

fn codes(responses: &[TxResponse]) -> Vec<ResultCode> {
    responses.iter().map(|r| r.code).collect()
}

// ── Test: transfer ──

#[test]
fn test_transfer_conserves_supply() {
    let mut app = start_app(test_config(), &standard_genesis());
    let before = total_supply(&app);
    let (alice_addr, alice_sk) = alice();
    let (bob_addr, bob_sk) = bob();

    let req = next_block(&app);
    let outcome = run_block(
        &mut app,
        req,
        &[
            transfer_tx(&alice_sk, 0, &bob_addr, 250),
            transfer_tx(&bob_sk, 0, &charlie().0, 75),
        ],
    );

    assert_eq!(codes(&outcome.txs), vec![ResultCode::Ok, ResultCode::Ok]);
    assert_eq!(balance(&app, &alice_addr), c(750));
    assert_eq!(balance(&app, &bob_addr), c(1_175));
    assert_eq!(balance(&app, &charlie().0), c(1_075));
    assert_eq!(total_supply(&app), before);

    let transfer = &outcome.txs[0].events[0];
    assert_eq!(transfer.kind, "transfer");
    assert_eq!(transfer.get("amount"), Some("250"));
    let tag = outcome.txs[0].events.last().unwrap();
    assert_eq!(tag.kind, "tx");
    assert_eq!(tag.get("tx.type"), Some("transfer"));
    assert_eq!(tag.get("tx.sender"), Some(alice_addr.to_hex().as_str()));
}

#[test]
fn test_rejected_transfer_changes_nothing() {
    let mut app = start_app(test_config(), &standard_genesis());
    let (alice_addr, alice_sk) = alice();

    let req = next_block(&app);
    let outcome = run_block(
        &mut app,
        req,
        &[
            transfer_tx(&alice_sk, 0, &bob().0, 1_001),
            transfer_tx(&alice_sk, 0, &alice_addr, 5),
            transfer_tx(&alice_sk, 0, &bob().0, 0),
        ],
    );

    assert_eq!(
        codes(&outcome.txs),
        vec![
            ResultCode::NotEnoughBalance,
            ResultCode::SelfTransaction,
            ResultCode::InvalidAmount,
        ]
    );
    assert!(outcome.txs.iter().all(|r| r.events.len() == 1));
    assert_eq!(balance(&app, &alice_addr), c(1_000));
    assert_eq!(balance(&app, &bob().0), c(1_000));
}

#[test]
fn test_deliver_sees_earlier_txs_in_block() {
    let mut app = start_app(test_config(), &standard_genesis());
    let (_, alice_sk) = alice();
    let (bob_addr, bob_sk) = bob();

    // bob can only afford the second transfer after receiving the first
    let req = next_block(&app);
    let outcome = run_block(
        &mut app,
        req,
        &[
            transfer_tx(&alice_sk, 0, &bob_addr, 500),
            transfer_tx(&bob_sk, 0, &charlie().0, 1_400),
        ],
    );
    assert_eq!(codes(&outcome.txs), vec![ResultCode::Ok, ResultCode::Ok]);
    assert_eq!(balance(&app, &bob_addr), c(100));
}

// ── Test: check_tx ──

#[test]
fn test_check_tx_is_idempotent() {
    let app = start_app(test_config(), &standard_genesis());
    let (_, alice_sk) = alice();
    let good = transfer_tx(&alice_sk, 0, &bob().0, 10);
    let bad = transfer_tx(&alice_sk, 0, &bob().0, 5_000);

    let first = app.check_tx(&good).unwrap();
    let second = app.check_tx(&good).unwrap();
    assert!(first.is_ok());
    assert_eq!(first, second);

    let first = app.check_tx(&bad).unwrap();
    assert_eq!(first.code, ResultCode::NotEnoughBalance);
    assert_eq!(app.check_tx(&bad).unwrap(), first);

    assert_eq!(app.store().pending_writes(), 0);
    assert_eq!(balance(&app, &alice().0), c(1_000));
}

#[test]
fn test_check_tx_reads_committed_view() {
    let mut app = start_app(test_config(), &standard_genesis());
    let (_, alice_sk) = alice();

    let req = next_block(&app);
    app.begin_block(req).unwrap();
    let drain = app.deliver_tx(&transfer_tx(&alice_sk, 0, &bob().0, 1_000)).unwrap();
    assert!(drain.is_ok());

    // the drained balance is not committed yet
    let resp = app.check_tx(&transfer_tx(&alice_sk, 0, &bob().0, 600)).unwrap();
    assert!(resp.is_ok());

    app.end_block(1).unwrap();
    app.commit().unwrap();
    let resp = app.check_tx(&transfer_tx(&alice_sk, 1, &bob().0, 600)).unwrap();
    assert_eq!(resp.code, ResultCode::NotEnoughBalance);
}

#[test]
fn test_malformed_and_forged_transactions() {
    let app = start_app(test_config(), &standard_genesis());
    let (alice_addr, alice_sk) = alice();

    assert_eq!(app.check_tx(b"not json").unwrap().code, ResultCode::BadParam);
    assert_eq!(
        app.check_tx(&tx(&alice_sk, "mint", 0, json!({}))).unwrap().code,
        ResultCode::Unknown
    );
    assert_eq!(
        app.check_tx(&tx(&alice_sk, "transfer", 0, json!({"to": 5}))).unwrap().code,
        ResultCode::BadParam
    );

    // swap the payload after signing
    let raw = transfer_tx(&alice_sk, 0, &bob().0, 10);
    let mut envelope: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    envelope["payload"]["amount"] = json!("999");
    let forged = serde_json::to_vec(&envelope).unwrap();
    assert_eq!(app.check_tx(&forged).unwrap().code, ResultCode::BadSignature);

    // claim another sender
    envelope["sender"] = json!(bob().0);
    envelope["payload"]["amount"] = json!("10");
    let forged = serde_json::to_vec(&envelope).unwrap();
    assert_eq!(app.check_tx(&forged).unwrap().code, ResultCode::BadSignature);
    assert_eq!(balance(&app, &alice_addr), c(1_000));
}

// ── Test: replay prevention ──

#[test]
fn test_replay_rejected_within_window() {
    let mut config = test_config();
    config.chain.block_binding_window = 100;
    let range = config.chain.tx_index_range;
    let mut app = start_app(config, &standard_genesis());
    let (_, alice_sk) = alice();
    let raw = transfer_tx(&alice_sk, 0, &bob().0, 10);

    // the same bytes twice in one block
    let req = next_block(&app);
    let outcome = run_block(&mut app, req, &[raw.clone(), raw.clone()]);
    assert_eq!(codes(&outcome.txs), vec![ResultCode::Ok, ResultCode::Replayed]);
    let delivered_at = app.state().height;

    // every later height inside [h, h + R - 1]
    while app.state().height < delivered_at + range - 1 {
        assert_eq!(app.check_tx(&raw).unwrap().code, ResultCode::Replayed);
        let req = next_block(&app);
        let outcome = run_block(&mut app, req, &[raw.clone()]);
        assert_eq!(codes(&outcome.txs), vec![ResultCode::Replayed]);
    }
    assert_eq!(balance(&app, &alice().0), c(990));

    // once the window has moved past h the index no longer remembers it
    let req = next_block(&app);
    assert_eq!(req.height, delivered_at + range);
    let outcome = run_block(&mut app, req, &[raw.clone()]);
    assert_eq!(codes(&outcome.txs), vec![ResultCode::Ok]);
    assert_eq!(balance(&app, &alice().0), c(980));

    // and the redelivery is protected in its own window
    let req = next_block(&app);
    let outcome = run_block(&mut app, req, &[raw]);
    assert_eq!(codes(&outcome.txs), vec![ResultCode::Replayed]);
}

#[test]
fn test_rejected_tx_still_consumes_hash() {
    let mut app = start_app(test_config(), &standard_genesis());
    let (_, alice_sk) = alice();
    let raw = transfer_tx(&alice_sk, 0, &bob().0, 5_000);

    let req = next_block(&app);
    let outcome = run_block(&mut app, req, &[raw.clone()]);
    assert_eq!(codes(&outcome.txs), vec![ResultCode::NotEnoughBalance]);

    let req = next_block(&app);
    let outcome = run_block(&mut app, req, &[raw]);
    assert_eq!(codes(&outcome.txs), vec![ResultCode::Replayed]);
}

fn wide_binding_config() -> AppConfig {
    let mut config = test_config();
    config.chain.block_binding_window = 100;
    config
}

#[test]
fn test_redelivery_after_window_keeps_newer_index() {
    let range = test_config().chain.tx_index_range;
    let mut app = start_app(wide_binding_config(), &standard_genesis());
    let (_, alice_sk) = alice();
    let raw = transfer_tx(&alice_sk, 0, &bob().0, 10);
    let hash = hash_of(&raw);

    let req = next_block(&app);
    let first_at = req.height;
    run_block(&mut app, req, &[raw.clone()]);
    while app.state().height < first_at + range - 2 {
        empty_block(&mut app);
    }

    // last height of the window still rejects
    let req = next_block(&app);
    assert_eq!(req.height, first_at + range - 1);
    let outcome = run_block(&mut app, req, &[raw.clone()]);
    assert_eq!(codes(&outcome.txs), vec![ResultCode::Replayed]);

    let req = next_block(&app);
    let second_at = req.height;
    assert_eq!(second_at, first_at + range);
    let outcome = run_block(&mut app, req, &[raw.clone()]);
    assert_eq!(codes(&outcome.txs), vec![ResultCode::Ok]);

    // pruning the first height left the newer pointer alone
    assert!(app.store().block_txs(first_at, true).unwrap().is_empty());
    assert_eq!(app.store().tx_height(&hash, true).unwrap(), Some(second_at));

    // only the persisted index remembers it across a restart
    let mut app = App::new(wide_binding_config(), app.into_store()).unwrap();
    assert_eq!(app.check_tx(&raw).unwrap().code, ResultCode::Replayed);
    let req = next_block(&app);
    let outcome = run_block(&mut app, req, &[raw.clone()]);
    assert_eq!(codes(&outcome.txs), vec![ResultCode::Replayed]);

    while app.state().height < second_at + range - 1 {
        assert_eq!(app.check_tx(&raw).unwrap().code, ResultCode::Replayed);
        empty_block(&mut app);
    }
    assert!(app.check_tx(&raw).unwrap().is_ok());
    assert_eq!(balance(&app, &alice().0), c(980));
}

#[test]
fn test_check_tx_ignores_block_in_progress() {
    let mut app = start_app(test_config(), &standard_genesis());
    let (_, alice_sk) = alice();
    let raw = transfer_tx(&alice_sk, 0, &bob().0, 10);

    let req = next_block(&app);
    app.begin_block(req).unwrap();
    assert!(app.deliver_tx(&raw).unwrap().is_ok());
    assert!(app.check_tx(&raw).unwrap().is_ok());

    app.end_block(1).unwrap();
    assert!(app.check_tx(&raw).unwrap().is_ok());

    app.commit().unwrap();
    assert_eq!(app.check_tx(&raw).unwrap().code, ResultCode::Replayed);
}

// ── Test: block binding ──

#[test]
fn test_block_binding_window() {
    let mut app = start_app(test_config(), &standard_genesis());
    for _ in 0..9 {
        empty_block(&mut app);
    }
    let (_, alice_sk) = alice();
    let window = app.config().chain.block_binding_window;
    assert_eq!(window, 5);

    // block 10 accepts declared heights 6..=10
    let req = next_block(&app);
    assert_eq!(req.height, 10);
    let outcome = run_block(
        &mut app,
        req,
        &[
            transfer_tx(&alice_sk, 1, &bob().0, 1),
            transfer_tx(&alice_sk, 5, &bob().0, 1),
            transfer_tx(&alice_sk, 6, &bob().0, 1),
            transfer_tx(&alice_sk, 10, &bob().0, 1),
            transfer_tx(&alice_sk, 11, &bob().0, 1),
        ],
    );
    assert_eq!(
        codes(&outcome.txs),
        vec![
            ResultCode::ImproperTxHeight,
            ResultCode::ImproperTxHeight,
            ResultCode::Ok,
            ResultCode::Ok,
            ResultCode::ImproperTxHeight,
        ]
    );

    // check_tx binds against the last committed height, now 10
    assert!(app.check_tx(&transfer_tx(&alice_sk, 10, &bob().0, 2)).unwrap().is_ok());
    assert_eq!(
        app.check_tx(&transfer_tx(&alice_sk, 11, &bob().0, 2)).unwrap().code,
        ResultCode::ImproperTxHeight
    );
    assert_eq!(
        app.check_tx(&transfer_tx(&alice_sk, 5, &bob().0, 2)).unwrap().code,
        ResultCode::ImproperTxHeight
    );
}

// ── Test: marketplace ──

const TARGET: &str = "AB01";

#[test]
fn test_request_and_grant_conserve_supply() {
    let mut app = start_app(test_config(), &standard_genesis());
    let before = total_supply(&app);
    let (alice_addr, alice_sk) = alice();
    let (bob_addr, bob_sk) = bob();

    let req = next_block(&app);
    let outcome = run_block(
        &mut app,
        req,
        &[
            register_tx(&alice_sk, 0, TARGET),
            request_tx(&bob_sk, 0, TARGET, 300),
        ],
    );
    assert_eq!(codes(&outcome.txs), vec![ResultCode::Ok, ResultCode::Ok]);
    assert_eq!(balance(&app, &bob_addr), c(700));
    assert_eq!(total_supply(&app), before);

    let req = next_block(&app);
    let outcome = run_block(
        &mut app,
        req,
        &[
            grant_tx(&alice_sk, 1, TARGET, &bob_addr),
            grant_tx(&alice_sk, 1, TARGET, &charlie().0),
        ],
    );
    assert_eq!(
        codes(&outcome.txs),
        vec![ResultCode::Ok, ResultCode::RequestNotFound]
    );
    assert_eq!(balance(&app, &alice_addr), c(1_300));
    assert_eq!(total_supply(&app), before);

    let usage = app.store().usage(&bob_addr, &hex::decode(TARGET).unwrap(), true).unwrap();
    assert_eq!(usage.unwrap().expire_height, 0);

    // a granted buyer cannot request again
    let resp = app.check_tx(&request_tx(&bob_sk, 2, TARGET, 10)).unwrap();
    assert_eq!(resp.code, ResultCode::AlreadyGranted);
}

#[test]
fn test_unanswered_request_expires_with_refund() {
    let mut app = start_app(test_config(), &standard_genesis());
    let expiry = app.config().chain.request_expiry;
    let (_, alice_sk) = alice();
    let (bob_addr, bob_sk) = bob();

    let req = next_block(&app);
    run_block(
        &mut app,
        req,
        &[
            register_tx(&alice_sk, 0, TARGET),
            request_tx(&bob_sk, 0, TARGET, 300),
        ],
    );
    let requested_at = app.state().height;

    while app.state().height < requested_at + expiry - 1 {
        let outcome = empty_block(&mut app);
        assert!(outcome.events_of("request_expired").is_empty());
    }
    assert_eq!(balance(&app, &bob_addr), c(700));

    let outcome = empty_block(&mut app);
    let expired = outcome.events_of("request_expired");
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].get("refund"), Some("300"));
    assert_eq!(balance(&app, &bob_addr), c(1_000));
}
