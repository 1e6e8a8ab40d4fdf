//! Account lifecycle and transfers through the public bridge API, against
//! in-memory chains.

mod common;

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;

use bridge_core::rpc::IntentStatus;
use bridge_core::{Bridge, RadixBridge, SolanaBridge, TransactionStatus};
use chain_radix::RadixNetwork;
use crypto_utils::SeededRandom;

use common::*;

const TECHNICAL: u8 = 9;
const CLIENT: u8 = 1;
const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

fn solana_bridge(rpc: &Arc<FakeSolanaRpc>) -> SolanaBridge {
    SolanaBridge::new(rpc.clone(), seed(TECHNICAL), Arc::new(SeededRandom::new(3)))
}

fn radix_bridge(api: &Arc<FakeRadixApi>) -> RadixBridge {
    RadixBridge::new(
        api.clone(),
        RadixNetwork::Stokenet,
        seed(TECHNICAL),
        Arc::new(SeededRandom::new(3)),
    )
    .unwrap()
}

// ─── Accounts ────────────────────────────────────────────────────────

#[test]
fn solana_restore_matches_known_vector() {
    let rpc = Arc::new(FakeSolanaRpc::default());
    let keys = solana_bridge(&rpc).restore_account(TEST_MNEMONIC).unwrap();
    assert_eq!(keys.public_key, "HAgk14JpMQLgt6rVgv7cBQFJWFto5Dqxi472uT3DKpqk");
}

#[test]
fn created_accounts_restore_to_the_same_keys() {
    let rpc = Arc::new(FakeSolanaRpc::default());
    let sol = solana_bridge(&rpc);
    let account = sol.create_account().unwrap();
    assert_eq!(account.seed_phrase.words().len(), 12);
    let restored = sol.restore_account(&account.seed_phrase).unwrap();
    assert_eq!(restored.public_key, account.public_key);
    assert_eq!(restored.private_key, account.private_key);

    let api = Arc::new(FakeRadixApi::default());
    let rdx = radix_bridge(&api);
    let account = rdx.create_account().unwrap();
    assert_eq!(account.seed_phrase.words().len(), 24);
    assert!(account.public_key.starts_with("account_tdx_2_1"));
    let restored = rdx.restore_account(&account.seed_phrase).unwrap();
    assert_eq!(restored.public_key, account.public_key);
}

#[test]
fn bad_phrases_are_rejected_without_network_access() {
    let rpc = Arc::new(FakeSolanaRpc::default());
    let sol = solana_bridge(&rpc);
    let phrases = [
        "",
        "abandon abandon",
        "not a real bip39 phrase at all but twelve words long ok",
    ];
    for phrase in phrases {
        let err = sol.restore_account(phrase).unwrap_err();
        assert_eq!(err.error_code(), "invalid_seed_phrase", "phrase {phrase:?}");
    }
    // A Solana-length phrase is the wrong shape for Radix.
    let api = Arc::new(FakeRadixApi::default());
    let err = radix_bridge(&api).restore_account(TEST_MNEMONIC).unwrap_err();
    assert_eq!(err.error_code(), "invalid_seed_phrase");

    assert!(rpc.calls().is_empty());
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn unknown_accounts_hold_zero() {
    let rpc = Arc::new(FakeSolanaRpc::default());
    let address = chain_sol::address_from_seed(&[CLIENT; 32]);
    let balance = solana_bridge(&rpc)
        .get_account_balance(&address, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(balance, Decimal::ZERO);
}

// ─── Solana transfers ────────────────────────────────────────────────

#[tokio::test]
async fn solana_self_transfers_never_reach_the_chain() {
    let rpc = Arc::new(FakeSolanaRpc::default());
    let bridge = solana_bridge(&rpc);
    let technical = bridge.technical_address().to_string();
    let cancel = CancellationToken::new();

    let err = bridge.deposit(Decimal::ONE, &technical, &cancel).await.unwrap_err();
    assert_eq!(err.error_code(), "self_transaction");
    let err = bridge
        .withdraw(Decimal::ONE, &format!(" {technical} "), &seed(TECHNICAL), &cancel)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "self_transaction");

    assert!(rpc.calls().is_empty());
}

#[tokio::test]
async fn solana_withdraw_checks_key_ownership() {
    let rpc = Arc::new(FakeSolanaRpc::default());
    let sender = solana_wallet(CLIENT);
    let err = solana_bridge(&rpc)
        .withdraw(Decimal::ONE, &sender.public_key, &seed(2), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "invalid_key");
    assert!(rpc.calls().is_empty());
}

#[tokio::test]
async fn solana_shortfalls_are_reported_not_sent() {
    let sender = solana_wallet(CLIENT);
    let rpc =
        Arc::new(FakeSolanaRpc::default().with_balance(&sender.public_key, LAMPORTS_PER_SOL / 2));
    let result = solana_bridge(&rpc)
        .withdraw(Decimal::ONE, &sender.public_key, &sender.private_key, &CancellationToken::new())
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.status, TransactionStatus::InsufficientFunds);
    assert_eq!(result.transaction_id, None);
    assert_eq!(result.data.as_deref(), Some("0.5"));
    assert_eq!(rpc.calls(), vec!["getBalance"]);
    assert!(rpc.sent().is_empty());
}

#[tokio::test]
async fn solana_balance_must_cover_the_fee() {
    let sender = solana_wallet(CLIENT);
    let rpc = Arc::new(FakeSolanaRpc::default().with_balance(&sender.public_key, LAMPORTS_PER_SOL));
    let result = solana_bridge(&rpc)
        .withdraw(Decimal::ONE, &sender.public_key, &sender.private_key, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(result.status, TransactionStatus::InsufficientFundsForFee);
    assert!(rpc.sent().is_empty());
}

#[tokio::test]
async fn solana_withdraw_sends_one_signed_transfer() {
    let sender = solana_wallet(CLIENT);
    let rpc =
        Arc::new(FakeSolanaRpc::default().with_balance(&sender.public_key, 2 * LAMPORTS_PER_SOL));
    let result = solana_bridge(&rpc)
        .withdraw(Decimal::ONE, &sender.public_key, &sender.private_key, &CancellationToken::new())
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.status, TransactionStatus::Pending);
    assert_eq!(rpc.calls(), vec!["getBalance", "getLatestBlockhash", "sendTransaction"]);

    let sent = rpc.sent();
    assert_eq!(sent.len(), 1);
    let wire = &sent[0];
    assert_eq!(result.transaction_id, Some(bs58::encode(&wire[1..65]).into_string()));
    let technical = chain_sol::public_key_from_seed(&[TECHNICAL; 32]);
    assert!(wire.windows(32).any(|w| w == technical));
    assert!(wire.windows(32).any(|w| w == BLOCKHASH));
}

#[tokio::test]
async fn solana_rejects_sub_lamport_amounts() {
    let receiver = solana_wallet(CLIENT);
    let rpc = Arc::new(FakeSolanaRpc::default());
    let cancel = CancellationToken::new();
    let bridge = solana_bridge(&rpc);

    for amount in [Decimal::ZERO, Decimal::new(1, 12), Decimal::new(-1, 0)] {
        let err = bridge.deposit(amount, &receiver.public_key, &cancel).await.unwrap_err();
        assert_eq!(err.error_code(), "invalid_amount", "amount {amount}");
    }
    assert!(rpc.calls().is_empty());
}

#[tokio::test]
async fn solana_status_mapping() {
    let rpc = Arc::new(
        FakeSolanaRpc::default()
            .with_transaction("ok", None)
            .with_transaction("failed", Some(r#"{"InstructionError":[0,"Custom"]}"#)),
    );
    let bridge = solana_bridge(&rpc);
    let cancel = CancellationToken::new();
    let expected = [
        ("ok", TransactionStatus::Completed),
        ("failed", TransactionStatus::Canceled),
        ("missing", TransactionStatus::NotFound),
    ];
    for (signature, status) in expected {
        assert_eq!(bridge.get_transaction_status(signature, &cancel).await.unwrap(), status);
    }
}

// ─── Radix transfers ─────────────────────────────────────────────────

#[tokio::test]
async fn radix_deposit_submits_a_notarised_transfer() {
    let api = Arc::new(FakeRadixApi::default());
    let bridge = radix_bridge(&api);
    let xrd = RadixNetwork::Stokenet.xrd_resource_address();
    api.balances.lock().unwrap().insert(
        (bridge.technical_address().to_string(), xrd.to_string()),
        Decimal::from(100),
    );

    let receiver = radix_wallet(CLIENT, RadixNetwork::Stokenet);
    let result = bridge
        .deposit(Decimal::new(25, 1), &receiver.public_key, &CancellationToken::new())
        .await
        .unwrap();

    assert!(result.success);
    assert!(result.transaction_id.unwrap().starts_with("txid_tdx_2_1"));
    assert_eq!(api.calls(), vec!["balance", "construction", "submit"]);

    // A V1 notarised payload naming the receiver's account.
    let submitted = api.submitted();
    assert_eq!(submitted.len(), 1);
    assert!(submitted[0].starts_with("4d22030221022104"));
    let receiver_node = chain_radix::node_id(&receiver.public_key, RadixNetwork::Stokenet).unwrap();
    assert!(submitted[0].contains(&hex::encode(receiver_node)));
}

#[tokio::test]
async fn radix_fee_headroom_is_ten_xrd() {
    let sender = radix_wallet(CLIENT, RadixNetwork::Stokenet);
    let xrd = RadixNetwork::Stokenet.xrd_resource_address();
    let api =
        Arc::new(FakeRadixApi::default().with_balance(&sender.public_key, xrd, Decimal::from(15)));
    let bridge = radix_bridge(&api);
    let cancel = CancellationToken::new();

    let result = bridge
        .withdraw(Decimal::from(6), &sender.public_key, &sender.private_key, &cancel)
        .await
        .unwrap();
    assert_eq!(result.status, TransactionStatus::InsufficientFundsForFee);

    let result = bridge
        .withdraw(Decimal::from(20), &sender.public_key, &sender.private_key, &cancel)
        .await
        .unwrap();
    assert_eq!(result.status, TransactionStatus::InsufficientFunds);
    assert_eq!(result.data.as_deref(), Some("15"));

    assert!(api.submitted().is_empty());
}

#[tokio::test]
async fn radix_rejects_addresses_from_another_network() {
    let api = Arc::new(FakeRadixApi::default());
    let mainnet = radix_wallet(CLIENT, RadixNetwork::Mainnet);
    let err = radix_bridge(&api)
        .deposit(Decimal::ONE, &mainnet.public_key, &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "invalid_address");
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn radix_status_mapping() {
    let api = Arc::new(
        FakeRadixApi::default()
            .with_status("txid_a", IntentStatus::CommittedSuccess)
            .with_status("txid_b", IntentStatus::CommittedFailure)
            .with_status("txid_c", IntentStatus::InMempool),
    );
    let bridge = radix_bridge(&api);
    let cancel = CancellationToken::new();
    let expected = [
        ("txid_a", TransactionStatus::Completed),
        ("txid_b", TransactionStatus::Canceled),
        ("txid_c", TransactionStatus::Pending),
        ("txid_d", TransactionStatus::NotFound),
    ];
    for (transaction_id, status) in expected {
        assert_eq!(bridge.get_transaction_status(transaction_id, &cancel).await.unwrap(), status);
    }
}
