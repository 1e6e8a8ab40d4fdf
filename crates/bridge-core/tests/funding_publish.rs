//! Funding-rate publishing against an in-memory Solana node.

mod common;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;

use bridge_core::config::{FundingRateConfig, PLACEHOLDER_FUNDING_RATE_PROGRAM_ID};
use bridge_core::funding::codec::{encode_update, ACCOUNT_NAME};
use bridge_core::funding::{
    decode_update_payload, derive_address, FundingRatePublisher, FundingRateSnapshot,
    PublisherFactory, SolanaFundingPublisher, UpdatePayload,
};
use bridge_core::rpc::solana::ROOTED_CONFIRMATIONS;
use bridge_core::rpc::ConfirmOptions;
use bridge_core::BlockchainProviderType;

use common::*;

const AUTHORITY: u8 = 4;

fn program_id() -> [u8; 32] {
    chain_sol::decode_address(PLACEHOLDER_FUNDING_RATE_PROGRAM_ID).unwrap()
}

fn publisher(rpc: &Arc<FakeSolanaRpc>) -> SolanaFundingPublisher {
    SolanaFundingPublisher::new(
        rpc.clone(),
        program_id(),
        seed(AUTHORITY),
        ConfirmOptions::default(),
    )
}

fn snapshot(symbol: &str) -> FundingRateSnapshot {
    FundingRateSnapshot {
        symbol: symbol.to_string(),
        rate: Decimal::new(10, 2),
        hourly_rate: Decimal::new(125, 4),
        mark_price: Decimal::new(19025, 2),
        spot_price: Decimal::new(19000, 2),
        adjusted_spot_price: Decimal::new(19010, 2),
        premium: Decimal::new(-15, 2),
        premium_percentage: Decimal::new(-789, 4),
        factor_breakdown: BTreeMap::new(),
        calculated_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        valid_until: Utc.with_ymd_and_hms(2026, 3, 1, 13, 0, 0).unwrap(),
    }
}

/// Account bytes as the program would store them for `symbol`.
fn stored_account(symbol: &str, bump: u8) -> Vec<u8> {
    let payload = UpdatePayload::from_snapshot(&snapshot(symbol)).unwrap();
    let mut data = chain_sol::account_discriminator(ACCOUNT_NAME).to_vec();
    data.extend_from_slice(&chain_sol::public_key_from_seed(&[AUTHORITY; 32]));
    data.extend_from_slice(&(symbol.len() as u32).to_le_bytes());
    data.extend_from_slice(symbol.as_bytes());
    data.extend_from_slice(&encode_update(&payload).unwrap()[chain_sol::DISCRIMINATOR_LEN..]);
    data.push(bump);
    data
}

// ─── Addresses ───────────────────────────────────────────────────────

#[test]
fn account_address_is_the_funding_rate_pda() {
    let rpc = Arc::new(FakeSolanaRpc::default());
    let p = publisher(&rpc);
    let first = p.get_account_address("AAPL").unwrap();
    let second = p.get_account_address("AAPL").unwrap();
    assert_eq!(first, second);
    assert_eq!(first, derive_address(&program_id(), &[b"funding_rate", b"AAPL"]).unwrap());
    assert!(rpc.calls().is_empty());
}

// ─── Publish ─────────────────────────────────────────────────────────

#[tokio::test]
async fn first_publish_initialises_the_account() {
    let rpc = Arc::new(FakeSolanaRpc::default());
    let p = publisher(&rpc);
    let result = p.publish(&snapshot("AAPL"), &CancellationToken::new()).await;

    assert!(result.success, "{:?}", result.error_message);
    assert_eq!(result.provider_type, BlockchainProviderType::Solana);
    assert_eq!(result.confirmations, ROOTED_CONFIRMATIONS);
    assert_eq!(result.account_address, Some(p.get_account_address("AAPL").unwrap().address));
    assert!(result.published_at.is_some());
    assert_eq!(rpc.sent().len(), 2);
    assert_eq!(rpc.calls()[0], "getAccountInfo");
}

#[tokio::test]
async fn existing_account_gets_a_single_update() {
    let pda = derive_address(&program_id(), &[b"funding_rate", b"AAPL"]).unwrap();
    let stored = stored_account("AAPL", pda.bump);
    let rpc = Arc::new(FakeSolanaRpc::default().with_account(&pda.address, stored));
    let result = publisher(&rpc).publish(&snapshot("AAPL"), &CancellationToken::new()).await;
    assert!(result.success);

    let sent = rpc.sent();
    assert_eq!(sent.len(), 1);
    // Single-instruction legacy message: the instruction data ends the wire.
    let wire = &sent[0];
    let payload = decode_update_payload(&wire[wire.len() - 64..]).unwrap();
    assert_eq!(payload.rate_bps, 1000);
    assert_eq!(payload.hourly_rate_bps, 125);
    assert_eq!(payload.mark_price, 19_025_000_000);
    assert_eq!(payload.premium, -15_000_000);
    assert_eq!(payload.valid_until, 1_772_370_000);
    assert_eq!(result.transaction_hash, Some(bs58::encode(&wire[1..65]).into_string()));
}

#[tokio::test]
async fn bad_symbols_fail_without_network_access() {
    let rpc = Arc::new(FakeSolanaRpc::default());
    let p = publisher(&rpc);
    let long = "X".repeat(33);
    for symbol in ["", " AAPL", long.as_str()] {
        let result = p.publish(&snapshot(symbol), &CancellationToken::new()).await;
        assert!(!result.success);
        assert_eq!(result.account_address, None);
        assert!(result.error_message.unwrap().contains("invalid symbol"));
    }
    assert!(rpc.calls().is_empty());
}

#[tokio::test]
async fn unrepresentable_rates_fail_before_any_rpc() {
    let rpc = Arc::new(FakeSolanaRpc::default());
    let mut bad = snapshot("AAPL");
    bad.mark_price = Decimal::new(-1, 0);
    let result = publisher(&rpc).publish(&bad, &CancellationToken::new()).await;
    assert!(!result.success);
    assert!(result.account_address.is_some());
    assert!(rpc.calls().is_empty());
}

#[tokio::test]
async fn batch_failures_are_isolated() {
    let bad = derive_address(&program_id(), &[b"funding_rate", b"BAD"]).unwrap();
    let rpc = Arc::new(FakeSolanaRpc::default().reject_sends_touching(bad.bytes));
    let p = publisher(&rpc);

    let snapshots: BTreeMap<String, FundingRateSnapshot> = ["AAPL", "BAD", "MSFT"]
        .into_iter()
        .map(|s| (s.to_string(), snapshot(s)))
        .collect();
    let results = p.publish_batch(&snapshots, Some(2), &CancellationToken::new()).await;

    assert_eq!(results.len(), 3);
    assert!(results["AAPL"].success);
    assert!(results["MSFT"].success);
    let failed = &results["BAD"];
    assert!(!failed.success);
    assert_eq!(failed.account_address.as_deref(), Some(bad.address.as_str()));
    assert!(failed.error_message.as_deref().unwrap().contains("simulation failed"));
}

#[tokio::test]
async fn sequential_batch_publishes_every_symbol() {
    let rpc = Arc::new(FakeSolanaRpc::default());
    let snapshots: BTreeMap<String, FundingRateSnapshot> =
        ["A", "B"].into_iter().map(|s| (s.to_string(), snapshot(s))).collect();
    let results = publisher(&rpc).publish_batch(&snapshots, None, &CancellationToken::new()).await;
    assert!(results.values().all(|r| r.success));
    assert_eq!(rpc.sent().len(), 4);
}

// ─── Read back ───────────────────────────────────────────────────────

#[tokio::test]
async fn stored_rate_reads_back() {
    let pda = derive_address(&program_id(), &[b"funding_rate", b"AAPL"]).unwrap();
    let stored = stored_account("AAPL", pda.bump);
    let rpc = Arc::new(FakeSolanaRpc::default().with_account(&pda.address, stored));
    let p = publisher(&rpc);
    let cancel = CancellationToken::new();

    assert!(p.is_initialized("AAPL", &cancel).await.unwrap());
    let stored = p.read_funding_rate("AAPL", &cancel).await.unwrap().unwrap();
    assert_eq!(stored.symbol, "AAPL");
    assert_eq!(stored.rate, Decimal::new(1, 1));
    assert_eq!(stored.mark_price, Decimal::new(19025, 2));
    assert_eq!(stored.premium, Decimal::new(-15, 2));
    assert_eq!(stored.bump, pda.bump);
    assert_eq!(stored.authority, p.authority_address());

    assert!(!p.is_initialized("MSFT", &cancel).await.unwrap());
    assert!(p.read_funding_rate("MSFT", &cancel).await.unwrap().is_none());
}

// ─── Factory ─────────────────────────────────────────────────────────

fn solana_only() -> FundingRateConfig {
    FundingRateConfig {
        enabled_providers: vec![BlockchainProviderType::Solana],
        primary_provider: BlockchainProviderType::Solana,
    }
}

#[test]
fn ethereum_is_never_available() {
    let rpc = Arc::new(FakeSolanaRpc::default());
    let factory = PublisherFactory::new(&solana_only())
        .register(BlockchainProviderType::Solana, {
            let rpc = rpc.clone();
            move || Ok(Arc::new(publisher(&rpc)) as Arc<dyn FundingRatePublisher>)
        })
        .register(BlockchainProviderType::Ethereum, {
            let rpc = rpc.clone();
            move || Ok(Arc::new(publisher(&rpc)) as Arc<dyn FundingRatePublisher>)
        });

    assert!(factory.is_provider_available(BlockchainProviderType::Solana));
    assert!(!factory.is_provider_available(BlockchainProviderType::Ethereum));
    let err = factory.get_publisher(BlockchainProviderType::Ethereum).err().unwrap();
    assert_eq!(err.error_code(), "not_supported");
}

#[test]
fn publishers_are_constructed_lazily_and_once() {
    let built = Arc::new(AtomicUsize::new(0));
    let rpc = Arc::new(FakeSolanaRpc::default());
    let factory = PublisherFactory::new(&solana_only()).register(BlockchainProviderType::Solana, {
        let built = built.clone();
        move || {
            built.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(publisher(&rpc)) as Arc<dyn FundingRatePublisher>)
        }
    });

    assert_eq!(factory.enabled_providers(), &[BlockchainProviderType::Solana]);
    assert_eq!(built.load(Ordering::SeqCst), 0);
    let a = factory.get_primary_publisher().unwrap();
    let b = factory.get_publisher(BlockchainProviderType::Solana).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(factory.get_all_publishers().len(), 1);
    assert_eq!(built.load(Ordering::SeqCst), 1);
}

#[test]
fn primary_falls_back_to_the_next_enabled_provider() {
    let config = FundingRateConfig {
        enabled_providers: vec![BlockchainProviderType::Radix, BlockchainProviderType::Solana],
        primary_provider: BlockchainProviderType::Radix,
    };
    let rpc = Arc::new(FakeSolanaRpc::default());
    let factory = PublisherFactory::new(&config)
        .register(BlockchainProviderType::Radix, || {
            Err(bridge_core::BridgeError::Configuration("radix key missing".into()))
        })
        .register(BlockchainProviderType::Solana, move || {
            Ok(Arc::new(publisher(&rpc)) as Arc<dyn FundingRatePublisher>)
        });

    let primary = factory.get_primary_publisher().unwrap();
    assert_eq!(primary.provider(), BlockchainProviderType::Solana);
    assert_eq!(factory.get_all_publishers().len(), 1);
}
