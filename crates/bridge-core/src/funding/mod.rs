//! Publishing funding-rate snapshots on chain.
//!
//! Each symbol owns one program-derived account. The first publish for a
//! symbol initialises it; every later publish overwrites it with the
//! latest snapshot. Publish attempts never fail with `Err`: the outcome,
//! good or bad, is an [`OnChainPublishResult`].

pub mod address;
pub mod codec;
pub mod factory;
pub mod solana;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{BridgeError, Result};
use crate::types::BlockchainProviderType;

pub use address::{derive_address, AddressDeriver, ProgramDerivedAddress};
pub use codec::{decode_update_payload, OnChainFundingRate, UpdatePayload};
pub use factory::PublisherFactory;
pub use solana::SolanaFundingPublisher;

/// A computed funding rate, as produced by the pricing engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingRateSnapshot {
    pub symbol: String,
    pub rate: Decimal,
    pub hourly_rate: Decimal,
    pub mark_price: Decimal,
    pub spot_price: Decimal,
    pub adjusted_spot_price: Decimal,
    pub premium: Decimal,
    pub premium_percentage: Decimal,
    #[serde(default)]
    pub factor_breakdown: BTreeMap<String, Decimal>,
    pub calculated_at: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnChainPublishResult {
    pub success: bool,
    pub transaction_hash: Option<String>,
    pub account_address: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub confirmations: u32,
    pub error_message: Option<String>,
    pub provider_type: BlockchainProviderType,
}

impl OnChainPublishResult {
    pub fn published(
        provider_type: BlockchainProviderType,
        transaction_hash: String,
        account_address: String,
        confirmations: u32,
    ) -> Self {
        Self {
            success: true,
            transaction_hash: Some(transaction_hash),
            account_address: Some(account_address),
            published_at: Some(Utc::now()),
            confirmations,
            error_message: None,
            provider_type,
        }
    }

    pub fn failed(
        provider_type: BlockchainProviderType,
        account_address: Option<String>,
        error: &BridgeError,
    ) -> Self {
        Self {
            success: false,
            transaction_hash: None,
            account_address,
            published_at: None,
            confirmations: 0,
            error_message: Some(error.to_string()),
            provider_type,
        }
    }
}

#[async_trait]
pub trait FundingRatePublisher: Send + Sync {
    fn provider(&self) -> BlockchainProviderType;

    /// The account a symbol's rate is stored in. No network access.
    fn get_account_address(&self, symbol: &str) -> Result<ProgramDerivedAddress>;

    async fn is_initialized(&self, symbol: &str, cancel: &CancellationToken) -> Result<bool>;

    /// Initialise the symbol's account if needed, then write `snapshot`.
    async fn publish(
        &self,
        snapshot: &FundingRateSnapshot,
        cancel: &CancellationToken,
    ) -> OnChainPublishResult;

    /// Read back what is stored for `symbol`, if anything.
    async fn read_funding_rate(
        &self,
        symbol: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<OnChainFundingRate>>;

    /// Publish each entry independently; one failure never stops the rest.
    ///
    /// `concurrency` of `None` or `Some(1)` publishes one symbol at a time.
    async fn publish_batch(
        &self,
        snapshots: &BTreeMap<String, FundingRateSnapshot>,
        concurrency: Option<usize>,
        cancel: &CancellationToken,
    ) -> BTreeMap<String, OnChainPublishResult> {
        let limit = concurrency.unwrap_or(1).max(1);
        let jobs: Vec<_> = snapshots
            .iter()
            .map(|(symbol, snapshot)| {
                self.publish(snapshot, cancel)
                    .map(move |result| (symbol.clone(), result))
            })
            .collect();
        stream::iter(jobs).buffer_unordered(limit).collect().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_deserializes_from_camel_case_json() {
        let snapshot: FundingRateSnapshot = serde_json::from_str(
            r#"{
                "symbol": "AAPL",
                "rate": "0.10",
                "hourlyRate": "0.0125",
                "markPrice": "190.25",
                "spotPrice": "190.00",
                "adjustedSpotPrice": "190.10",
                "premium": "-0.15",
                "premiumPercentage": "-0.0789",
                "calculatedAt": "2026-01-01T00:00:00Z",
                "validUntil": "2026-01-01T01:00:00Z"
            }"#,
        )
        .unwrap();
        assert_eq!(snapshot.symbol, "AAPL");
        assert_eq!(snapshot.rate, Decimal::new(10, 2));
        assert!(snapshot.factor_breakdown.is_empty());
        assert_eq!(snapshot.valid_until.timestamp(), 1_767_229_200);
    }

    #[test]
    fn failed_result_carries_the_error() {
        let err = BridgeError::infrastructure("sendTransaction", "timeout");
        let result =
            OnChainPublishResult::failed(BlockchainProviderType::Solana, Some("pda".into()), &err);
        assert!(!result.success);
        assert_eq!(result.confirmations, 0);
        assert_eq!(result.error_message.as_deref(), Some("sendTransaction failed: timeout"));
        assert_eq!(result.account_address.as_deref(), Some("pda"));
    }
}
