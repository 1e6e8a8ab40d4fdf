//! Chain transports.
//!
//! The bridges, NFT managers and publishers only ever talk to a chain
//! through [`SolanaRpc`] or [`RadixCoreApi`]. The HTTP implementations live
//! in [`solana`] and [`radix`]; tests substitute in-memory fakes.

pub mod radix;
pub mod solana;

use std::collections::BTreeMap;
use std::future::Future;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{BridgeError, Result};

pub use radix::{submit_manifest, wait_for_commit, CommitOptions, HttpRadixCoreApi};
pub use solana::{send_instructions, wait_for_confirmation, ConfirmOptions, HttpSolanaRpc};

/// Race `fut` against `cancel`.
pub async fn with_cancel<T, F>(operation: &str, cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(BridgeError::cancelled(operation)),
        result = fut => result,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }
}

/// An entry of `getSignatureStatuses`.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureStatus {
    /// `None` once the block is rooted.
    pub confirmations: Option<u64>,
    pub confirmation_status: Option<Commitment>,
    pub err: Option<String>,
}

/// `getAccountInfo` with decoded data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub lamports: u64,
    pub owner: String,
    pub data: Vec<u8>,
    pub executable: bool,
}

/// The parts of `getTransaction` the bridge reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOutcome {
    pub slot: u64,
    /// `meta.err`, rendered as JSON.
    pub err: Option<String>,
}

#[async_trait]
pub trait SolanaRpc: Send + Sync {
    /// Lamports held by `address`; unknown accounts hold zero.
    async fn get_balance(&self, address: &str, cancel: &CancellationToken) -> Result<u64>;

    async fn get_latest_blockhash(&self, cancel: &CancellationToken) -> Result<[u8; 32]>;

    /// Submit base64 wire bytes; returns the signature the node reports.
    async fn send_transaction(&self, wire: &[u8], cancel: &CancellationToken) -> Result<String>;

    async fn get_signature_status(
        &self,
        signature: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<SignatureStatus>>;

    async fn get_account_info(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<AccountInfo>>;

    async fn get_transaction(
        &self,
        signature: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<TransactionOutcome>>;

    /// Raw token amount of an SPL token account; `None` if it does not exist.
    async fn get_token_account_balance(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<u64>>;

    async fn get_minimum_balance_for_rent_exemption(
        &self,
        space: u64,
        cancel: &CancellationToken,
    ) -> Result<u64>;
}

/// `/transaction/construction` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructionMetadata {
    pub current_epoch: u64,
    pub ledger_unix_timestamp_ms: i64,
}

/// Intent status as reported by `/transaction/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum IntentStatus {
    CommittedSuccess,
    CommittedFailure,
    PermanentRejection,
    InMempool,
    NotSeen,
    FateUncertain,
    FateUncertainButLikelyRejection,
    LikelyButNotCertainRejection,
}

#[async_trait]
pub trait RadixCoreApi: Send + Sync {
    async fn construction_metadata(
        &self,
        cancel: &CancellationToken,
    ) -> Result<ConstructionMetadata>;

    /// Submit a notarised payload. `Ok(true)` means the node already knew it.
    async fn submit(&self, notarized_hex: &str, cancel: &CancellationToken) -> Result<bool>;

    async fn transaction_status(
        &self,
        intent_hash: &str,
        cancel: &CancellationToken,
    ) -> Result<IntentStatus>;

    /// Balance of `resource` in `account`; zero when the account is unknown.
    async fn resource_balance(
        &self,
        account: &str,
        resource: &str,
        cancel: &CancellationToken,
    ) -> Result<Decimal>;

    /// Named string fields of a non-fungible's data, `None` if it does not exist.
    async fn non_fungible_data(
        &self,
        resource: &str,
        local_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<BTreeMap<String, String>>>;

    /// How many non-fungibles of `resource` sit in `account`'s vaults.
    async fn non_fungible_amount(
        &self,
        account: &str,
        resource: &str,
        cancel: &CancellationToken,
    ) -> Result<Decimal>;

    /// Local ids of `resource` minted by a committed intent.
    async fn committed_non_fungible_ids(
        &self,
        intent_hash: &str,
        resource: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>>;
}
