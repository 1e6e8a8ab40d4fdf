//! In-memory chain fakes shared by the integration tests.
//!
//! Every fake records the calls it receives so tests can assert that a
//! rejected request never reached the network.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use bech32::{Bech32m, Hrp};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;

use bridge_core::error::{BridgeError, Result};
use bridge_core::nft::{MetadataStorage, NftMetadata, OffChainMetadata, WalletResolver};
use bridge_core::rpc::{
    AccountInfo, Commitment, ConstructionMetadata, IntentStatus, RadixCoreApi, SignatureStatus,
    SolanaRpc, TransactionOutcome,
};
use bridge_core::{BlockchainProviderType, WalletKeyPair};
use chain_radix::RadixNetwork;
use crypto_utils::SecretSeed;

pub const TEST_MNEMONIC: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

pub const BLOCKHASH: [u8; 32] = [7u8; 32];

pub fn seed(byte: u8) -> SecretSeed {
    SecretSeed::new([byte; 32])
}

pub fn solana_wallet(byte: u8) -> WalletKeyPair {
    WalletKeyPair {
        public_key: chain_sol::address_from_seed(&[byte; 32]),
        private_key: seed(byte),
        seed_phrase: None,
    }
}

pub fn radix_wallet(byte: u8, network: RadixNetwork) -> WalletKeyPair {
    WalletKeyPair {
        public_key: chain_radix::account_address_from_seed(&[byte; 32], network).unwrap(),
        private_key: seed(byte),
        seed_phrase: None,
    }
}

fn bech32m(hrp: &str, entity: u8, fill: u8) -> String {
    let mut data = [fill; 30];
    data[0] = entity;
    bech32::encode::<Bech32m>(Hrp::parse(hrp).unwrap(), &data).unwrap()
}

/// A non-fungible resource address on `network`.
pub fn nft_resource_address(network: RadixNetwork, fill: u8) -> String {
    bech32m(&network.resource_hrp(), 0x9A, fill)
}

/// A global component address on `network`.
pub fn component_address(network: RadixNetwork, fill: u8) -> String {
    bech32m(&network.component_hrp(), 0xC0, fill)
}

// ─── Solana ──────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeSolanaRpc {
    pub balances: Mutex<HashMap<String, u64>>,
    pub accounts: Mutex<HashMap<String, AccountInfo>>,
    pub token_balances: Mutex<HashMap<String, u64>>,
    pub transactions: Mutex<HashMap<String, TransactionOutcome>>,
    /// Sends whose wire bytes mention any of these keys fail.
    pub reject_accounts: Mutex<Vec<[u8; 32]>>,
    pub sent: Mutex<Vec<Vec<u8>>>,
    pub calls: Mutex<Vec<&'static str>>,
}

impl FakeSolanaRpc {
    pub fn with_balance(self, address: &str, lamports: u64) -> Self {
        self.balances.lock().unwrap().insert(address.to_string(), lamports);
        self
    }

    pub fn with_account(self, address: &str, data: Vec<u8>) -> Self {
        self.accounts.lock().unwrap().insert(
            address.to_string(),
            AccountInfo {
                lamports: 1_000_000,
                owner: chain_sol::encode_address(&[0u8; 32]),
                data,
                executable: false,
            },
        );
        self
    }

    pub fn with_token_balance(self, address: &str, amount: u64) -> Self {
        self.token_balances.lock().unwrap().insert(address.to_string(), amount);
        self
    }

    pub fn with_transaction(self, signature: &str, err: Option<&str>) -> Self {
        self.transactions.lock().unwrap().insert(
            signature.to_string(),
            TransactionOutcome {
                slot: 42,
                err: err.map(str::to_string),
            },
        );
        self
    }

    pub fn reject_sends_touching(self, account: [u8; 32]) -> Self {
        self.reject_accounts.lock().unwrap().push(account);
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl SolanaRpc for FakeSolanaRpc {
    async fn get_balance(&self, address: &str, _cancel: &CancellationToken) -> Result<u64> {
        self.record("getBalance");
        Ok(self.balances.lock().unwrap().get(address).copied().unwrap_or(0))
    }

    async fn get_latest_blockhash(&self, _cancel: &CancellationToken) -> Result<[u8; 32]> {
        self.record("getLatestBlockhash");
        Ok(BLOCKHASH)
    }

    async fn send_transaction(&self, wire: &[u8], _cancel: &CancellationToken) -> Result<String> {
        self.record("sendTransaction");
        let rejected = self
            .reject_accounts
            .lock()
            .unwrap()
            .iter()
            .any(|key| wire.windows(32).any(|w| w == key));
        if rejected {
            return Err(BridgeError::infrastructure("sendTransaction", "simulation failed"));
        }
        self.sent.lock().unwrap().push(wire.to_vec());
        // One compact-u16 length byte, then the fee payer's signature.
        Ok(bs58::encode(&wire[1..65]).into_string())
    }

    async fn get_signature_status(
        &self,
        _signature: &str,
        _cancel: &CancellationToken,
    ) -> Result<Option<SignatureStatus>> {
        self.record("getSignatureStatuses");
        Ok(Some(SignatureStatus {
            confirmations: None,
            confirmation_status: Some(Commitment::Finalized),
            err: None,
        }))
    }

    async fn get_account_info(
        &self,
        address: &str,
        _cancel: &CancellationToken,
    ) -> Result<Option<AccountInfo>> {
        self.record("getAccountInfo");
        Ok(self.accounts.lock().unwrap().get(address).cloned())
    }

    async fn get_transaction(
        &self,
        signature: &str,
        _cancel: &CancellationToken,
    ) -> Result<Option<TransactionOutcome>> {
        self.record("getTransaction");
        Ok(self.transactions.lock().unwrap().get(signature).cloned())
    }

    async fn get_token_account_balance(
        &self,
        address: &str,
        _cancel: &CancellationToken,
    ) -> Result<Option<u64>> {
        self.record("getTokenAccountBalance");
        Ok(self.token_balances.lock().unwrap().get(address).copied())
    }

    async fn get_minimum_balance_for_rent_exemption(
        &self,
        _space: u64,
        _cancel: &CancellationToken,
    ) -> Result<u64> {
        self.record("getMinimumBalanceForRentExemption");
        Ok(1_461_600)
    }
}

// ─── Radix ───────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeRadixApi {
    pub balances: Mutex<HashMap<(String, String), Decimal>>,
    pub non_fungible_amounts: Mutex<HashMap<(String, String), Decimal>>,
    pub statuses: Mutex<HashMap<String, IntentStatus>>,
    /// Status of intents not in `statuses`; `NotSeen` when unset.
    pub default_status: Mutex<Option<IntentStatus>>,
    /// Local ids any committed intent reports as minted, per resource.
    pub minted: Mutex<HashMap<String, Vec<String>>>,
    pub non_fungibles: Mutex<HashMap<(String, String), BTreeMap<String, String>>>,
    pub submitted: Mutex<Vec<String>>,
    pub calls: Mutex<Vec<&'static str>>,
}

impl FakeRadixApi {
    pub fn with_balance(self, account: &str, resource: &str, amount: Decimal) -> Self {
        self.balances
            .lock()
            .unwrap()
            .insert((account.to_string(), resource.to_string()), amount);
        self
    }

    pub fn with_non_fungible_amount(self, account: &str, resource: &str, amount: Decimal) -> Self {
        self.non_fungible_amounts
            .lock()
            .unwrap()
            .insert((account.to_string(), resource.to_string()), amount);
        self
    }

    pub fn with_status(self, intent_hash: &str, status: IntentStatus) -> Self {
        self.statuses.lock().unwrap().insert(intent_hash.to_string(), status);
        self
    }

    /// Every submitted intent reports `status`.
    pub fn with_default_status(self, status: IntentStatus) -> Self {
        *self.default_status.lock().unwrap() = Some(status);
        self
    }

    pub fn with_minted(self, resource: &str, local_ids: &[&str]) -> Self {
        self.minted.lock().unwrap().insert(
            resource.to_string(),
            local_ids.iter().map(|id| id.to_string()).collect(),
        );
        self
    }

    pub fn with_non_fungible(
        self,
        resource: &str,
        local_id: &str,
        fields: &[(&str, &str)],
    ) -> Self {
        self.non_fungibles.lock().unwrap().insert(
            (resource.to_string(), local_id.to_string()),
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn submitted(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RadixCoreApi for FakeRadixApi {
    async fn construction_metadata(
        &self,
        _cancel: &CancellationToken,
    ) -> Result<ConstructionMetadata> {
        self.record("construction");
        Ok(ConstructionMetadata {
            current_epoch: 1_000,
            ledger_unix_timestamp_ms: 1_767_225_600_000,
        })
    }

    async fn submit(&self, notarized_hex: &str, _cancel: &CancellationToken) -> Result<bool> {
        self.record("submit");
        self.submitted.lock().unwrap().push(notarized_hex.to_string());
        Ok(false)
    }

    async fn transaction_status(
        &self,
        intent_hash: &str,
        _cancel: &CancellationToken,
    ) -> Result<IntentStatus> {
        self.record("status");
        let known = self.statuses.lock().unwrap().get(intent_hash).copied();
        let fallback = self.default_status.lock().unwrap().unwrap_or(IntentStatus::NotSeen);
        Ok(known.unwrap_or(fallback))
    }

    async fn resource_balance(
        &self,
        account: &str,
        resource: &str,
        _cancel: &CancellationToken,
    ) -> Result<Decimal> {
        self.record("balance");
        Ok(self
            .balances
            .lock()
            .unwrap()
            .get(&(account.to_string(), resource.to_string()))
            .copied()
            .unwrap_or(Decimal::ZERO))
    }

    async fn non_fungible_data(
        &self,
        resource: &str,
        local_id: &str,
        _cancel: &CancellationToken,
    ) -> Result<Option<BTreeMap<String, String>>> {
        self.record("non_fungible");
        Ok(self
            .non_fungibles
            .lock()
            .unwrap()
            .get(&(resource.to_string(), local_id.to_string()))
            .cloned())
    }

    async fn non_fungible_amount(
        &self,
        account: &str,
        resource: &str,
        _cancel: &CancellationToken,
    ) -> Result<Decimal> {
        self.record("non_fungible_amount");
        Ok(self
            .non_fungible_amounts
            .lock()
            .unwrap()
            .get(&(account.to_string(), resource.to_string()))
            .copied()
            .unwrap_or(Decimal::ZERO))
    }

    async fn committed_non_fungible_ids(
        &self,
        _intent_hash: &str,
        resource: &str,
        _cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        self.record("receipt");
        Ok(self.minted.lock().unwrap().get(resource).cloned().unwrap_or_default())
    }
}

// ─── NFT collaborators ───────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryStorage {
    documents: Mutex<HashMap<String, OffChainMetadata>>,
}

impl MemoryStorage {
    pub fn insert(&self, uri: &str, document: OffChainMetadata) {
        self.documents.lock().unwrap().insert(uri.to_string(), document);
    }
}

#[async_trait]
impl MetadataStorage for MemoryStorage {
    async fn serialize(
        &self,
        metadata: &NftMetadata,
        _cancel: &CancellationToken,
    ) -> Result<String> {
        let mut documents = self.documents.lock().unwrap();
        let uri = format!("https://meta.test/{}.json", documents.len() + 1);
        documents.insert(uri.clone(), OffChainMetadata::from(metadata));
        Ok(uri)
    }

    async fn fetch(&self, uri: &str, _cancel: &CancellationToken) -> Result<OffChainMetadata> {
        self.documents
            .lock()
            .unwrap()
            .get(uri)
            .cloned()
            .ok_or_else(|| {
                BridgeError::infrastructure("fetch_metadata", format!("{uri} not found"))
            })
    }
}

pub struct FixedWallet(pub WalletKeyPair);

#[async_trait]
impl WalletResolver for FixedWallet {
    async fn get_wallet(
        &self,
        _network: BlockchainProviderType,
        _cancel: &CancellationToken,
    ) -> Result<WalletKeyPair> {
        Ok(self.0.clone())
    }
}
