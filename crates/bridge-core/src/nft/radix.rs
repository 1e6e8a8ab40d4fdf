use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use chain_radix::{ManifestBuilder, ManifestValue, RadixNetwork};
use crypto_utils::SecureRandom;

use super::{
    BurnRequest, MetadataStorage, MintResult, Nft, NftManager, NftMetadata, OffChainMetadata,
    WalletResolver,
};
use crate::bridge::radix::LOCK_FEE_XRD;
use crate::config::RadixConfig;
use crate::error::{BridgeError, Result, ValidationError};
use crate::rpc::{submit_manifest, wait_for_commit, CommitOptions, RadixCoreApi};
use crate::telemetry::observe;
use crate::types::{BlockchainProviderType, WalletKeyPair};

/// NFTs minted through a minter component. A mint address is
/// `<resource_address>:<local_id>`.
pub struct RadixNftManager {
    api: Arc<dyn RadixCoreApi>,
    network: RadixNetwork,
    minter_component: String,
    nft_resource: String,
    storage: Arc<dyn MetadataStorage>,
    wallets: Arc<dyn WalletResolver>,
    rng: Arc<dyn SecureRandom>,
    commit: CommitOptions,
}

impl RadixNftManager {
    pub fn new(
        api: Arc<dyn RadixCoreApi>,
        network: RadixNetwork,
        minter_component: String,
        nft_resource: String,
        storage: Arc<dyn MetadataStorage>,
        wallets: Arc<dyn WalletResolver>,
        rng: Arc<dyn SecureRandom>,
    ) -> Result<Self> {
        chain_radix::validate_component_address(&minter_component, network)?;
        chain_radix::validate_resource_address(&nft_resource, network)?;
        Ok(Self {
            api,
            network,
            minter_component,
            nft_resource,
            storage,
            wallets,
            rng,
            commit: CommitOptions::default(),
        })
    }

    pub fn with_commit_options(mut self, commit: CommitOptions) -> Self {
        self.commit = commit;
        self
    }

    /// Component and resource come from `[radix]`; both must be set.
    pub fn from_config(
        config: &RadixConfig,
        api: Arc<dyn RadixCoreApi>,
        storage: Arc<dyn MetadataStorage>,
        wallets: Arc<dyn WalletResolver>,
        rng: Arc<dyn SecureRandom>,
    ) -> Result<Self> {
        let missing = |key: &str| BridgeError::Configuration(format!("radix.{key} is not set"));
        let component = config
            .nft_minter_component
            .clone()
            .ok_or_else(|| missing("nft_minter_component"))?;
        let resource = config
            .nft_resource_address
            .clone()
            .ok_or_else(|| missing("nft_resource_address"))?;
        Ok(Self::new(api, config.network()?, component, resource, storage, wallets, rng)?
            .with_commit_options(CommitOptions::from_config(config)))
    }

    fn owner_account(&self, wallet: &WalletKeyPair) -> Result<String> {
        let derived =
            chain_radix::account_address_from_seed(wallet.private_key.as_bytes(), self.network)?;
        if derived != wallet.public_key.trim() {
            return Err(ValidationError::InvalidKey(
                "wallet private key does not own its account address".into(),
            )
            .into());
        }
        Ok(derived)
    }

    fn split_mint_address<'a>(&self, mint_address: &'a str) -> Result<(&'a str, &'a str)> {
        let (resource, local_id) = mint_address
            .split_once(':')
            .filter(|(_, id)| !id.is_empty())
            .ok_or_else(|| {
                ValidationError::InvalidAddress(format!(
                    "{mint_address} is not <resource_address>:<local_id>"
                ))
            })?;
        chain_radix::validate_resource_address(resource, self.network)?;
        Ok((resource, local_id))
    }
}

#[async_trait]
impl NftManager for RadixNftManager {
    fn provider(&self) -> BlockchainProviderType {
        BlockchainProviderType::Radix
    }

    async fn mint(&self, metadata: &NftMetadata, cancel: &CancellationToken) -> Result<MintResult> {
        observe("radix.nft.mint", async {
            metadata.validate()?;
            let wallet = self.wallets.get_wallet(BlockchainProviderType::Radix, cancel).await?;
            let account = self.owner_account(&wallet)?;
            let uri = self.storage.serialize(metadata, cancel).await?;

            let manifest = ManifestBuilder::new(self.network)
                .lock_fee(&account, &LOCK_FEE_XRD.to_string())
                .call_method(
                    &self.minter_component,
                    "mint_nft",
                    vec![
                        ManifestValue::String(metadata.name.clone()),
                        ManifestValue::String(metadata.description.clone()),
                        ManifestValue::String(uri.clone()),
                    ],
                )
                .deposit_batch(&account)
                .build()?;
            let notarized = submit_manifest(
                self.api.as_ref(),
                self.network,
                manifest,
                &wallet.private_key,
                self.rng.as_ref(),
                cancel,
            )
            .await?;
            let transaction_id = notarized.transaction_id;
            info!(account = %account, transaction_id = %transaction_id, "nft mint submitted");

            // The local id is only known once the mint has committed.
            wait_for_commit(self.api.as_ref(), &transaction_id, &self.commit, cancel).await?;
            let local_id = self
                .api
                .committed_non_fungible_ids(&transaction_id, &self.nft_resource, cancel)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| {
                    BridgeError::infrastructure(
                        "radix.nft.mint",
                        format!("{transaction_id} minted no {} id", self.nft_resource),
                    )
                })?;

            Ok(MintResult {
                mint_address: format!("{}:{local_id}", self.nft_resource),
                transaction_hash: transaction_id,
                metadata_uri: uri,
            })
        })
        .await
    }

    async fn get_metadata(&self, mint_address: &str, cancel: &CancellationToken) -> Result<Nft> {
        observe("radix.nft.get_metadata", async {
            let (resource, local_id) = self.split_mint_address(mint_address)?;
            let fields = self
                .api
                .non_fungible_data(resource, local_id, cancel)
                .await?
                .ok_or_else(|| {
                    ValidationError::InvalidAddress(format!("{mint_address} does not exist"))
                })?;

            let field = |name: &str| fields.get(name).cloned().unwrap_or_default();
            let uri = field("metadata_uri");
            let off_chain = if uri.is_empty() {
                OffChainMetadata::default()
            } else {
                self.storage.fetch(&uri, cancel).await?
            };

            let or_off_chain = |on: String, off: &str| {
                if on.is_empty() {
                    off.to_string()
                } else {
                    on
                }
            };
            Ok(Nft {
                mint_address: mint_address.to_string(),
                name: or_off_chain(field("name"), &off_chain.name),
                symbol: off_chain.symbol.clone(),
                description: or_off_chain(field("description"), &off_chain.description),
                image: or_off_chain(field("key_image_url"), &off_chain.image),
                royalty_basis_points: off_chain.seller_fee_basis_points,
                update_authority: None,
                creators: Vec::new(),
                attributes: off_chain.attribute_map(),
                uri,
            })
        })
        .await
    }

    async fn burn(&self, request: &BurnRequest, cancel: &CancellationToken) -> Result<String> {
        observe("radix.nft.burn", async {
            let account = self.owner_account(&request.owner)?;
            let (resource, local_id) = self.split_mint_address(&request.mint_address)?;

            let held = self.api.non_fungible_amount(&account, resource, cancel).await?;
            if held.is_zero() || held.is_sign_negative() {
                return Err(ValidationError::ZeroBalance(account).into());
            }

            let (builder, bucket) = ManifestBuilder::new(self.network)
                .lock_fee(&account, &LOCK_FEE_XRD.to_string())
                .withdraw_non_fungibles(&account, resource, &[local_id.to_string()])
                .take_all_from_worktop(resource);
            let manifest = builder.burn_resource(bucket).build()?;

            let notarized = submit_manifest(
                self.api.as_ref(),
                self.network,
                manifest,
                &request.owner.private_key,
                self.rng.as_ref(),
                cancel,
            )
            .await?;
            info!(
                mint = %request.mint_address,
                transaction_id = %notarized.transaction_id,
                "nft burn submitted"
            );
            Ok(notarized.transaction_id)
        })
        .await
    }
}
