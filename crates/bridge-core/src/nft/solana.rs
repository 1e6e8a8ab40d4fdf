use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use chain_sol::metadata::MAX_URI_LENGTH;
use chain_sol::{spl_token, system, Creator, MetadataArgs};
use crypto_utils::random::random_array;
use crypto_utils::{SecretSeed, SecureRandom};

use super::{BurnRequest, MetadataStorage, MintResult, Nft, NftManager, NftMetadata, WalletResolver};
use crate::error::{Result, ValidationError};
use crate::rpc::{send_instructions, SolanaRpc};
use crate::telemetry::observe;
use crate::types::{BlockchainProviderType, WalletKeyPair};

/// Token Metadata NFTs: a fresh 0-decimal mint with supply 1 and a master
/// edition capping it there.
pub struct SolanaNftManager {
    rpc: Arc<dyn SolanaRpc>,
    storage: Arc<dyn MetadataStorage>,
    wallets: Arc<dyn WalletResolver>,
    rng: Arc<dyn SecureRandom>,
}

impl SolanaNftManager {
    pub fn new(
        rpc: Arc<dyn SolanaRpc>,
        storage: Arc<dyn MetadataStorage>,
        wallets: Arc<dyn WalletResolver>,
        rng: Arc<dyn SecureRandom>,
    ) -> Self {
        Self {
            rpc,
            storage,
            wallets,
            rng,
        }
    }
}

/// The wallet's public key, checked against its private key.
fn owner_key(wallet: &WalletKeyPair) -> Result<[u8; 32]> {
    let derived = chain_sol::public_key_from_seed(wallet.private_key.as_bytes());
    if chain_sol::encode_address(&derived) != wallet.public_key.trim() {
        return Err(ValidationError::InvalidKey(
            "wallet private key does not match its public key".into(),
        )
        .into());
    }
    Ok(derived)
}

#[async_trait]
impl NftManager for SolanaNftManager {
    fn provider(&self) -> BlockchainProviderType {
        BlockchainProviderType::Solana
    }

    async fn mint(&self, metadata: &NftMetadata, cancel: &CancellationToken) -> Result<MintResult> {
        observe("solana.nft.mint", async {
            metadata.validate()?;
            let wallet = self.wallets.get_wallet(BlockchainProviderType::Solana, cancel).await?;
            let owner = owner_key(&wallet)?;

            let uri = self.storage.serialize(metadata, cancel).await?;
            if uri.len() > MAX_URI_LENGTH {
                return Err(ValidationError::InvalidMetadata(format!(
                    "metadata URI exceeds {MAX_URI_LENGTH} bytes"
                ))
                .into());
            }

            let mint_key = SecretSeed::new(random_array::<32>(self.rng.as_ref()));
            let mint = chain_sol::public_key_from_seed(mint_key.as_bytes());
            let rent = self
                .rpc
                .get_minimum_balance_for_rent_exemption(chain_sol::MINT_ACCOUNT_LEN, cancel)
                .await?;

            let args = MetadataArgs {
                name: metadata.name.clone(),
                symbol: metadata.symbol.clone(),
                uri: uri.clone(),
                seller_fee_basis_points: metadata.royalty_basis_points,
                creators: vec![Creator {
                    address: owner,
                    verified: true,
                    share: 100,
                }],
            };
            let ata = chain_sol::derive_associated_token_address(&owner, &mint)?;
            let instructions = [
                system::create_account(
                    &owner,
                    &mint,
                    rent,
                    chain_sol::MINT_ACCOUNT_LEN,
                    &chain_sol::TOKEN_PROGRAM_ID,
                ),
                spl_token::initialize_mint2(&mint, 0, &owner, Some(&owner)),
                spl_token::create_associated_token_account_idempotent(&owner, &owner, &mint)?,
                spl_token::mint_to(&mint, &ata, &owner, 1)?,
                chain_sol::create_metadata_account_v3(&mint, &owner, &owner, &owner, &args)?,
                chain_sol::create_master_edition_v3(&mint, &owner, &owner, &owner)?,
            ];

            let signers = [&wallet.private_key, &mint_key];
            let signature =
                send_instructions(self.rpc.as_ref(), &instructions, &signers, cancel).await?;
            let mint_address = chain_sol::encode_address(&mint);
            info!(mint = %mint_address, %signature, "nft minted");

            Ok(MintResult {
                mint_address,
                transaction_hash: signature,
                metadata_uri: uri,
            })
        })
        .await
    }

    async fn get_metadata(&self, mint_address: &str, cancel: &CancellationToken) -> Result<Nft> {
        observe("solana.nft.get_metadata", async {
            let mint = chain_sol::decode_address(mint_address)?;
            let metadata_address =
                chain_sol::encode_address(&chain_sol::derive_metadata_address(&mint)?);

            let account = self
                .rpc
                .get_account_info(&metadata_address, cancel)
                .await?
                .ok_or_else(|| {
                    ValidationError::InvalidAddress(format!(
                        "{mint_address} has no metadata account"
                    ))
                })?;
            let on_chain = chain_sol::decode_metadata_account(&account.data)?;
            let off_chain = self.storage.fetch(&on_chain.uri, cancel).await?;

            Ok(Nft {
                mint_address: mint_address.to_string(),
                name: on_chain.name,
                symbol: on_chain.symbol,
                description: off_chain.description.clone(),
                image: off_chain.image.clone(),
                royalty_basis_points: on_chain.seller_fee_basis_points,
                update_authority: Some(chain_sol::encode_address(&on_chain.update_authority)),
                creators: on_chain
                    .creators
                    .iter()
                    .map(|c| chain_sol::encode_address(&c.address))
                    .collect(),
                attributes: off_chain.attribute_map(),
                uri: on_chain.uri,
            })
        })
        .await
    }

    async fn burn(&self, request: &BurnRequest, cancel: &CancellationToken) -> Result<String> {
        observe("solana.nft.burn", async {
            let owner = owner_key(&request.owner)?;
            let mint = chain_sol::decode_address(&request.mint_address)?;
            let ata = chain_sol::derive_associated_token_address(&owner, &mint)?;
            let ata_address = chain_sol::encode_address(&ata);

            let balance = self
                .rpc
                .get_token_account_balance(&ata_address, cancel)
                .await?
                .unwrap_or(0);
            if balance == 0 {
                return Err(ValidationError::ZeroBalance(ata_address).into());
            }

            let instructions = [
                spl_token::burn(&ata, &mint, &owner, balance)?,
                spl_token::close_account(&ata, &owner, &owner),
            ];
            let signers = [&request.owner.private_key];
            let signature =
                send_instructions(self.rpc.as_ref(), &instructions, &signers, cancel).await?;
            info!(
                mint = %request.mint_address,
                token_account = %ata_address,
                balance,
                %signature,
                "nft burned"
            );
            Ok(signature)
        })
        .await
    }
}
