//! NFT mint, metadata lookup and burn.
//!
//! Off-chain JSON lives behind [`MetadataStorage`] and the minting wallet
//! comes from [`WalletResolver`]; both are supplied by the host service.

pub mod radix;
pub mod solana;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use chain_sol::metadata::{MAX_NAME_LENGTH, MAX_SYMBOL_LENGTH};

use crate::error::{Result, ValidationError};
use crate::types::{BlockchainProviderType, WalletKeyPair};

pub use radix::RadixNftManager;
pub use solana::SolanaNftManager;

/// Royalties are expressed in basis points of the sale price.
pub const MAX_ROYALTY_BASIS_POINTS: u16 = 10_000;

/// What a caller asks to mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftMetadata {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub image: String,
    pub royalty_basis_points: u16,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    pub network: BlockchainProviderType,
}

impl NftMetadata {
    /// Limits shared by both chains (the Token Metadata program's are the
    /// tighter ones).
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::InvalidMetadata("name is empty".into()));
        }
        if self.name.len() > MAX_NAME_LENGTH {
            return Err(ValidationError::InvalidMetadata(format!(
                "name exceeds {MAX_NAME_LENGTH} bytes"
            )));
        }
        if self.symbol.len() > MAX_SYMBOL_LENGTH {
            return Err(ValidationError::InvalidMetadata(format!(
                "symbol exceeds {MAX_SYMBOL_LENGTH} bytes"
            )));
        }
        if self.royalty_basis_points > MAX_ROYALTY_BASIS_POINTS {
            return Err(ValidationError::InvalidMetadata(format!(
                "royalty {} exceeds {MAX_ROYALTY_BASIS_POINTS} basis points",
                self.royalty_basis_points
            )));
        }
        Ok(())
    }
}

/// The JSON document a metadata URI points at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OffChainMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub seller_fee_basis_points: u16,
    #[serde(default)]
    pub attributes: Vec<OffChainAttribute>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffChainAttribute {
    pub trait_type: String,
    pub value: Value,
}

impl From<&NftMetadata> for OffChainMetadata {
    fn from(m: &NftMetadata) -> Self {
        Self {
            name: m.name.clone(),
            symbol: m.symbol.clone(),
            description: m.description.clone(),
            image: m.image.clone(),
            seller_fee_basis_points: m.royalty_basis_points,
            attributes: m
                .attributes
                .iter()
                .map(|(k, v)| OffChainAttribute {
                    trait_type: k.clone(),
                    value: Value::String(v.clone()),
                })
                .collect(),
        }
    }
}

impl OffChainMetadata {
    /// Attributes as `trait_type -> value`. Non-string values are rendered
    /// as JSON; later duplicates win.
    pub fn attribute_map(&self) -> BTreeMap<String, String> {
        self.attributes
            .iter()
            .map(|a| {
                let value = match &a.value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (a.trait_type.clone(), value)
            })
            .collect()
    }
}

/// An NFT as read back from chain plus its off-chain document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Nft {
    pub mint_address: String,
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub description: String,
    pub image: String,
    pub royalty_basis_points: u16,
    pub update_authority: Option<String>,
    pub creators: Vec<String>,
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MintResult {
    pub mint_address: String,
    pub transaction_hash: String,
    pub metadata_uri: String,
}

#[derive(Debug, Clone)]
pub struct BurnRequest {
    pub mint_address: String,
    pub owner: WalletKeyPair,
}

/// Stores the off-chain JSON and reads it back.
#[async_trait]
pub trait MetadataStorage: Send + Sync {
    /// Persist the document for `metadata`; returns its URI.
    async fn serialize(&self, metadata: &NftMetadata, cancel: &CancellationToken) -> Result<String>;

    async fn fetch(&self, uri: &str, cancel: &CancellationToken) -> Result<OffChainMetadata>;
}

/// Supplies the wallet of the user on whose behalf a mint runs.
#[async_trait]
pub trait WalletResolver: Send + Sync {
    async fn get_wallet(
        &self,
        network: BlockchainProviderType,
        cancel: &CancellationToken,
    ) -> Result<WalletKeyPair>;
}

#[async_trait]
pub trait NftManager: Send + Sync {
    fn provider(&self) -> BlockchainProviderType;

    async fn mint(&self, metadata: &NftMetadata, cancel: &CancellationToken) -> Result<MintResult>;

    async fn get_metadata(&self, mint_address: &str, cancel: &CancellationToken) -> Result<Nft>;

    /// Burn the owner's whole holding; returns the transaction id.
    async fn burn(&self, request: &BurnRequest, cancel: &CancellationToken) -> Result<String>;
}
