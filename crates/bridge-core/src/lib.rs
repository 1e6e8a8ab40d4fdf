//! Multi-chain bridge core.
//!
//! Custodial account handling, transfers and NFTs on Solana and Radix, plus
//! the on-chain funding-rate publisher. Chain encodings live in `chain-sol`
//! and `chain-radix`; this crate owns the operations, the RPC clients and
//! configuration.

pub mod amount;
pub mod bridge;
pub mod config;
pub mod error;
pub mod funding;
pub mod hd_derivation;
pub mod key_material;
pub mod mnemonic;
pub mod nft;
pub mod rpc;
pub mod telemetry;
pub mod types;

pub use bridge::{Bridge, RadixBridge, SolanaBridge};
pub use config::BridgeConfig;
pub use error::{BridgeError, Result, ValidationError};
pub use funding::{
    FundingRatePublisher, FundingRateSnapshot, OnChainPublishResult, PublisherFactory,
    SolanaFundingPublisher,
};
pub use key_material::KeyMaterial;
pub use nft::{NftManager, RadixNftManager, SolanaNftManager};
pub use types::{
    Account, BlockchainProviderType, RestoredKeys, TransactionResult, TransactionStatus,
    WalletKeyPair,
};

pub use tokio_util::sync::CancellationToken;
