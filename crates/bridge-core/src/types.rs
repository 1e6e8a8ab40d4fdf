use std::fmt;
use std::str::FromStr;

use crypto_utils::{SecretSeed, ZeroizingString};
use serde::{Deserialize, Serialize};

/// Which chain a bridge or publisher targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BlockchainProviderType {
    Solana,
    Radix,
    Ethereum,
    Arbitrum,
    Polygon,
}

impl BlockchainProviderType {
    pub const ALL: [BlockchainProviderType; 5] = [
        BlockchainProviderType::Solana,
        BlockchainProviderType::Radix,
        BlockchainProviderType::Ethereum,
        BlockchainProviderType::Arbitrum,
        BlockchainProviderType::Polygon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockchainProviderType::Solana => "Solana",
            BlockchainProviderType::Radix => "Radix",
            BlockchainProviderType::Ethereum => "Ethereum",
            BlockchainProviderType::Arbitrum => "Arbitrum",
            BlockchainProviderType::Polygon => "Polygon",
        }
    }

    /// Named but without any implementation yet.
    pub fn is_reserved(&self) -> bool {
        matches!(
            self,
            BlockchainProviderType::Ethereum
                | BlockchainProviderType::Arbitrum
                | BlockchainProviderType::Polygon
        )
    }
}

impl fmt::Display for BlockchainProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockchainProviderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown blockchain provider '{wanted}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    Pending,
    SufficientFunds,
    InsufficientFunds,
    InsufficientFundsForFee,
    Expired,
    Completed,
    Canceled,
    NotFound,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Completed
                | TransactionStatus::Canceled
                | TransactionStatus::Expired
                | TransactionStatus::NotFound
        )
    }
}

/// Outcome of a value transfer. Built once per chain call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionResult {
    pub transaction_id: Option<String>,
    pub data: Option<String>,
    pub success: bool,
    pub error_message: Option<String>,
    pub status: TransactionStatus,
}

impl TransactionResult {
    /// The chain accepted the transaction; finality is not yet known.
    pub fn submitted(transaction_id: String) -> Self {
        Self {
            transaction_id: Some(transaction_id),
            data: None,
            success: true,
            error_message: None,
            status: TransactionStatus::Pending,
        }
    }

    /// The sender cannot cover the transfer. `status` is one of the
    /// insufficient-funds variants; `data` carries the observed balance.
    pub fn insufficient(status: TransactionStatus, balance: String, required: String) -> Self {
        Self {
            transaction_id: None,
            data: Some(balance.clone()),
            success: false,
            error_message: Some(format!("balance {balance} is below required {required}")),
            status,
        }
    }
}

/// A freshly generated account. The caller owns it; nothing here persists it.
#[derive(Debug, Clone)]
pub struct Account {
    pub public_key: String,
    pub private_key: SecretSeed,
    pub seed_phrase: ZeroizingString,
}

/// Keys recovered from a seed phrase.
#[derive(Debug, Clone)]
pub struct RestoredKeys {
    pub public_key: String,
    pub private_key: SecretSeed,
}

/// A wallet handed in for a single mint or burn call.
#[derive(Debug, Clone)]
pub struct WalletKeyPair {
    pub public_key: String,
    pub private_key: SecretSeed,
    pub seed_phrase: Option<ZeroizingString>,
}
