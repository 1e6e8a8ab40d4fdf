use thiserror::Error;

use crate::types::BlockchainProviderType;

/// Caller mistakes. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid seed phrase: {0}")]
    InvalidSeedPhrase(String),

    #[error("sender and receiver are both the technical account")]
    SelfTransaction,

    #[error("account {0} holds no balance to burn")]
    ZeroBalance(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("invalid symbol: {0}")]
    InvalidSymbol(String),
}

impl ValidationError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::InvalidSeedPhrase(_) => "invalid_seed_phrase",
            ValidationError::SelfTransaction => "self_transaction",
            ValidationError::ZeroBalance(_) => "zero_balance",
            ValidationError::InvalidAddress(_) => "invalid_address",
            ValidationError::InvalidAmount(_) => "invalid_amount",
            ValidationError::InvalidKey(_) => "invalid_key",
            ValidationError::InvalidMetadata(_) => "invalid_metadata",
            ValidationError::InvalidSymbol(_) => "invalid_symbol",
        }
    }
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// RPC transport, malformed responses, signing failures.
    #[error("{operation} failed: {message}")]
    Infrastructure { operation: String, message: String },

    #[error("provider {0} is not supported")]
    NotSupported(BlockchainProviderType),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{operation} was cancelled")]
    Cancelled { operation: String },
}

pub type Result<T> = std::result::Result<T, BridgeError>;

impl BridgeError {
    pub fn infrastructure(operation: impl Into<String>, message: impl ToString) -> Self {
        BridgeError::Infrastructure {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    pub fn cancelled(operation: impl Into<String>) -> Self {
        BridgeError::Cancelled {
            operation: operation.into(),
        }
    }

    /// Stable snake_case code for logs and API mapping.
    pub fn error_code(&self) -> &'static str {
        match self {
            BridgeError::Validation(v) => v.error_code(),
            BridgeError::Infrastructure { .. } => "infrastructure",
            BridgeError::NotSupported(_) => "not_supported",
            BridgeError::Configuration(_) => "configuration",
            BridgeError::Cancelled { .. } => "cancelled",
        }
    }

    /// Only transport-level failures are worth retrying; retry policy
    /// itself belongs to the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BridgeError::Infrastructure { .. })
    }
}

impl From<chain_sol::SolError> for BridgeError {
    fn from(e: chain_sol::SolError) -> Self {
        match e {
            chain_sol::SolError::InvalidAddress(msg) => ValidationError::InvalidAddress(msg).into(),
            other => BridgeError::infrastructure("solana_codec", other),
        }
    }
}

impl From<chain_radix::RadixError> for BridgeError {
    fn from(e: chain_radix::RadixError) -> Self {
        match e {
            chain_radix::RadixError::InvalidAddress(msg) => {
                ValidationError::InvalidAddress(msg).into()
            }
            chain_radix::RadixError::InvalidDecimal(msg) => {
                ValidationError::InvalidAmount(msg).into()
            }
            other => BridgeError::infrastructure("radix_codec", other),
        }
    }
}

impl From<crypto_utils::CryptoError> for BridgeError {
    fn from(e: crypto_utils::CryptoError) -> Self {
        ValidationError::InvalidKey(e.to_string()).into()
    }
}
