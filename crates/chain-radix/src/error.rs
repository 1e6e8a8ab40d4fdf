use thiserror::Error;

/// Radix codec errors.
#[derive(Debug, Error)]
pub enum RadixError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    #[error("invalid decimal: {0}")]
    InvalidDecimal(String),

    #[error("transaction build error: {0}")]
    TransactionBuildError(String),

    #[error("signing error: {0}")]
    SigningError(String),
}
