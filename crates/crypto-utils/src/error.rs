use thiserror::Error;

/// Errors raised while decoding or handling secret material.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid key encoding: {0}")]
    InvalidKeyEncoding(String),

    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: &'static str, actual: usize },

    #[error("keypair mismatch: public half does not match the secret seed")]
    KeypairMismatch,

    #[error("invalid input: {0}")]
    InvalidInput(String),
}
