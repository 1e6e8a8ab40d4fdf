//! Solana address encoding.
//!
//! A Solana address is the Base58 encoding of 32 raw bytes: either an
//! Ed25519 public key or a program-derived address.

use ed25519_dalek::SigningKey;

use crate::error::SolError;

/// Encode 32 bytes as a Base58 address.
pub fn encode_address(bytes: &[u8; 32]) -> String {
    bs58::encode(bytes).into_string()
}

/// Decode a Base58 address into its 32 raw bytes.
pub fn decode_address(address: &str) -> Result<[u8; 32], SolError> {
    let bytes = bs58::decode(address.trim())
        .into_vec()
        .map_err(|e| SolError::InvalidAddress(format!("base58 decode failed: {e}")))?;

    bytes.try_into().map_err(|v: Vec<u8>| {
        SolError::InvalidAddress(format!("expected 32 bytes, got {}", v.len()))
    })
}

/// `true` when `address` decodes to exactly 32 bytes.
pub fn is_valid_address(address: &str) -> bool {
    decode_address(address).is_ok()
}

/// Public key (as raw bytes) for a 32-byte Ed25519 secret seed.
pub fn public_key_from_seed(seed: &[u8; 32]) -> [u8; 32] {
    SigningKey::from_bytes(seed).verifying_key().to_bytes()
}

/// Base58 address owned by a 32-byte Ed25519 secret seed.
pub fn address_from_seed(seed: &[u8; 32]) -> String {
    encode_address(&public_key_from_seed(seed))
}
