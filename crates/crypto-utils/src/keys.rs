//! Decoding operator keys supplied through configuration.
//!
//! Keys may arrive hex-encoded (optionally `0x`-prefixed) or base64-encoded.
//! Hex is tried first when the string is an even-length run of hex digits,
//! since every such string is also syntactically valid base64.

use base64::Engine;

use crate::error::CryptoError;
use crate::zeroizing::{SecretSeed, ZeroizingBytes};

/// Decode a hex or base64 key string into raw bytes.
pub fn decode_key_material(encoded: &str) -> Result<ZeroizingBytes, CryptoError> {
    let trimmed = encoded.trim();
    if trimmed.is_empty() {
        return Err(CryptoError::InvalidInput("key string is empty".into()));
    }

    if let Some(stripped) = trimmed.strip_prefix("0x") {
        return hex::decode(stripped)
            .map(ZeroizingBytes::new)
            .map_err(|e| CryptoError::InvalidKeyEncoding(format!("hex: {e}")));
    }

    if looks_like_hex(trimmed) {
        if let Ok(bytes) = hex::decode(trimmed) {
            return Ok(ZeroizingBytes::new(bytes));
        }
    }

    base64::engine::general_purpose::STANDARD
        .decode(trimmed)
        .map(ZeroizingBytes::new)
        .map_err(|e| CryptoError::InvalidKeyEncoding(format!("base64: {e}")))
}

/// Decode an Ed25519 secret given either as a 32-byte seed or as a 64-byte
/// `seed || public` keypair.
///
/// For the 64-byte form the trailing public half is checked against the key
/// derived from the seed.
pub fn decode_seed_or_keypair(encoded: &str) -> Result<SecretSeed, CryptoError> {
    let bytes = decode_key_material(encoded)?;
    match bytes.len() {
        32 => {
            let mut seed = [0u8; 32];
            seed.copy_from_slice(&bytes);
            Ok(SecretSeed::new(seed))
        }
        64 => {
            let mut seed = [0u8; 32];
            seed.copy_from_slice(&bytes[..32]);
            let secret = SecretSeed::new(seed);
            let derived = ed25519_public_key(secret.as_bytes());
            if derived[..] != bytes[32..] {
                return Err(CryptoError::KeypairMismatch);
            }
            Ok(secret)
        }
        actual => Err(CryptoError::InvalidKeyLength {
            expected: "32 or 64",
            actual,
        }),
    }
}

fn looks_like_hex(s: &str) -> bool {
    s.len() % 2 == 0 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

fn ed25519_public_key(seed: &[u8; 32]) -> [u8; 32] {
    use ed25519_dalek::SigningKey;
    SigningKey::from_bytes(seed).verifying_key().to_bytes()
}
