//! # crypto-utils
//!
//! Randomness, secret-memory hygiene and key-string decoding shared by the
//! chain codecs and the bridge.

pub mod error;
pub mod keys;
pub mod random;
pub mod zeroizing;

pub use error::CryptoError;
pub use keys::{decode_key_material, decode_seed_or_keypair};
pub use random::{OsRandom, SecureRandom, SeededRandom};
pub use zeroizing::{SecretSeed, ZeroizingBytes, ZeroizingString};
