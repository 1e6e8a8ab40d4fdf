//! Radix chain support for the bridge.
//!
//! Bech32m account and resource addresses, compiled manifests, V1
//! transaction intents in manifest SBOR, Blake2b hashing and Ed25519
//! notarisation. No I/O happens here; the Core API client lives in
//! `bridge-core`.

pub mod address;
pub mod error;
pub mod hash;
pub mod manifest;
pub mod network;
pub mod sbor;
pub mod transaction;

pub use address::{
    account_address_from_seed, node_id, public_key_from_seed, validate_account_address,
    validate_component_address, validate_resource_address, virtual_account_address,
};
pub use error::RadixError;
pub use hash::blake2b_256;
pub use manifest::{
    transfer_manifest, validate_decimal, Bucket, Manifest, ManifestBuilder, ManifestValue,
};
pub use network::RadixNetwork;
pub use transaction::{
    intent_hash_id, notarize, NotarizedTransaction, TransactionHeader, TransactionIntent,
    EPOCH_WINDOW,
};
