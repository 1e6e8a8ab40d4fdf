//! Radix addresses.
//!
//! Every global address is 30 bytes: an entity-type byte followed by 29
//! bytes of node id, Bech32m-encoded under a network-specific HRP.
//! Pre-allocated (virtual) accounts take the node id from the low 29 bytes
//! of `blake2b_256(public_key)`.

use bech32::{Bech32m, Hrp};
use ed25519_dalek::SigningKey;

use crate::error::RadixError;
use crate::hash::blake2b_256;
use crate::network::RadixNetwork;

pub const ADDRESS_LEN: usize = 30;

/// Entity byte of an account pre-allocated for an Ed25519 key.
pub const ENTITY_ED25519_ACCOUNT: u8 = 0xD1;
const ENTITY_SECP256K1_ACCOUNT: u8 = 0xD6;
const ENTITY_GLOBAL_ACCOUNT: u8 = 0xC1;
const ENTITY_FUNGIBLE_RESOURCE: u8 = 0x5D;
const ENTITY_NON_FUNGIBLE_RESOURCE: u8 = 0x9A;

/// Account address owned by an Ed25519 public key.
pub fn virtual_account_address(
    public_key: &[u8; 32],
    network: RadixNetwork,
) -> Result<String, RadixError> {
    let hash = blake2b_256(public_key);

    let mut node_id = [0u8; ADDRESS_LEN];
    node_id[0] = ENTITY_ED25519_ACCOUNT;
    node_id[1..].copy_from_slice(&hash[32 - (ADDRESS_LEN - 1)..]);

    encode(&network.account_hrp(), &node_id)
}

/// Public key for a 32-byte Ed25519 seed.
pub fn public_key_from_seed(seed: &[u8; 32]) -> [u8; 32] {
    SigningKey::from_bytes(seed).verifying_key().to_bytes()
}

pub fn account_address_from_seed(
    seed: &[u8; 32],
    network: RadixNetwork,
) -> Result<String, RadixError> {
    virtual_account_address(&public_key_from_seed(seed), network)
}

/// Check that `address` is an account on `network`.
pub fn validate_account_address(address: &str, network: RadixNetwork) -> Result<(), RadixError> {
    let bytes = decode_with_hrp(address, &network.account_hrp())?;
    match bytes[0] {
        ENTITY_ED25519_ACCOUNT | ENTITY_SECP256K1_ACCOUNT | ENTITY_GLOBAL_ACCOUNT => Ok(()),
        other => Err(RadixError::InvalidAddress(format!(
            "entity type 0x{other:02x} is not an account"
        ))),
    }
}

/// Check that `address` is a fungible or non-fungible resource on `network`.
pub fn validate_resource_address(address: &str, network: RadixNetwork) -> Result<(), RadixError> {
    let bytes = decode_with_hrp(address, &network.resource_hrp())?;
    match bytes[0] {
        ENTITY_FUNGIBLE_RESOURCE | ENTITY_NON_FUNGIBLE_RESOURCE => Ok(()),
        other => Err(RadixError::InvalidAddress(format!(
            "entity type 0x{other:02x} is not a resource"
        ))),
    }
}

pub fn validate_component_address(address: &str, network: RadixNetwork) -> Result<(), RadixError> {
    decode_with_hrp(address, &network.component_hrp()).map(|_| ())
}

pub(crate) fn encode(hrp: &str, data: &[u8]) -> Result<String, RadixError> {
    let hrp = Hrp::parse(hrp).map_err(|e| RadixError::InvalidAddress(format!("bad hrp: {e}")))?;
    bech32::encode::<Bech32m>(hrp, data)
        .map_err(|e| RadixError::InvalidAddress(format!("bech32m encode failed: {e}")))
}

/// The 30-byte node id of any global address on `network`.
pub fn node_id(address: &str, network: RadixNetwork) -> Result<[u8; ADDRESS_LEN], RadixError> {
    let (hrp, bytes) = decode(address)?;
    if !hrp.ends_with(&format!("_{}", network.hrp_suffix())) {
        return Err(RadixError::InvalidAddress(format!(
            "{address} is not a {network} address"
        )));
    }
    let mut node_id = [0u8; ADDRESS_LEN];
    node_id.copy_from_slice(&bytes);
    Ok(node_id)
}

fn decode(address: &str) -> Result<(String, Vec<u8>), RadixError> {
    let (hrp, bytes) = bech32::decode(address.trim())
        .map_err(|e| RadixError::InvalidAddress(format!("bech32m decode failed: {e}")))?;
    if bytes.len() != ADDRESS_LEN {
        return Err(RadixError::InvalidAddress(format!(
            "expected {ADDRESS_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    Ok((hrp.to_string(), bytes))
}

fn decode_with_hrp(address: &str, expected_hrp: &str) -> Result<Vec<u8>, RadixError> {
    let (hrp, bytes) = decode(address)?;
    if hrp != expected_hrp {
        return Err(RadixError::InvalidAddress(format!(
            "expected hrp {expected_hrp}, got {hrp}"
        )));
    }
    Ok(bytes)
}
