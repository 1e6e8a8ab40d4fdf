use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::Zeroize;

use crypto_utils::SecretSeed;

use crate::error::ValidationError;

type HmacSha512 = Hmac<Sha512>;

const HARDENED: u32 = 0x8000_0000;

/// SLIP-0010 path for Solana: `m/44'/501'/{account}'/0'`.
pub fn solana_path(account: u32) -> String {
    format!("m/44'/501'/{account}'/0'")
}

/// CAP-26 path for a Radix account: `m/44'/1022'/{network}'/525'/1460'/{index}'`.
pub fn radix_path(network_id: u8, index: u32) -> String {
    format!("m/44'/1022'/{network_id}'/525'/1460'/{index}'")
}

/// Ed25519 key derived with SLIP-0010.
pub struct DerivedEd25519Key {
    pub private_key: SecretSeed,
    pub public_key: [u8; 32],
    pub derivation_path: String,
}

/// SLIP-0010 Ed25519 derivation. Every path component is hardened,
/// whether or not it carries a `'`.
pub fn derive_ed25519_key(seed: &[u8], path: &str) -> Result<DerivedEd25519Key, ValidationError> {
    let components = parse_derivation_path(path)?;

    let mut mac = HmacSha512::new_from_slice(b"ed25519 seed")
        .map_err(|e| ValidationError::InvalidKey(e.to_string()))?;
    mac.update(seed);
    let mut result = mac.finalize().into_bytes();

    let mut key = [0u8; 32];
    let mut chain_code = [0u8; 32];
    key.copy_from_slice(&result[..32]);
    chain_code.copy_from_slice(&result[32..]);

    for index in components {
        let mut mac = HmacSha512::new_from_slice(&chain_code)
            .map_err(|e| ValidationError::InvalidKey(e.to_string()))?;
        mac.update(&[0x00]);
        mac.update(&key);
        mac.update(&(index | HARDENED).to_be_bytes());
        result = mac.finalize().into_bytes();

        key.copy_from_slice(&result[..32]);
        chain_code.copy_from_slice(&result[32..]);
    }

    let public_key = chain_sol::public_key_from_seed(&key);
    let derived = DerivedEd25519Key {
        private_key: SecretSeed::new(key),
        public_key,
        derivation_path: path.to_string(),
    };

    key.zeroize();
    chain_code.zeroize();
    result.as_mut_slice().zeroize();

    Ok(derived)
}

/// Parse `m/44'/501'/0'/0'` into `[44, 501, 0, 0]`.
fn parse_derivation_path(path: &str) -> Result<Vec<u32>, ValidationError> {
    let rest = path
        .strip_prefix("m/")
        .ok_or_else(|| ValidationError::InvalidKey(format!("path {path} must start with m/")))?;

    rest.split('/')
        .map(|component| {
            let digits = component
                .strip_suffix('\'')
                .or_else(|| component.strip_suffix('h'))
                .unwrap_or(component);
            let index = digits.parse::<u32>().map_err(|e| {
                ValidationError::InvalidKey(format!("bad path component '{component}': {e}"))
            })?;
            if index >= HARDENED {
                return Err(ValidationError::InvalidKey(format!(
                    "path component {index} out of range"
                )));
            }
            Ok(index)
        })
        .collect()
}
