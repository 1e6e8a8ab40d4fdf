//! Anchor-style discriminators.
//!
//! Instructions are tagged with `sha256("global:<name>")[..8]` and accounts
//! with `sha256("account:<Name>")[..8]`.

use sha2::{Digest, Sha256};

pub const DISCRIMINATOR_LEN: usize = 8;

pub fn instruction_discriminator(name: &str) -> [u8; DISCRIMINATOR_LEN] {
    prefixed_hash("global", name)
}

pub fn account_discriminator(name: &str) -> [u8; DISCRIMINATOR_LEN] {
    prefixed_hash("account", name)
}

fn prefixed_hash(namespace: &str, name: &str) -> [u8; DISCRIMINATOR_LEN] {
    let digest = Sha256::new()
        .chain_update(namespace.as_bytes())
        .chain_update(b":")
        .chain_update(name.as_bytes())
        .finalize();
    let mut out = [0u8; DISCRIMINATOR_LEN];
    out.copy_from_slice(&digest[..DISCRIMINATOR_LEN]);
    out
}
