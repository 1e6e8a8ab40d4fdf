//! Injectable randomness.
//!
//! Everything that needs entropy (mnemonic generation, fresh mint keypairs,
//! transaction nonces) takes a `&dyn SecureRandom` instead of reaching for a
//! process-global generator. Production code wires in [`OsRandom`]; tests
//! wire in [`SeededRandom`] to get reproducible output.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rand_core::OsRng;

/// A cryptographically secure source of random bytes.
pub trait SecureRandom: Send + Sync {
    /// Fill `dest` entirely with random bytes.
    fn fill_bytes(&self, dest: &mut [u8]);
}

/// Operating-system CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

impl SecureRandom for OsRandom {
    fn fill_bytes(&self, dest: &mut [u8]) {
        OsRng.fill_bytes(dest);
    }
}

/// Deterministic ChaCha-based generator seeded from a `u64`.
///
/// Only meant for tests and reproducible fixtures.
pub struct SeededRandom {
    inner: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl SecureRandom for SeededRandom {
    fn fill_bytes(&self, dest: &mut [u8]) {
        let mut rng = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.fill_bytes(dest);
    }
}

/// Draw a fixed-size array from `rng`.
pub fn random_array<const N: usize>(rng: &dyn SecureRandom) -> [u8; N] {
    let mut buf = [0u8; N];
    rng.fill_bytes(&mut buf);
    buf
}

/// Draw a little-endian `u32` from `rng`.
pub fn random_u32(rng: &dyn SecureRandom) -> u32 {
    u32::from_le_bytes(random_array::<4>(rng))
}
