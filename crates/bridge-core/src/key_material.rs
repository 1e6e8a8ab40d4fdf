use crypto_utils::{SecureRandom, ZeroizingString};

use crate::error::ValidationError;
use crate::hd_derivation::{derive_ed25519_key, radix_path, solana_path, DerivedEd25519Key};
use crate::mnemonic::{check_phrase_shape, generate_mnemonic, mnemonic_to_seed};

/// A chain's seed-phrase convention: how many words, which path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    word_count: usize,
    path: String,
}

impl KeyMaterial {
    /// 12 words, `m/44'/501'/0'/0'`.
    pub fn solana() -> Self {
        Self {
            word_count: 12,
            path: solana_path(0),
        }
    }

    /// 24 words, CAP-26 account path for `network_id`.
    pub fn radix(network_id: u8) -> Self {
        Self {
            word_count: 24,
            path: radix_path(network_id, 0),
        }
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Fresh phrase and the key it derives.
    pub fn generate(
        &self,
        rng: &dyn SecureRandom,
    ) -> Result<(ZeroizingString, DerivedEd25519Key), ValidationError> {
        let phrase = generate_mnemonic(self.word_count, rng)?;
        let key = self.derive(&phrase)?;
        Ok((phrase, key))
    }

    /// Recover the key for `phrase`. Shape is checked before any hashing.
    pub fn restore(&self, phrase: &str) -> Result<DerivedEd25519Key, ValidationError> {
        let normalized = check_phrase_shape(phrase, self.word_count)?;
        self.derive(&normalized)
    }

    fn derive(&self, phrase: &str) -> Result<DerivedEd25519Key, ValidationError> {
        let seed = mnemonic_to_seed(phrase, "")?;
        derive_ed25519_key(&seed, &self.path)
    }
}
