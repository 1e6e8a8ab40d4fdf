use bip39::{Language, Mnemonic};
use crypto_utils::random::random_array;
use crypto_utils::{SecureRandom, ZeroizingBytes, ZeroizingString};
use zeroize::Zeroize;

use crate::error::ValidationError;

/// Generate a BIP-39 mnemonic of 12 or 24 words from the injected RNG.
pub fn generate_mnemonic(
    word_count: usize,
    rng: &dyn SecureRandom,
) -> Result<ZeroizingString, ValidationError> {
    let phrase = match word_count {
        12 => {
            let mut entropy: [u8; 16] = random_array(rng);
            let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy);
            entropy.zeroize();
            mnemonic
        }
        24 => {
            let mut entropy: [u8; 32] = random_array(rng);
            let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy);
            entropy.zeroize();
            mnemonic
        }
        other => {
            return Err(ValidationError::InvalidSeedPhrase(format!(
                "unsupported word count {other}"
            )))
        }
    }
    .map_err(|e| ValidationError::InvalidSeedPhrase(e.to_string()))?;

    Ok(ZeroizingString::new(phrase.to_string()))
}

/// Cheap structural check: exactly `expected_words` words, each made of
/// ASCII letters only. Returns the normalised (lowercase, single-spaced)
/// phrase.
///
/// Runs before any PBKDF2 work so malformed input fails fast.
pub fn check_phrase_shape(
    phrase: &str,
    expected_words: usize,
) -> Result<ZeroizingString, ValidationError> {
    let normalized = ZeroizingString::new(phrase.to_ascii_lowercase());
    let words = normalized.words();

    if words.len() != expected_words {
        return Err(ValidationError::InvalidSeedPhrase(format!(
            "expected {expected_words} words, got {}",
            words.len()
        )));
    }
    if let Some(pos) = words
        .iter()
        .position(|w| !w.bytes().all(|b| b.is_ascii_lowercase()))
    {
        return Err(ValidationError::InvalidSeedPhrase(format!(
            "word {} is not alphabetic",
            pos + 1
        )));
    }

    Ok(ZeroizingString::new(words.join(" ")))
}

/// Derive the 64-byte BIP-39 seed. Validates the checksum.
pub fn mnemonic_to_seed(phrase: &str, passphrase: &str) -> Result<ZeroizingBytes, ValidationError> {
    let mnemonic = Mnemonic::parse_in_normalized(Language::English, phrase)
        .map_err(|e| ValidationError::InvalidSeedPhrase(e.to_string()))?;

    Ok(ZeroizingBytes::new(mnemonic.to_seed(passphrase).to_vec()))
}
