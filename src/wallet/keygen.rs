//! Mnemonic Codec
//!
//! Turns BIP39 phrases into seeds and generates fresh phrases.
//!
//! SECURITY: All sensitive data (entropy, seeds) is zeroized on drop.

use bip39::Mnemonic;
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use zeroize::Zeroizing;

use crate::error::{IdentityError, IdentityResult};

use super::validation::parse_language;

/// Root secret of an identity, produced by the mnemonic codec
#[derive(Clone)]
pub struct Seed(Zeroizing<Vec<u8>>);

impl Seed {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(Zeroizing::new(bytes.to_vec()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seed([REDACTED:{}bytes])", self.0.len())
    }
}

/// Convert a mnemonic phrase to a 64-byte seed
///
/// `language` defaults to English, `passphrase` to the empty string.
pub fn phrase_to_seed(
    phrase: &str,
    language: Option<&str>,
    passphrase: Option<&str>,
) -> IdentityResult<Seed> {
    let language = parse_language(language)?;
    let mnemonic = Mnemonic::parse_in(language, phrase)
        .map_err(|e| IdentityError::invalid_mnemonic(format!("Invalid mnemonic: {}", e)))?;

    let seed = Zeroizing::new(mnemonic.to_seed(passphrase.unwrap_or("")));
    Ok(Seed::from_bytes(&seed[..]))
}

/// Generate a fresh mnemonic phrase of 12 or 24 words
///
/// SECURITY: Entropy is securely zeroized after mnemonic generation
pub fn generate_mnemonic(word_count: usize, language: Option<&str>) -> IdentityResult<String> {
    let entropy_len = match word_count {
        12 => 16,
        24 => 32,
        other => {
            return Err(IdentityError::invalid_input(format!(
                "Unsupported word count {}: use 12 or 24",
                other
            )))
        }
    };
    let language = parse_language(language)?;

    let mut entropy = Zeroizing::new([0u8; 32]);
    OsRng.fill_bytes(&mut entropy[..entropy_len]);

    let mnemonic = Mnemonic::from_entropy_in(language, &entropy[..entropy_len])
        .map_err(|e| IdentityError::crypto_error(format!("Failed to create mnemonic: {}", e)))?;

    Ok(mnemonic.to_string())
}
