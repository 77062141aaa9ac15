//! Wallet Module
//!
//! Handles seed handling, key derivation, address building and the
//! per-chain address cache.

mod keygen;
mod derivation;
mod derivation_path;
mod address;
mod cache;
mod validation;

pub use keygen::*;
pub use derivation::*;
pub use derivation_path::*;
pub use address::AddressFactory;
pub(crate) use address::blinding_public_key;
pub use cache::*;
pub use validation::*;

use crate::error::IdentityResult;
use crate::types::Network;

/// Build a derivation engine straight from a mnemonic phrase
pub fn engine_from_mnemonic(
    phrase: &str,
    language: Option<&str>,
    passphrase: Option<&str>,
    network: Network,
) -> IdentityResult<KeyDerivationEngine> {
    let seed = keygen::phrase_to_seed(phrase, language, passphrase)?;
    KeyDerivationEngine::from_seed(seed.as_bytes(), network)
}
