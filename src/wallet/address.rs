//! Address Factory
//!
//! Builds the confidential P2WPKH address record for one `(chain, index)`.
//! Building is pure; the caller decides whether the record is cached.

use elements::secp256k1_zkp;
use elements::{Address, Script};

use crate::error::{IdentityError, IdentityResult};
use crate::types::{AddressRecord, Chain};

use super::derivation::KeyDerivationEngine;
use super::derivation_path::AddressPath;

/// Turns engine key material into address records
#[derive(Debug, Clone, Copy)]
pub struct AddressFactory<'a> {
    engine: &'a KeyDerivationEngine,
}

impl<'a> AddressFactory<'a> {
    pub fn new(engine: &'a KeyDerivationEngine) -> Self {
        Self { engine }
    }

    pub fn build(&self, chain: Chain, index: u32) -> IdentityResult<AddressRecord> {
        let path = AddressPath::new(chain, index)?;
        self.build_path(path)
    }

    pub fn build_path(&self, path: AddressPath) -> IdentityResult<AddressRecord> {
        let keys = self.engine.derive_path(&path)?;
        let spending_key = spending_public_key(&keys.public_key.to_bytes())?;
        let params = self.engine.network().address_params();

        let script = Address::p2wpkh(&spending_key, None, params).script_pubkey();
        let blinding = self.engine.blinding_key_for(script.as_bytes())?;
        let blinder = blinding_public_key(&blinding.public_key.serialize())?;
        let confidential = Address::p2wpkh(&spending_key, Some(blinder), params);

        Ok(AddressRecord {
            derivation_path: path,
            confidential_address: confidential.to_string(),
            script_pubkey: hex::encode(script.as_bytes()),
            blinding_private_key: hex::encode(blinding.secret_key.secret_bytes()),
            public_key: hex::encode(keys.public_key.to_bytes()),
        })
    }

    /// Unconfidential output script at `path`, without deriving the blinding key
    pub fn script_at(&self, path: AddressPath) -> IdentityResult<Script> {
        let keys = self.engine.derive_path(&path)?;
        let spending_key = spending_public_key(&keys.public_key.to_bytes())?;
        let params = self.engine.network().address_params();
        Ok(Address::p2wpkh(&spending_key, None, params).script_pubkey())
    }
}

pub(crate) fn spending_public_key(bytes: &[u8]) -> IdentityResult<elements::bitcoin::PublicKey> {
    elements::bitcoin::PublicKey::from_slice(bytes)
        .map_err(|e| IdentityError::crypto_error(format!("Invalid spending key: {}", e)))
}

pub(crate) fn blinding_public_key(bytes: &[u8]) -> IdentityResult<secp256k1_zkp::PublicKey> {
    secp256k1_zkp::PublicKey::from_slice(bytes)
        .map_err(|e| IdentityError::crypto_error(format!("Invalid blinding key: {}", e)))
}
