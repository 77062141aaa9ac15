//! Key Derivation
//!
//! Spending keys follow BIP32 under the fixed `m/84'/0'/0'` account node.
//! Blinding keys follow SLIP-77: one master blinding key per seed, and one
//! blinding key per output script (not per derivation index).
//!
//! SECURITY: All private key material is zeroized when no longer needed.

use bitcoin::bip32::{Xpriv, Xpub};
use bitcoin::key::CompressedPublicKey;
use bitcoin::secp256k1::{All, PublicKey, Secp256k1, SecretKey};
use bitcoin::NetworkKind;
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha512};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{IdentityError, IdentityResult};
use crate::types::{Chain, Network};

use super::derivation_path::AddressPath;

type HmacSha512 = Hmac<Sha512>;
type HmacSha256 = Hmac<Sha256>;

/// Shortest seed accepted for BIP32 master key generation (128 bits)
pub const MIN_SEED_LEN: usize = 16;

/// Longest seed accepted for BIP32 master key generation (512 bits)
pub const MAX_SEED_LEN: usize = 64;

/// SLIP-21 label of the SLIP-77 blinding key node
const SLIP77_LABEL: &[u8] = b"SLIP-0077";

/// SLIP-77 master blinding key
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct MasterBlindingKey([u8; 32]);

impl MasterBlindingKey {
    /// Derive the master blinding key from a seed via the SLIP-21 `SLIP-0077` node
    pub fn from_seed(seed: &[u8]) -> IdentityResult<Self> {
        let mut mac = HmacSha512::new_from_slice(b"Symmetric key seed")
            .map_err(|e| IdentityError::crypto_error(format!("HMAC error: {}", e)))?;
        mac.update(seed);
        let mut root = Zeroizing::new([0u8; 64]);
        root.copy_from_slice(&mac.finalize().into_bytes());

        let mut mac = HmacSha512::new_from_slice(&root[..32])
            .map_err(|e| IdentityError::crypto_error(format!("HMAC error: {}", e)))?;
        mac.update(&[0u8]);
        mac.update(SLIP77_LABEL);
        let mut node = Zeroizing::new([0u8; 64]);
        node.copy_from_slice(&mac.finalize().into_bytes());

        let mut key = [0u8; 32];
        key.copy_from_slice(&node[32..]);
        Ok(Self(key))
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Blinding private key for one output script
    pub fn blinding_private_key(&self, script_pubkey: &[u8]) -> IdentityResult<SecretKey> {
        let mut mac = HmacSha256::new_from_slice(&self.0)
            .map_err(|e| IdentityError::crypto_error(format!("HMAC error: {}", e)))?;
        mac.update(script_pubkey);
        let mut digest = Zeroizing::new([0u8; 32]);
        digest.copy_from_slice(&mac.finalize().into_bytes());

        SecretKey::from_slice(digest.as_ref())
            .map_err(|e| IdentityError::crypto_error(format!("Invalid blinding key: {}", e)))
    }
}

impl fmt::Debug for MasterBlindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterBlindingKey([REDACTED])")
    }
}

/// Spending key pair at one address path
#[derive(Debug, Clone, Copy)]
pub struct ChildKeyPair {
    pub secret_key: SecretKey,
    pub public_key: CompressedPublicKey,
}

/// Blinding key pair for one output script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlindingKeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

/// Master spending and blinding keys of one seed
///
/// Derivation is pure: every method takes `&self` and touches no shared
/// mutable state, so one engine can serve concurrent callers.
#[derive(Clone)]
pub struct KeyDerivationEngine {
    secp: Secp256k1<All>,
    account: Xpriv,
    master_blinding_key: MasterBlindingKey,
    network: Network,
}

impl KeyDerivationEngine {
    /// Build the engine from a seed
    ///
    /// SECURITY: The seed should be wrapped in Zeroizing by the caller
    pub fn from_seed(seed: &[u8], network: Network) -> IdentityResult<Self> {
        if seed.is_empty() {
            return Err(IdentityError::invalid_seed("Seed is empty"));
        }
        if !(MIN_SEED_LEN..=MAX_SEED_LEN).contains(&seed.len()) {
            return Err(IdentityError::invalid_seed(format!(
                "Seed must be {}..={} bytes, got {}",
                MIN_SEED_LEN,
                MAX_SEED_LEN,
                seed.len()
            )));
        }

        let secp = Secp256k1::new();
        let kind = if network.is_testnet() { NetworkKind::Test } else { NetworkKind::Main };
        let master = Xpriv::new_master(kind, seed)
            .map_err(|e| IdentityError::invalid_seed(format!("Unusable seed: {}", e)))?;
        let account = master.derive_priv(&secp, &AddressPath::account_path()?)?;
        let master_blinding_key = MasterBlindingKey::from_seed(seed)?;

        Ok(Self {
            secp,
            account,
            master_blinding_key,
            network,
        })
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn secp(&self) -> &Secp256k1<All> {
        &self.secp
    }

    /// Extended public key of the `m/84'/0'/0'` account node
    pub fn account_xpub(&self) -> Xpub {
        Xpub::from_priv(&self.secp, &self.account)
    }

    /// Spending key pair at `m/84'/0'/0'/{chain}/{index}`
    pub fn derive_child(&self, chain: Chain, index: u32) -> IdentityResult<ChildKeyPair> {
        let path = AddressPath::new(chain, index)?;
        self.derive_path(&path)
    }

    pub fn derive_path(&self, path: &AddressPath) -> IdentityResult<ChildKeyPair> {
        let child = self.account.derive_priv(&self.secp, &path.relative_path()?)?;
        let secret_key = child.private_key;
        let public_key = CompressedPublicKey(secret_key.public_key(&self.secp));

        Ok(ChildKeyPair {
            secret_key,
            public_key,
        })
    }

    /// Blinding key pair for an output script
    ///
    /// Works for any script, including ones this engine never generated.
    pub fn blinding_key_for(&self, script_pubkey: &[u8]) -> IdentityResult<BlindingKeyPair> {
        let secret_key = self.master_blinding_key.blinding_private_key(script_pubkey)?;
        let public_key = secret_key.public_key(&self.secp);

        Ok(BlindingKeyPair {
            secret_key,
            public_key,
        })
    }
}

impl fmt::Debug for KeyDerivationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyDerivationEngine")
            .field("network", &self.network)
            .field("account_xpub", &self.account_xpub().to_string())
            .finish_non_exhaustive()
    }
}
