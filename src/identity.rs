//! Wallet Identities
//!
//! An identity is either a mnemonic-backed single-sig wallet or a watch-only
//! M-of-N multisig wallet assembled from co-signer extended public keys.
//! Both expose the same capability surface through [`Identity`].

use bitcoin::bip32::Xpub;
use bitcoin::secp256k1::{All, PublicKey, Secp256k1, SecretKey};
use elements::{Address, Script};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::{RestorerConfig, DEFAULT_LOOKAHEAD};
use crate::error::{IdentityError, IdentityResult};
use crate::multisig::{self, Threshold, MAX_MULTISIG_KEYS};
use crate::restore::RestorationSession;
use crate::types::{AddressRecord, Chain, MultisigPayment, Network, RestorerCheckpoint};
use crate::wallet::{
    engine_from_mnemonic, parse_confidential_address, AddressFactory, AddressPath,
    KeyDerivationEngine, MasterBlindingKey, WalletState, HARDENED,
};
use crate::{log_debug, log_info};

// =============================================================================
// Identity Type Selection
// =============================================================================

/// Kind of identity to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityType {
    Mnemonic,
    Multisig,
}

impl fmt::Display for IdentityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityType::Mnemonic => write!(f, "mnemonic"),
            IdentityType::Multisig => write!(f, "multisig"),
        }
    }
}

impl FromStr for IdentityType {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mnemonic" => Ok(IdentityType::Mnemonic),
            "multisig" => Ok(IdentityType::Multisig),
            other => Err(IdentityError::invalid_input(format!("Unknown identity type: {}", other))),
        }
    }
}

// =============================================================================
// Mnemonic Identity
// =============================================================================

/// Single-sig identity derived from a mnemonic seed
#[derive(Debug, Clone)]
pub struct MnemonicIdentity {
    engine: KeyDerivationEngine,
    state: WalletState,
    lookahead: u32,
}

impl MnemonicIdentity {
    /// Fails on a malformed phrase or unknown language; no identity is produced
    pub fn from_mnemonic(
        phrase: &str,
        language: Option<&str>,
        passphrase: Option<&str>,
        network: Network,
    ) -> IdentityResult<Self> {
        let engine = engine_from_mnemonic(phrase, language, passphrase, network)?;
        log_info!("identity", "Mnemonic identity created", network = network);
        Ok(Self::from_engine(engine))
    }

    pub fn from_seed(seed: &[u8], network: Network) -> IdentityResult<Self> {
        let engine = KeyDerivationEngine::from_seed(seed, network)?;
        log_info!("identity", "Seed identity created", network = network);
        Ok(Self::from_engine(engine))
    }

    pub fn from_engine(engine: KeyDerivationEngine) -> Self {
        Self {
            engine,
            state: WalletState::new(),
            lookahead: DEFAULT_LOOKAHEAD,
        }
    }

    /// Look-ahead window taken from restorer tunables
    pub fn with_config(mut self, config: &RestorerConfig) -> Self {
        self.lookahead = config.lookahead;
        self
    }

    /// Same keys, different address state
    pub fn with_state(&self, state: WalletState) -> Self {
        Self {
            engine: self.engine.clone(),
            state,
            lookahead: self.lookahead,
        }
    }

    pub fn network(&self) -> Network {
        self.engine.network()
    }

    pub fn engine(&self) -> &KeyDerivationEngine {
        &self.engine
    }

    pub fn state(&self) -> &WalletState {
        &self.state
    }

    pub fn factory(&self) -> AddressFactory<'_> {
        AddressFactory::new(&self.engine)
    }

    pub fn next_index(&self, chain: Chain) -> u32 {
        self.state.next_index(chain)
    }

    /// Hand out and cache the next address on `chain`
    pub fn next_address(&mut self, chain: Chain) -> IdentityResult<AddressRecord> {
        let factory = AddressFactory::new(&self.engine);
        self.state.next_address(&factory, chain)
    }

    /// Every handed-out address, in generation order
    pub fn all_addresses(&self) -> Vec<AddressRecord> {
        self.state.all_addresses().cloned().collect()
    }

    pub fn addresses(&self, chain: Chain) -> &[AddressRecord] {
        self.state.records(chain)
    }

    pub fn checkpoint(&self) -> RestorerCheckpoint {
        self.state.checkpoint()
    }

    /// Blinding private key of one of this wallet's output scripts
    ///
    /// Scripts not yet cached are recognised up to `lookahead` indices past
    /// the next index of each chain.
    pub fn blinding_key_for_script(&self, script_pubkey: &[u8]) -> IdentityResult<SecretKey> {
        if let Some(record) = self.state.lookup_script(script_pubkey) {
            return SecretKey::from_str(&record.blinding_private_key)
                .map_err(|e| IdentityError::crypto_error(format!("Corrupt cached blinding key: {}", e)));
        }

        if let Some(path) = self.find_uncached(script_pubkey)? {
            log_debug!("identity", "Script matched ahead of cache", path = path);
            return Ok(self.engine.blinding_key_for(script_pubkey)?.secret_key);
        }

        log_debug!("identity", "Unknown script", script = hex::encode(script_pubkey));
        Err(IdentityError::unknown_script("Script does not belong to this wallet")
            .with_details(format!("checked {} indices past each chain's next index", self.lookahead)))
    }

    /// Blinding private key for a confidential address blinded by this wallet
    pub fn blinding_key_for_address(&self, address: &str) -> IdentityResult<SecretKey> {
        let parsed = parse_confidential_address(address, self.network())?;
        let blinder = parsed
            .blinding_pubkey
            .ok_or_else(|| IdentityError::invalid_input("Address carries no blinding public key"))?;

        let pair = self.engine.blinding_key_for(parsed.script_pubkey().as_bytes())?;
        if pair.public_key.serialize() != blinder.serialize() {
            log_debug!("identity", "Foreign blinding key", address = address);
            return Err(IdentityError::unknown_script(
                "Address was not blinded with this wallet's master blinding key",
            ));
        }
        Ok(pair.secret_key)
    }

    pub fn prepare_restoration(&self) -> RestorationSession<'_> {
        RestorationSession::new(self)
    }

    fn find_uncached(&self, script_pubkey: &[u8]) -> IdentityResult<Option<AddressPath>> {
        let factory = self.factory();
        for chain in Chain::ALL {
            let start = self.state.next_index(chain);
            let end = start.saturating_add(self.lookahead).min(HARDENED);
            for index in start..end {
                let path = AddressPath::new(chain, index)?;
                if factory.script_at(path)?.as_bytes() == script_pubkey {
                    return Ok(Some(path));
                }
            }
        }
        Ok(None)
    }
}

// =============================================================================
// Multisig Identity
// =============================================================================

/// Watch-only M-of-N identity built from co-signer account xpubs
#[derive(Debug, Clone)]
pub struct MultisigIdentity {
    secp: Secp256k1<All>,
    cosigners: Vec<Xpub>,
    threshold: Threshold,
    network: Network,
    master_blinding_key: MasterBlindingKey,
    next_external: u32,
    next_internal: u32,
    lookahead: u32,
}

impl MultisigIdentity {
    pub fn new(cosigners: Vec<Xpub>, threshold: Threshold, network: Network) -> IdentityResult<Self> {
        if threshold.total() as usize != cosigners.len() {
            return Err(IdentityError::invalid_threshold(format!(
                "Threshold {} does not match {} co-signers",
                threshold,
                cosigners.len()
            )));
        }
        if cosigners.len() > MAX_MULTISIG_KEYS {
            return Err(IdentityError::payment_failed(format!(
                "At most {} co-signers are supported",
                MAX_MULTISIG_KEYS
            )));
        }

        let master_blinding_key = multisig::shared_master_blinding_key(&chain_codes(&cosigners))?;
        log_info!(
            "identity",
            "Multisig identity created",
            network = network,
            threshold = threshold
        );

        Ok(Self {
            secp: Secp256k1::new(),
            cosigners,
            threshold,
            network,
            master_blinding_key,
            next_external: 0,
            next_internal: 0,
            lookahead: DEFAULT_LOOKAHEAD,
        })
    }

    /// Parse the xpubs and validate the raw signature count
    pub fn from_xpubs(xpubs: &[&str], required: u32, network: Network) -> IdentityResult<Self> {
        let cosigners = xpubs
            .iter()
            .map(|s| {
                Xpub::from_str(s.trim())
                    .map_err(|e| IdentityError::invalid_input(format!("Invalid xpub: {}", e)))
            })
            .collect::<IdentityResult<Vec<_>>>()?;
        let threshold = Threshold::new(required, cosigners.len() as u32)?;
        Self::new(cosigners, threshold, network)
    }

    /// Look-ahead window taken from restorer tunables
    pub fn with_config(mut self, config: &RestorerConfig) -> Self {
        self.lookahead = config.lookahead;
        self
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    pub fn next_index(&self, chain: Chain) -> u32 {
        match chain {
            Chain::External => self.next_external,
            Chain::Internal => self.next_internal,
        }
    }

    /// Payment at an explicit position; does not advance the counters
    pub fn payment(&self, chain: Chain, index: u32) -> IdentityResult<MultisigPayment> {
        let keys = self.cosigner_keys(AddressPath::new(chain, index)?)?;
        multisig::build(&keys, &chain_codes(&self.cosigners), self.threshold, self.network)
    }

    pub fn next_address(&mut self, chain: Chain) -> IdentityResult<MultisigPayment> {
        let index = self.next_index(chain);
        let payment = self.payment(chain, index)?;
        match chain {
            Chain::External => self.next_external += 1,
            Chain::Internal => self.next_internal += 1,
        }
        Ok(payment)
    }

    /// Shared blinding key of a script this identity hands out
    ///
    /// Positions up to `lookahead` indices past each chain's next index are
    /// recognised.
    pub fn blinding_key_for_script(&self, script_pubkey: &[u8]) -> IdentityResult<SecretKey> {
        for chain in Chain::ALL {
            let end = self.next_index(chain).saturating_add(self.lookahead).min(HARDENED);
            for index in 0..end {
                if self.script_at(AddressPath::new(chain, index)?)?.as_bytes() == script_pubkey {
                    return self.master_blinding_key.blinding_private_key(script_pubkey);
                }
            }
        }

        log_debug!("identity", "Unknown multisig script", script = hex::encode(script_pubkey));
        Err(IdentityError::unknown_script("Script does not belong to this multisig wallet")
            .with_details(format!("checked {} indices past each chain's next index", self.lookahead)))
    }

    fn cosigner_keys(&self, path: AddressPath) -> IdentityResult<Vec<PublicKey>> {
        let relative = path.relative_path()?;
        self.cosigners
            .iter()
            .map(|xpub| Ok(xpub.derive_pub(&self.secp, &relative)?.public_key))
            .collect()
    }

    fn script_at(&self, path: AddressPath) -> IdentityResult<Script> {
        let witness = multisig::witness_script(&self.cosigner_keys(path)?, self.threshold)?;
        Ok(Address::p2wsh(&witness, None, self.network.address_params()).script_pubkey())
    }
}

fn chain_codes(cosigners: &[Xpub]) -> Vec<[u8; 32]> {
    cosigners.iter().map(|xpub| xpub.chain_code.to_bytes()).collect()
}

// =============================================================================
// Identity
// =============================================================================

/// Any supported identity
#[derive(Debug, Clone)]
pub enum Identity {
    Mnemonic(MnemonicIdentity),
    Multisig(MultisigIdentity),
}

impl Identity {
    pub fn identity_type(&self) -> IdentityType {
        match self {
            Identity::Mnemonic(_) => IdentityType::Mnemonic,
            Identity::Multisig(_) => IdentityType::Multisig,
        }
    }

    pub fn network(&self) -> Network {
        match self {
            Identity::Mnemonic(identity) => identity.network(),
            Identity::Multisig(identity) => identity.network(),
        }
    }

    /// Multisig identities hold no private spending keys
    pub fn can_sign(&self) -> bool {
        matches!(self, Identity::Mnemonic(_))
    }

    pub fn can_blind(&self) -> bool {
        true
    }

    /// Next confidential address on `chain`
    pub fn next_address(&mut self, chain: Chain) -> IdentityResult<String> {
        match self {
            Identity::Mnemonic(identity) => Ok(identity.next_address(chain)?.confidential_address),
            Identity::Multisig(identity) => Ok(identity.next_address(chain)?.confidential_address),
        }
    }

    pub fn blinding_key_for_script(&self, script_pubkey: &[u8]) -> IdentityResult<SecretKey> {
        match self {
            Identity::Mnemonic(identity) => identity.blinding_key_for_script(script_pubkey),
            Identity::Multisig(identity) => identity.blinding_key_for_script(script_pubkey),
        }
    }

    pub fn prepare_restoration(&self) -> IdentityResult<RestorationSession<'_>> {
        match self {
            Identity::Mnemonic(identity) => Ok(identity.prepare_restoration()),
            Identity::Multisig(_) => Err(IdentityError::unsupported(
                "Multisig identities have no address history to restore",
            )),
        }
    }
}

impl From<MnemonicIdentity> for Identity {
    fn from(identity: MnemonicIdentity) -> Self {
        Identity::Mnemonic(identity)
    }
}

impl From<MultisigIdentity> for Identity {
    fn from(identity: MultisigIdentity) -> Self {
        Identity::Multisig(identity)
    }
}
