//! Multisig Payment Builder
//!
//! Builds the confidential P2WSH address of a sorted M-of-N
//! `OP_CHECKMULTISIG` script, blinded with the co-signers' shared key.

use bitcoin::secp256k1::{PublicKey, Secp256k1};
use elements::opcodes::all::OP_CHECKMULTISIG;
use elements::script::Builder;
use elements::{Address, Script};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IdentityError, IdentityResult};
use crate::types::{MultisigPayment, Network};
use crate::wallet::blinding_public_key;

use super::blinding::shared_master_blinding_key;
use super::ordering::sort_keys;

/// Standard limit of `OP_CHECKMULTISIG`
pub const MAX_MULTISIG_KEYS: usize = 20;

/// Validated M-of-N signature requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawThreshold", into = "RawThreshold")]
pub struct Threshold {
    required: u32,
    total: u32,
}

#[derive(Serialize, Deserialize)]
struct RawThreshold {
    required: u32,
    total: u32,
}

impl Threshold {
    /// `required` must be in `[1, total]`
    pub fn new(required: u32, total: u32) -> IdentityResult<Self> {
        if required == 0 || required > total {
            return Err(IdentityError::invalid_threshold(format!(
                "{}-of-{} multisig",
                required, total
            ))
            .with_details(format!("required signatures must be in [1, {}]", total)));
        }
        Ok(Self { required, total })
    }

    pub fn required(&self) -> u32 {
        self.required
    }

    pub fn total(&self) -> u32 {
        self.total
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-of-{}", self.required, self.total)
    }
}

impl TryFrom<RawThreshold> for Threshold {
    type Error = IdentityError;

    fn try_from(raw: RawThreshold) -> Result<Self, Self::Error> {
        Threshold::new(raw.required, raw.total)
    }
}

impl From<Threshold> for RawThreshold {
    fn from(threshold: Threshold) -> Self {
        RawThreshold {
            required: threshold.required,
            total: threshold.total,
        }
    }
}

/// Sorted `m <keys> n OP_CHECKMULTISIG` witness script
pub fn witness_script(public_keys: &[PublicKey], threshold: Threshold) -> IdentityResult<Script> {
    if public_keys.is_empty() || public_keys.len() > MAX_MULTISIG_KEYS {
        return Err(IdentityError::payment_failed(format!(
            "Multisig needs 1..={} keys, got {}",
            MAX_MULTISIG_KEYS,
            public_keys.len()
        )));
    }
    if threshold.total() as usize != public_keys.len() {
        return Err(IdentityError::invalid_threshold(format!(
            "Threshold {} does not match {} keys",
            threshold,
            public_keys.len()
        )));
    }

    let mut builder = Builder::new().push_int(i64::from(threshold.required()));
    for key in sort_keys(public_keys) {
        builder = builder.push_slice(&key.serialize());
    }
    Ok(builder
        .push_int(public_keys.len() as i64)
        .push_opcode(OP_CHECKMULTISIG)
        .into_script())
}

/// Confidential M-of-N payment for the given co-signer keys and chain codes
pub fn build<C: AsRef<[u8]>>(
    public_keys: &[PublicKey],
    chain_codes: &[C],
    threshold: Threshold,
    network: Network,
) -> IdentityResult<MultisigPayment> {
    if public_keys.len() != chain_codes.len() {
        return Err(IdentityError::invalid_input(format!(
            "{} public keys but {} chain codes",
            public_keys.len(),
            chain_codes.len()
        )));
    }

    let script = witness_script(public_keys, threshold)?;
    let params = network.address_params();
    let unconfidential = Address::p2wsh(&script, None, params);

    let master = shared_master_blinding_key(chain_codes)?;
    let blinding_key = master.blinding_private_key(unconfidential.script_pubkey().as_bytes())?;
    let blinder = blinding_public_key(&blinding_key.public_key(&Secp256k1::new()).serialize())?;

    let confidential = Address::p2wsh(&script, Some(blinder), params);
    if !confidential.is_blinded() || confidential.script_pubkey() != unconfidential.script_pubkey() {
        return Err(IdentityError::payment_failed("Confidential address does not match its script"));
    }

    Ok(MultisigPayment {
        blinding_private_key: hex::encode(blinding_key.secret_bytes()),
        confidential_address: confidential.to_string(),
        witness_script: hex::encode(script.as_bytes()),
    })
}

/// `build` with a raw signature count checked against the key count
pub fn build_with_required<C: AsRef<[u8]>>(
    public_keys: &[PublicKey],
    chain_codes: &[C],
    required: u32,
    network: Network,
) -> IdentityResult<MultisigPayment> {
    let threshold = Threshold::new(required, public_keys.len() as u32)?;
    build(public_keys, chain_codes, threshold, network)
}
