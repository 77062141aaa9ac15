//! Shared Multisig Blinding Key
//!
//! Co-signers only see each other's extended public keys, so the shared
//! master blinding key is built from their chain codes:
//! `SLIP-77(sha256(TAG || cc_1 ^ cc_2 ^ ... ^ cc_n))`.

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::error::{IdentityError, IdentityResult};
use crate::wallet::MasterBlindingKey;

/// Chain code length of a BIP32 node
pub const CHAIN_CODE_LEN: usize = 32;

/// Domain separation for the aggregated seed
pub const MULTISIG_BLINDING_TAG: &[u8] = b"LiquidMultisigBlindingKey";

/// Order-independent shared seed of N chain codes
pub fn aggregate<C: AsRef<[u8]>>(chain_codes: &[C]) -> IdentityResult<Zeroizing<[u8; 32]>> {
    if chain_codes.is_empty() {
        return Err(IdentityError::invalid_input("At least one chain code is required"));
    }

    let mut combined = Zeroizing::new([0u8; CHAIN_CODE_LEN]);
    for (position, chain_code) in chain_codes.iter().enumerate() {
        let bytes = chain_code.as_ref();
        if bytes.len() != CHAIN_CODE_LEN {
            return Err(IdentityError::chain_code_length(format!(
                "Chain code {} is {} bytes, expected {}",
                position,
                bytes.len(),
                CHAIN_CODE_LEN
            )));
        }
        for (acc, byte) in combined.iter_mut().zip(bytes) {
            *acc ^= byte;
        }
    }

    let mut hasher = Sha256::new();
    hasher.update(MULTISIG_BLINDING_TAG);
    hasher.update(&combined[..]);

    let mut seed = Zeroizing::new([0u8; 32]);
    seed.copy_from_slice(&hasher.finalize());
    Ok(seed)
}

/// Master blinding key shared by the co-signers
pub fn shared_master_blinding_key<C: AsRef<[u8]>>(chain_codes: &[C]) -> IdentityResult<MasterBlindingKey> {
    let seed = aggregate(chain_codes)?;
    MasterBlindingKey::from_seed(&seed[..])
}
