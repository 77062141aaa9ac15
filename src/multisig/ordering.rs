//! Canonical Key Order
//!
//! Co-signer keys are sorted by their compressed 33-byte serialization so
//! every participant assembles a byte-identical witness script.

use bitcoin::secp256k1::PublicKey;
use std::cmp::Ordering;

/// Byte-lexicographic comparison of compressed encodings
pub fn compare_keys(a: &PublicKey, b: &PublicKey) -> Ordering {
    a.serialize().cmp(&b.serialize())
}

/// Keys in canonical order; duplicates are kept
pub fn sort_keys(keys: &[PublicKey]) -> Vec<PublicKey> {
    let mut sorted = keys.to_vec();
    sorted.sort_by(compare_keys);
    sorted
}
