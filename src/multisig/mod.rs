//! Multisig Module
//!
//! Deterministic M-of-N confidential payments that every co-signer can
//! rebuild from public material alone.

pub mod ordering;
pub mod blinding;
pub mod payment;

pub use blinding::{aggregate, shared_master_blinding_key, MULTISIG_BLINDING_TAG};
pub use ordering::{compare_keys, sort_keys};
pub use payment::{build, build_with_required, witness_script, Threshold, MAX_MULTISIG_KEYS};
