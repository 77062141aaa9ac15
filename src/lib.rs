//! Liquid Identity Core Library
//!
//! Deterministic wallet identities for the Liquid confidential-transaction
//! network.
//!
//! # Architecture
//!
//! This crate provides:
//! - **wallet**: Mnemonic codec, BIP32/SLIP-77 derivation, address cache
//! - **restore**: Gap-limit rescans and checkpoint replay
//! - **multisig**: Canonical key order, shared blinding key, M-of-N payments
//! - **identity**: Mnemonic and multisig identities behind one variant type
//! - **api**: Chain data source trait and an Esplora client
//!
//! # Security
//!
//! Seeds and master blinding keys are zeroized on drop and never printed by
//! `Debug`. Log fields carrying key material are redacted.
//!
//! # Example
//!
//! ```rust,ignore
//! use liquid_identity::{Chain, MnemonicIdentity, Network, RestorerCheckpoint, RestoreStrategy};
//!
//! let identity = MnemonicIdentity::from_mnemonic(phrase, None, None, Network::Liquid)?;
//! let checkpoint = RestorerCheckpoint::new(Some(15), Some(4));
//! let mut restored = identity
//!     .prepare_restoration()
//!     .restore(RestoreStrategy::Checkpoint(checkpoint))?;
//! let next = restored.next_address(Chain::External)?;
//! assert_eq!(next.derivation_path.to_string(), "m/84'/0'/0'/0/16");
//! ```

pub mod error;
pub mod types;
pub mod config;
pub mod utils;
pub mod wallet;
pub mod restore;
pub mod multisig;
pub mod identity;
pub mod api;

pub use error::{ErrorCode, IdentityError, IdentityResult};
pub use types::*;
pub use config::{ExplorerConfig, RestorerConfig};
pub use wallet::{
    engine_from_mnemonic, generate_mnemonic, phrase_to_seed, AddressFactory, AddressPath,
    KeyDerivationEngine, MasterBlindingKey, Seed, WalletState,
};
pub use restore::{ChainScan, Restoration, RestorationSession, RestoreStrategy, ScanReport};
pub use multisig::Threshold;
pub use identity::{Identity, IdentityType, MnemonicIdentity, MultisigIdentity};
pub use api::{ChainSource, ChainSourceError, EsploraSource};
