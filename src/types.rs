//! Shared types for the identity engine
//!
//! Data structures that cross module boundaries are defined here
//! for consistent serialization.

use elements::AddressParams;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{IdentityError, IdentityResult};
use crate::wallet::AddressPath;

// =============================================================================
// Chain Types
// =============================================================================

/// The two independent address sequences of a wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    /// Receiving addresses
    External,
    /// Change addresses
    Internal,
}

impl Chain {
    pub const ALL: [Chain; 2] = [Chain::External, Chain::Internal];

    /// BIP32 level used for this chain in the derivation path
    pub fn index(&self) -> u32 {
        match self {
            Chain::External => 0,
            Chain::Internal => 1,
        }
    }

    pub fn from_index(index: u32) -> Option<Chain> {
        match index {
            0 => Some(Chain::External),
            1 => Some(Chain::Internal),
            _ => None,
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chain::External => write!(f, "external"),
            Chain::Internal => write!(f, "internal"),
        }
    }
}

/// Supported confidential-transaction networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Network {
    Liquid,
    LiquidTestnet,
    Regtest,
}

impl Network {
    /// Address encoding parameters (bech32/blech32 prefixes, version bytes)
    pub fn address_params(&self) -> &'static AddressParams {
        match self {
            Network::Liquid => &AddressParams::LIQUID,
            Network::LiquidTestnet => &AddressParams::LIQUID_TESTNET,
            Network::Regtest => &AddressParams::ELEMENTS,
        }
    }

    pub fn is_testnet(&self) -> bool {
        !matches!(self, Network::Liquid)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Network::Liquid => "liquid",
            Network::LiquidTestnet => "liquid-testnet",
            Network::Regtest => "regtest",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = IdentityError;

    fn from_str(s: &str) -> IdentityResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "liquid" | "mainnet" => Ok(Network::Liquid),
            "liquid-testnet" | "testnet" => Ok(Network::LiquidTestnet),
            "regtest" | "elements" => Ok(Network::Regtest),
            other => Err(IdentityError::invalid_input(format!("Unknown network: {}", other))),
        }
    }
}

// =============================================================================
// Address Types
// =============================================================================

/// One address handed out by the wallet
///
/// Immutable once built. The blinding key is a pure function of
/// `script_pubkey`, independent of the derivation path.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    pub derivation_path: AddressPath,
    pub confidential_address: String,
    /// Unconfidential output script, hex
    pub script_pubkey: String,
    pub blinding_private_key: String,
    /// Compressed spending public key, hex
    pub public_key: String,
}

impl AddressRecord {
    pub fn chain(&self) -> Chain {
        self.derivation_path.chain
    }

    pub fn index(&self) -> u32 {
        self.derivation_path.index
    }
}

impl fmt::Debug for AddressRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddressRecord")
            .field("derivation_path", &self.derivation_path)
            .field("confidential_address", &self.confidential_address)
            .field("script_pubkey", &self.script_pubkey)
            .field("blinding_private_key", &"[REDACTED]")
            .field("public_key", &self.public_key)
            .finish()
    }
}

/// Minimal persisted restoration state: last used index per chain
///
/// An absent field means no address has been used on that chain yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestorerCheckpoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_external_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_internal_index: Option<u32>,
}

impl RestorerCheckpoint {
    pub fn new(external: Option<u32>, internal: Option<u32>) -> Self {
        Self {
            last_used_external_index: external,
            last_used_internal_index: internal,
        }
    }

    pub fn last_used(&self, chain: Chain) -> Option<u32> {
        match chain {
            Chain::External => self.last_used_external_index,
            Chain::Internal => self.last_used_internal_index,
        }
    }
}

// =============================================================================
// Multisig Types
// =============================================================================

/// Confidential M-of-N payment shared by all co-signers
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigPayment {
    pub blinding_private_key: String,
    pub confidential_address: String,
    /// Witness script, hex
    pub witness_script: String,
}

impl fmt::Debug for MultisigPayment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultisigPayment")
            .field("blinding_private_key", &"[REDACTED]")
            .field("confidential_address", &self.confidential_address)
            .field("witness_script", &self.witness_script)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_index_roundtrip() {
        for chain in Chain::ALL {
            assert_eq!(Chain::from_index(chain.index()), Some(chain));
        }
        assert_eq!(Chain::from_index(2), None);
    }

    #[test]
    fn test_network_parse() {
        assert_eq!("liquid".parse::<Network>().unwrap(), Network::Liquid);
        assert_eq!("Liquid-Testnet".parse::<Network>().unwrap(), Network::LiquidTestnet);
        assert!("bitcoin".parse::<Network>().is_err());
    }

    #[test]
    fn test_checkpoint_wire_format() {
        let checkpoint = RestorerCheckpoint::new(Some(15), None);
        let json = serde_json::to_string(&checkpoint).unwrap();
        assert_eq!(json, r#"{"lastUsedExternalIndex":15}"#);

        let parsed: RestorerCheckpoint = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, RestorerCheckpoint::default());

        let parsed: RestorerCheckpoint =
            serde_json::from_str(r#"{"lastUsedExternalIndex":15,"lastUsedInternalIndex":4}"#).unwrap();
        assert_eq!(parsed.last_used(Chain::External), Some(15));
        assert_eq!(parsed.last_used(Chain::Internal), Some(4));
    }

    #[test]
    fn test_address_record_debug_is_redacted() {
        let key = "3ca8245e4b3e938cfe78ae124767b3e277ac7eb786cc9b305750efb7a2da150c";
        let record = AddressRecord {
            derivation_path: AddressPath::new(Chain::External, 42).unwrap(),
            confidential_address: "lq1qq".to_string(),
            script_pubkey: "0014360bbc35ad20f7a1ae6968bae9a44698f1c85529".to_string(),
            blinding_private_key: key.to_string(),
            public_key: "0212c8b6bea7e0061f41d16ec5b4c18f51335e133f3f4037af66d058c6e3bc9ecb".to_string(),
        };

        let debug = format!("{:?}", record);
        assert!(debug.contains("REDACTED"));
        assert!(debug.contains("0014360bbc35ad20f7a1ae6968bae9a44698f1c85529"));
        assert!(!debug.contains(key));
    }

    #[test]
    fn test_multisig_payment_debug_is_redacted() {
        let key = "0b7616adc564e4d155453f086f7b7f41dbcb56b343b740746dec06d9b61c31aa";
        let payment = MultisigPayment {
            blinding_private_key: key.to_string(),
            confidential_address: "lq1qq".to_string(),
            witness_script: "5221ae".to_string(),
        };

        let debug = format!("{:#?}", payment);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains(key));
    }

    #[test]
    fn test_checkpoint_rejects_negative_index() {
        assert!(serde_json::from_str::<RestorerCheckpoint>(r#"{"lastUsedExternalIndex":-1}"#).is_err());
    }
}
