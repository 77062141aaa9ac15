//! Address Derivation Paths
//!
//! Every single-sig address lives at `m/84'/0'/0'/{chain}/{index}`:
//! hardened purpose, coin type and account, then a non-hardened chain
//! (0 = external, 1 = internal) and a non-hardened address index.

use bitcoin::bip32::{ChildNumber, DerivationPath};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{IdentityError, IdentityResult};
use crate::types::Chain;

/// BIP84 purpose (native SegWit)
pub const PURPOSE: u32 = 84;

/// Coin type of the fixed path template
pub const COIN_TYPE: u32 = 0;

/// Account of the fixed path template
pub const ACCOUNT: u32 = 0;

/// Hardened offset for BIP-32 derivation
pub const HARDENED: u32 = 0x80000000;

/// Position of one address: chain plus non-hardened index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AddressPath {
    pub chain: Chain,
    pub index: u32,
}

impl AddressPath {
    /// Build a path, rejecting indices that collide with the hardened range
    pub fn new(chain: Chain, index: u32) -> IdentityResult<Self> {
        if index >= HARDENED {
            return Err(IdentityError::unsupported_path(format!(
                "Address index {} does not fit in 31 bits",
                index
            )));
        }
        Ok(Self { chain, index })
    }

    /// Hardened `purpose'/coin_type'/account'` prefix
    pub fn account_path() -> IdentityResult<DerivationPath> {
        Ok(DerivationPath::from(vec![
            ChildNumber::from_hardened_idx(PURPOSE)?,
            ChildNumber::from_hardened_idx(COIN_TYPE)?,
            ChildNumber::from_hardened_idx(ACCOUNT)?,
        ]))
    }

    /// `chain/index` levels below the account node
    pub fn relative_path(&self) -> IdentityResult<DerivationPath> {
        let chain = ChildNumber::from_normal_idx(self.chain.index())
            .map_err(|e| IdentityError::unsupported_path(e.to_string()))?;
        let index = ChildNumber::from_normal_idx(self.index)
            .map_err(|e| IdentityError::unsupported_path(e.to_string()))?;
        Ok(DerivationPath::from(vec![chain, index]))
    }

    /// Full path from the master node
    pub fn full_path(&self) -> IdentityResult<DerivationPath> {
        let account = Self::account_path()?;
        Ok(account.extend(self.relative_path()?))
    }
}

impl fmt::Display for AddressPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "m/{}'/{}'/{}'/{}/{}",
            PURPOSE,
            COIN_TYPE,
            ACCOUNT,
            self.chain.index(),
            self.index
        )
    }
}

impl FromStr for AddressPath {
    type Err = IdentityError;

    fn from_str(s: &str) -> IdentityResult<Self> {
        let components = parse_path(s).map_err(|e| {
            IdentityError::unsupported_path(format!("Invalid derivation path '{}'", s)).with_details(e)
        })?;

        let expected_prefix = [(PURPOSE, true), (COIN_TYPE, true), (ACCOUNT, true)];
        if components.len() != 5 || components[..3] != expected_prefix {
            return Err(IdentityError::unsupported_path(format!(
                "Derivation path '{}' does not match m/{}'/{}'/{}'/<chain>/<index>",
                s, PURPOSE, COIN_TYPE, ACCOUNT
            )));
        }

        let (chain_index, chain_hardened) = components[3];
        let (index, index_hardened) = components[4];
        if chain_hardened || index_hardened {
            return Err(IdentityError::unsupported_path(format!(
                "Chain and index must be non-hardened in '{}'",
                s
            )));
        }

        let chain = Chain::from_index(chain_index).ok_or_else(|| {
            IdentityError::unsupported_path(format!("Unknown chain {} in '{}'", chain_index, s))
        })?;

        AddressPath::new(chain, index)
    }
}

impl TryFrom<String> for AddressPath {
    type Error = IdentityError;

    fn try_from(value: String) -> IdentityResult<Self> {
        value.parse()
    }
}

impl From<AddressPath> for String {
    fn from(path: AddressPath) -> Self {
        path.to_string()
    }
}

/// Parse a derivation path string into (index, hardened) pairs
fn parse_path(path: &str) -> Result<Vec<(u32, bool)>, String> {
    let trimmed = path.trim();

    let path_part = trimmed
        .strip_prefix("m/")
        .or_else(|| trimmed.strip_prefix("M/"))
        .ok_or_else(|| "Derivation path must start with 'm/'".to_string())?;

    if path_part.is_empty() {
        return Err("Empty derivation path".to_string());
    }

    path_part.split('/').map(parse_component).collect()
}

/// Parse a single path component
fn parse_component(s: &str) -> Result<(u32, bool), String> {
    let trimmed = s.trim();

    if trimmed.is_empty() {
        return Err("Empty path component".to_string());
    }

    let (number_str, hardened) = match trimmed.strip_suffix(['\'', 'h', 'H']) {
        Some(number) => (number, true),
        None => (trimmed, false),
    };

    let index: u32 = number_str
        .parse()
        .map_err(|e| format!("Invalid path component '{}': {}", s, e))?;

    if index >= HARDENED {
        return Err(format!("Path component {} exceeds maximum value", index));
    }

    Ok((index, hardened))
}
