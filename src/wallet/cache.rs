//! Address Cache
//!
//! Per-chain, index-ordered record of every address handed out, plus a
//! script index for blinding-key lookups. For each chain the cached indices
//! are exactly `0..next_index(chain)`.

use std::collections::HashMap;

use crate::error::{IdentityError, IdentityResult};
use crate::types::{AddressRecord, Chain, RestorerCheckpoint};

use super::address::AddressFactory;
use super::derivation_path::AddressPath;

/// Mutable wallet state: cached addresses and next index per chain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletState {
    external: Vec<AddressRecord>,
    internal: Vec<AddressRecord>,
    /// Generation order across both chains
    order: Vec<AddressPath>,
    /// Script hex -> path
    by_script: HashMap<String, AddressPath>,
}

impl WalletState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_index(&self, chain: Chain) -> u32 {
        self.records(chain).len() as u32
    }

    pub fn records(&self, chain: Chain) -> &[AddressRecord] {
        match chain {
            Chain::External => &self.external,
            Chain::Internal => &self.internal,
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Cache a record built at exactly `next_index(chain)`
    pub fn append(&mut self, record: AddressRecord) -> IdentityResult<()> {
        let path = record.derivation_path;
        let expected = self.next_index(path.chain);
        if path.index != expected {
            return Err(IdentityError::internal(format!(
                "Out-of-order append on {} chain: expected index {}, got {}",
                path.chain, expected, path.index
            )));
        }

        self.by_script.insert(record.script_pubkey.clone(), path);
        self.order.push(path);
        match path.chain {
            Chain::External => self.external.push(record),
            Chain::Internal => self.internal.push(record),
        }
        Ok(())
    }

    /// Build, cache and return the address at `next_index(chain)`
    pub fn next_address(
        &mut self,
        factory: &AddressFactory<'_>,
        chain: Chain,
    ) -> IdentityResult<AddressRecord> {
        let record = factory.build(chain, self.next_index(chain))?;
        self.append(record.clone())?;
        Ok(record)
    }

    /// Every cached record in the order it was generated
    pub fn all_addresses(&self) -> impl Iterator<Item = &AddressRecord> + '_ {
        self.order
            .iter()
            .filter_map(move |path| self.records(path.chain).get(path.index as usize))
    }

    pub fn lookup_script(&self, script_pubkey: &[u8]) -> Option<&AddressRecord> {
        let path = self.by_script.get(&hex::encode(script_pubkey))?;
        self.records(path.chain).get(path.index as usize)
    }

    /// Checkpoint that replays to this state
    pub fn checkpoint(&self) -> RestorerCheckpoint {
        let last_used = |chain| self.next_index(chain).checked_sub(1);
        RestorerCheckpoint::new(last_used(Chain::External), last_used(Chain::Internal))
    }
}
