//! API Module
//!
//! The chain data source the restorer queries, plus an Esplora client.

mod esplora;

pub use esplora::*;

use thiserror::Error;

/// Chain data source errors
///
/// Surfaced unchanged to the caller; nothing here is retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainSourceError {
    #[error("Chain data source unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid response from chain data source: {0}")]
    InvalidResponse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

/// Read access to on-chain history
pub trait ChainSource {
    /// Whether the address ever received funds or appeared in a transaction
    fn is_address_used(&self, address: &str) -> Result<bool, ChainSourceError>;

    /// Raw serialized transaction
    fn fetch_raw_transaction(&self, txid: &str) -> Result<Vec<u8>, ChainSourceError>;

    /// Usage of several addresses, answered in input order
    ///
    /// Implementations may pipeline the queries but must keep the order.
    fn addresses_used(&self, addresses: &[String]) -> Result<Vec<bool>, ChainSourceError> {
        addresses.iter().map(|a| self.is_address_used(a)).collect()
    }
}

impl<T: ChainSource + ?Sized> ChainSource for &T {
    fn is_address_used(&self, address: &str) -> Result<bool, ChainSourceError> {
        (**self).is_address_used(address)
    }

    fn fetch_raw_transaction(&self, txid: &str) -> Result<Vec<u8>, ChainSourceError> {
        (**self).fetch_raw_transaction(txid)
    }

    fn addresses_used(&self, addresses: &[String]) -> Result<Vec<bool>, ChainSourceError> {
        (**self).addresses_used(addresses)
    }
}
