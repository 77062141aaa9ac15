//! Esplora Chain Source
//!
//! Blocking client for Esplora-compatible explorers (Blockstream's Liquid
//! explorer, a local electrs). Esplora indexes unconfidential addresses, so
//! confidential addresses are stripped of their blinding key before querying.

use elements::Address;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

use crate::config::ExplorerConfig;
use crate::error::{IdentityError, IdentityResult};
use crate::log_debug;

use super::{ChainSource, ChainSourceError};

/// Esplora REST client
#[derive(Debug, Clone)]
pub struct EsploraSource {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct AddressInfo {
    chain_stats: TxStats,
    mempool_stats: TxStats,
}

#[derive(Debug, Deserialize)]
struct TxStats {
    tx_count: u64,
}

impl EsploraSource {
    pub fn new(config: &ExplorerConfig) -> IdentityResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("liquid-identity/0.1")
            .build()
            .map_err(|e| IdentityError::invalid_config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, path: &str) -> Result<reqwest::blocking::Response, ChainSourceError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self.client.get(&url).send()?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(ChainSourceError::NotFound(path.to_string())),
            status => Err(ChainSourceError::Unavailable(format!("HTTP {} for {}", status, path))),
        }
    }
}

impl ChainSource for EsploraSource {
    fn is_address_used(&self, address: &str) -> Result<bool, ChainSourceError> {
        let unconfidential = unconfidential_address(address)?;
        let body = self.get(&format!("address/{}", unconfidential))?.text()?;
        let used = parse_address_usage(&body)?;

        log_debug!("esplora", "Address usage", address = unconfidential, used = used);
        Ok(used)
    }

    fn fetch_raw_transaction(&self, txid: &str) -> Result<Vec<u8>, ChainSourceError> {
        let body = self.get(&format!("tx/{}/hex", txid.trim()))?.text()?;
        hex::decode(body.trim())
            .map_err(|e| ChainSourceError::InvalidResponse(format!("Transaction hex: {}", e)))
    }

    /// Queries the whole batch concurrently; results keep input order
    fn addresses_used(&self, addresses: &[String]) -> Result<Vec<bool>, ChainSourceError> {
        std::thread::scope(|scope| {
            let handles: Vec<_> = addresses
                .iter()
                .map(|address| scope.spawn(move || self.is_address_used(address)))
                .collect();

            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .map_err(|_| ChainSourceError::Unavailable("Query worker panicked".to_string()))?
                })
                .collect()
        })
    }
}

impl From<reqwest::Error> for ChainSourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ChainSourceError::Unavailable("Request timed out".to_string())
        } else if e.is_connect() {
            ChainSourceError::Unavailable("Connection failed".to_string())
        } else if e.is_decode() {
            ChainSourceError::InvalidResponse(e.to_string())
        } else {
            ChainSourceError::Unavailable(e.to_string())
        }
    }
}

/// Strip the blinding key from a (possibly) confidential address
pub fn unconfidential_address(address: &str) -> Result<String, ChainSourceError> {
    let parsed = Address::from_str(address.trim())
        .map_err(|e| ChainSourceError::InvalidAddress(format!("{}: {}", address, e)))?;
    Ok(parsed.to_unconfidential().to_string())
}

fn parse_address_usage(body: &str) -> Result<bool, ChainSourceError> {
    let info: AddressInfo = serde_json::from_str(body)
        .map_err(|e| ChainSourceError::InvalidResponse(format!("Address stats: {}", e)))?;
    Ok(info.chain_stats.tx_count + info.mempool_stats.tx_count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Chain, Network};
    use crate::wallet::{engine_from_mnemonic, AddressFactory};

    #[test]
    fn test_address_usage_parsing() {
        let used = r#"{"address":"ex1q...","chain_stats":{"funded_txo_count":1,"spent_txo_count":0,"tx_count":1},"mempool_stats":{"funded_txo_count":0,"spent_txo_count":0,"tx_count":0}}"#;
        assert!(parse_address_usage(used).unwrap());

        let mempool_only = r#"{"chain_stats":{"tx_count":0},"mempool_stats":{"tx_count":2}}"#;
        assert!(parse_address_usage(mempool_only).unwrap());

        let unused = r#"{"chain_stats":{"tx_count":0},"mempool_stats":{"tx_count":0}}"#;
        assert!(!parse_address_usage(unused).unwrap());
    }

    #[test]
    fn test_malformed_response() {
        let err = parse_address_usage("<html>rate limited</html>").unwrap_err();
        assert!(matches!(err, ChainSourceError::InvalidResponse(_)));
    }

    #[test]
    fn test_unconfidential_address() {
        let engine = engine_from_mnemonic(
            "turn manual grain tobacco pluck onion off chief drive amount slice forward",
            None,
            None,
            Network::Liquid,
        )
        .unwrap();
        let record = AddressFactory::new(&engine).build(Chain::External, 0).unwrap();

        let plain = unconfidential_address(&record.confidential_address).unwrap();
        assert!(plain.starts_with("ex1"));
        assert_eq!(unconfidential_address(&plain).unwrap(), plain);
    }

    #[test]
    fn test_invalid_address() {
        let err = unconfidential_address("definitely-not-an-address").unwrap_err();
        assert!(matches!(err, ChainSourceError::InvalidAddress(_)));
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let config = ExplorerConfig {
            base_url: "http://remote.example/api".to_string(),
            timeout_secs: 5,
        };
        assert!(EsploraSource::new(&config).is_err());
    }
}
