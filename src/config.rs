//! Restoration and Explorer Configuration
//!
//! Tunables for the gap-limit scan and validated block-explorer endpoints.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{IdentityError, IdentityResult};
use crate::types::Network;

/// Consecutive unused addresses that end a chain's scan
pub const DEFAULT_GAP_LIMIT: u32 = 20;

/// Addresses generated and queried per round-trip
pub const DEFAULT_BATCH_SIZE: u32 = 20;

/// Uncached indices checked when resolving an unknown script
pub const DEFAULT_LOOKAHEAD: u32 = 20;

/// Default explorer request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Restoration tunables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestorerConfig {
    pub gap_limit: u32,
    pub batch_size: u32,
    pub lookahead: u32,
}

impl Default for RestorerConfig {
    fn default() -> Self {
        Self {
            gap_limit: DEFAULT_GAP_LIMIT,
            batch_size: DEFAULT_BATCH_SIZE,
            lookahead: DEFAULT_LOOKAHEAD,
        }
    }
}

impl RestorerConfig {
    pub fn with_gap_limit(mut self, gap_limit: u32) -> Self {
        self.gap_limit = gap_limit;
        self
    }

    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_lookahead(mut self, lookahead: u32) -> Self {
        self.lookahead = lookahead;
        self
    }

    pub fn validate(&self) -> IdentityResult<()> {
        if self.gap_limit == 0 {
            return Err(IdentityError::invalid_config("gap_limit must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(IdentityError::invalid_config("batch_size must be at least 1"));
        }
        Ok(())
    }
}

/// Validation result for an explorer endpoint
#[derive(Debug, Clone)]
pub struct EndpointValidation {
    pub is_valid: bool,
    pub url: Option<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// Esplora-compatible block explorer endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerConfig {
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ExplorerConfig {
    /// Validated custom endpoint
    pub fn new(base_url: &str, timeout_secs: u64) -> IdentityResult<Self> {
        let validation = validate_explorer_url(base_url);
        if !validation.is_valid {
            return Err(IdentityError::invalid_config(format!(
                "Invalid explorer URL '{}'",
                base_url
            ))
            .with_details(validation.errors.join("; ")));
        }
        if timeout_secs == 0 {
            return Err(IdentityError::invalid_config("timeout_secs must be at least 1"));
        }

        let base_url = validation
            .url
            .ok_or_else(|| IdentityError::internal("URL validation succeeded but URL is None"))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs,
        })
    }

    /// Public endpoint for a network; regtest has none
    pub fn for_network(network: Network) -> IdentityResult<Self> {
        match network {
            Network::Liquid => Self::new("https://blockstream.info/liquid/api", DEFAULT_TIMEOUT_SECS),
            Network::LiquidTestnet => {
                Self::new("https://blockstream.info/liquidtestnet/api", DEFAULT_TIMEOUT_SECS)
            }
            Network::Regtest => Err(IdentityError::invalid_config(
                "Regtest has no public explorer; configure base_url explicitly",
            )),
        }
    }

    pub fn validate(&self) -> IdentityResult<()> {
        Self::new(&self.base_url, self.timeout_secs).map(|_| ())
    }
}

/// Validate an explorer URL: https for remote hosts, http only for local ones
pub fn validate_explorer_url(url: &str) -> EndpointValidation {
    let mut warnings = Vec::new();
    let mut errors = Vec::new();

    let parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(e) => {
            errors.push(format!("Invalid URL format: {}", e));
            return EndpointValidation {
                is_valid: false,
                url: None,
                warnings,
                errors,
            };
        }
    };

    match parsed.scheme() {
        "https" => {}
        "http" => {
            let host = parsed.host_str().unwrap_or("");
            if host == "localhost" || host == "127.0.0.1" || host.starts_with("192.168.") {
                warnings.push("HTTP allowed for local development only".to_string());
            } else {
                errors.push("HTTPS required for remote endpoints".to_string());
            }
        }
        other => errors.push(format!("Unsupported URL scheme: {}", other)),
    }

    if !parsed.username().is_empty() || parsed.password().is_some() {
        warnings.push("Credentials in URL - consider using headers for authentication".to_string());
    }

    if parsed.query().is_some() {
        warnings.push("Query string is ignored for explorer base URLs".to_string());
    }

    let is_valid = errors.is_empty();
    EndpointValidation {
        is_valid,
        url: if is_valid { Some(parsed.to_string()) } else { None },
        warnings,
        errors,
    }
}
