//! Gap-Limit Restoration
//!
//! Rediscovers a wallet's address history by walking each chain from index 0,
//! querying the chain data source in batches until `gap_limit` consecutive
//! unused addresses have been seen. Only used addresses (and every lower index
//! on the same chain) end up in the restored state.

use serde::{Deserialize, Serialize};

use crate::api::ChainSource;
use crate::config::RestorerConfig;
use crate::error::{IdentityError, IdentityResult};
use crate::types::{AddressRecord, Chain};
use crate::wallet::{AddressFactory, WalletState, HARDENED};
use crate::{log_debug, log_info, log_warn};

/// Outcome of scanning one chain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainScan {
    /// Highest index seen in use; `None` when the chain has no history
    pub last_used: Option<u32>,
    /// Highest index whose usage was checked
    pub highest_scanned: Option<u32>,
}

impl ChainScan {
    /// Index the restored state hands out next on this chain
    pub fn next_index(&self) -> u32 {
        self.last_used.map_or(0, |i| i + 1)
    }
}

/// Per-chain scan results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub external: ChainScan,
    pub internal: ChainScan,
}

impl ScanReport {
    pub fn chain(&self, chain: Chain) -> &ChainScan {
        match chain {
            Chain::External => &self.external,
            Chain::Internal => &self.internal,
        }
    }

    fn chain_mut(&mut self, chain: Chain) -> &mut ChainScan {
        match chain {
            Chain::External => &mut self.external,
            Chain::Internal => &mut self.internal,
        }
    }
}

/// Explorer-driven restorer
pub struct GapLimitRestorer<'a, S: ChainSource + ?Sized> {
    factory: AddressFactory<'a>,
    source: &'a S,
    config: RestorerConfig,
}

impl<'a, S: ChainSource + ?Sized> GapLimitRestorer<'a, S> {
    pub fn new(factory: AddressFactory<'a>, source: &'a S, config: RestorerConfig) -> IdentityResult<Self> {
        config.validate()?;
        Ok(Self {
            factory,
            source,
            config,
        })
    }

    /// Scan external then internal; any source failure aborts the whole run
    pub fn restore(&self) -> IdentityResult<(WalletState, ScanReport)> {
        let mut state = WalletState::new();
        let mut report = ScanReport::default();

        for chain in Chain::ALL {
            log_info!(
                "restore",
                "Scanning chain",
                chain = chain,
                gap_limit = self.config.gap_limit,
                batch_size = self.config.batch_size
            );
            let scan = self.scan_chain(chain, &mut state)?;
            *report.chain_mut(chain) = scan;

            log_info!(
                "restore",
                "Chain scan complete",
                chain = chain,
                restored = state.next_index(chain),
                highest_scanned = display_index(scan.highest_scanned)
            );
        }

        Ok((state, report))
    }

    fn scan_chain(&self, chain: Chain, state: &mut WalletState) -> IdentityResult<ChainScan> {
        let mut scan = ChainScan::default();
        let mut pending: Vec<AddressRecord> = Vec::new();
        let mut consecutive_unused = 0u32;
        let mut next = 0u32;

        while consecutive_unused < self.config.gap_limit && next < HARDENED {
            let end = next.saturating_add(self.config.batch_size).min(HARDENED);
            let batch = (next..end)
                .map(|index| self.factory.build(chain, index))
                .collect::<IdentityResult<Vec<_>>>()?;
            let addresses: Vec<String> = batch.iter().map(|r| r.confidential_address.clone()).collect();

            log_debug!("restore", "Querying batch", chain = chain, from = next, to = end - 1);
            let usage = self.source.addresses_used(&addresses).map_err(|e| {
                log_warn!("restore", "Chain source failed", chain = chain, index = next, error = e);
                IdentityError::restoration_failed(format!("Scan of {} chain aborted at index {}", chain, next))
                    .with_details(e.to_string())
            })?;

            if usage.len() != batch.len() {
                return Err(IdentityError::restoration_failed(format!(
                    "Chain source answered {} of {} queries",
                    usage.len(),
                    batch.len()
                )));
            }

            for (record, used) in batch.into_iter().zip(usage) {
                let index = record.index();
                scan.highest_scanned = Some(index);
                pending.push(record);

                if used {
                    for record in pending.drain(..) {
                        state.append(record)?;
                    }
                    scan.last_used = Some(index);
                    consecutive_unused = 0;
                } else {
                    consecutive_unused += 1;
                    if consecutive_unused >= self.config.gap_limit {
                        break;
                    }
                }
            }

            next = end;
        }

        Ok(scan)
    }
}

fn display_index(index: Option<u32>) -> String {
    index.map_or_else(|| "none".to_string(), |i| i.to_string())
}
