//! Restoration Module
//!
//! Two ways to rebuild a mnemonic identity's address state:
//! - `Checkpoint`: replay the persisted last-used indices (no network)
//! - `GapLimit`: rediscover usage from a chain data source
//!
//! Restoration always produces a fresh `WalletState`; the identity it was
//! prepared from is never modified.

mod checkpoint;
mod gap_limit;

pub use checkpoint::StateRestorer;
pub use gap_limit::{ChainScan, GapLimitRestorer, ScanReport};

use crate::api::ChainSource;
use crate::config::RestorerConfig;
use crate::error::IdentityResult;
use crate::identity::MnemonicIdentity;
use crate::types::{Chain, RestorerCheckpoint};
use crate::wallet::WalletState;
use crate::log_info;

/// How to rebuild the address state
pub enum RestoreStrategy<'a> {
    Checkpoint(RestorerCheckpoint),
    GapLimit {
        source: &'a dyn ChainSource,
        config: RestorerConfig,
    },
}

impl<'a> RestoreStrategy<'a> {
    /// Gap-limit scan with default tunables
    pub fn gap_limit(source: &'a dyn ChainSource) -> Self {
        RestoreStrategy::GapLimit {
            source,
            config: RestorerConfig::default(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            RestoreStrategy::Checkpoint(_) => "checkpoint",
            RestoreStrategy::GapLimit { .. } => "gap_limit",
        }
    }
}

/// Result of a successful restoration
#[derive(Debug, Clone)]
pub struct Restoration {
    pub state: WalletState,
    /// Present for gap-limit scans
    pub report: Option<ScanReport>,
}

/// Restoration bound to the identity whose keys it derives with
#[derive(Debug, Clone, Copy)]
pub struct RestorationSession<'a> {
    identity: &'a MnemonicIdentity,
}

impl<'a> RestorationSession<'a> {
    pub fn new(identity: &'a MnemonicIdentity) -> Self {
        Self { identity }
    }

    /// Build the restored state; on error nothing is produced
    pub fn run(self, strategy: RestoreStrategy<'_>) -> IdentityResult<Restoration> {
        let factory = self.identity.factory();
        let strategy_name = strategy.name();

        let restoration = match strategy {
            RestoreStrategy::Checkpoint(checkpoint) => Restoration {
                state: StateRestorer::new(factory).restore(&checkpoint)?,
                report: None,
            },
            RestoreStrategy::GapLimit { source, config } => {
                let (state, report) = GapLimitRestorer::new(factory, source, config)?.restore()?;
                Restoration {
                    state,
                    report: Some(report),
                }
            }
        };

        log_info!(
            "restore",
            "Restoration complete",
            strategy = strategy_name,
            external = restoration.state.next_index(Chain::External),
            internal = restoration.state.next_index(Chain::Internal)
        );
        Ok(restoration)
    }

    /// Run and wrap the state in a fresh identity
    pub fn restore(self, strategy: RestoreStrategy<'_>) -> IdentityResult<MnemonicIdentity> {
        let identity = self.identity;
        let restoration = self.run(strategy)?;
        Ok(identity.with_state(restoration.state))
    }
}
