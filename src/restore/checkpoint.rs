//! Checkpoint Replay
//!
//! Rebuilds wallet state from the last-used index of each chain without
//! touching the network.

use crate::error::IdentityResult;
use crate::types::{Chain, RestorerCheckpoint};
use crate::wallet::{AddressFactory, AddressPath, WalletState};
use crate::log_debug;

/// Network-free restorer trusting a persisted checkpoint
pub struct StateRestorer<'a> {
    factory: AddressFactory<'a>,
}

impl<'a> StateRestorer<'a> {
    pub fn new(factory: AddressFactory<'a>) -> Self {
        Self { factory }
    }

    /// Replay indices `0..=last_used` on every chain that has one
    pub fn restore(&self, checkpoint: &RestorerCheckpoint) -> IdentityResult<WalletState> {
        let mut state = WalletState::new();

        for chain in Chain::ALL {
            let Some(last_used) = checkpoint.last_used(chain) else {
                continue;
            };
            // Reject out-of-range checkpoints before deriving anything
            AddressPath::new(chain, last_used)?;

            for index in 0..=last_used {
                state.append(self.factory.build(chain, index)?)?;
            }
            log_debug!("restore", "Replayed chain", chain = chain, last_used = last_used);
        }

        Ok(state)
    }
}
