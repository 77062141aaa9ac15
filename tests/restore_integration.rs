//! Restoration Integration Tests
//!
//! End-to-end restoration of mnemonic identities against an in-memory chain
//! data source.

use liquid_identity::{
    AddressFactory, Chain, ChainSource, ChainSourceError, ErrorCode, MnemonicIdentity, Network,
    RestoreStrategy, RestorerCheckpoint, RestorerConfig,
};
use std::collections::HashSet;
use std::sync::Mutex;

const PHRASE: &str = "turn manual grain tobacco pluck onion off chief drive amount slice forward";

/// Usage history held in memory
#[derive(Default)]
struct MemoryChain {
    used: Mutex<HashSet<String>>,
    fail_after: Option<usize>,
    queries: Mutex<usize>,
}

impl MemoryChain {
    fn with_usage(identity: &MnemonicIdentity, positions: &[(Chain, u32)]) -> Self {
        let chain = Self::default();
        for &(c, index) in positions {
            chain.mark_used(identity, c, index);
        }
        chain
    }

    fn failing_after(mut self, queries: usize) -> Self {
        self.fail_after = Some(queries);
        self
    }

    fn mark_used(&self, identity: &MnemonicIdentity, chain: Chain, index: u32) {
        let record = identity.factory().build(chain, index).expect("build");
        self.used.lock().expect("lock").insert(record.confidential_address);
    }
}

impl ChainSource for MemoryChain {
    fn is_address_used(&self, address: &str) -> Result<bool, ChainSourceError> {
        let mut queries = self.queries.lock().expect("lock");
        *queries += 1;
        if self.fail_after.is_some_and(|limit| *queries > limit) {
            return Err(ChainSourceError::Unavailable("explorer timed out".to_string()));
        }
        Ok(self.used.lock().expect("lock").contains(address))
    }

    fn fetch_raw_transaction(&self, txid: &str) -> Result<Vec<u8>, ChainSourceError> {
        Err(ChainSourceError::NotFound(txid.to_string()))
    }
}

fn identity() -> MnemonicIdentity {
    MnemonicIdentity::from_mnemonic(PHRASE, None, None, Network::Liquid).expect("identity")
}

fn restore_checkpoint(checkpoint: RestorerCheckpoint) -> MnemonicIdentity {
    identity()
        .prepare_restoration()
        .restore(RestoreStrategy::Checkpoint(checkpoint))
        .expect("restore")
}

#[test]
fn scenario_a_fixed_keys_at_index_42() {
    let identity = identity();
    let record = AddressFactory::new(identity.engine())
        .build(Chain::External, 42)
        .expect("build");

    assert_eq!(record.derivation_path.to_string(), "m/84'/0'/0'/0/42");
    assert_eq!(
        record.public_key,
        "0212c8b6bea7e0061f41d16ec5b4c18f51335e133f3f4037af66d058c6e3bc9ecb"
    );
    assert_eq!(
        record.blinding_private_key,
        "3ca8245e4b3e938cfe78ae124767b3e277ac7eb786cc9b305750efb7a2da150c"
    );
}

#[test]
fn scenario_b_both_chains_checkpointed() {
    let mut restored = restore_checkpoint(RestorerCheckpoint::new(Some(15), Some(4)));

    let external = restored.next_address(Chain::External).expect("external");
    let internal = restored.next_address(Chain::Internal).expect("internal");
    assert_eq!(external.derivation_path.to_string(), "m/84'/0'/0'/0/16");
    assert_eq!(internal.derivation_path.to_string(), "m/84'/0'/0'/1/5");
}

#[test]
fn scenario_c_only_internal_checkpointed() {
    let mut restored = restore_checkpoint(RestorerCheckpoint::new(None, Some(10)));

    let external = restored.next_address(Chain::External).expect("external");
    let internal = restored.next_address(Chain::Internal).expect("internal");
    assert_eq!(external.derivation_path.to_string(), "m/84'/0'/0'/0/0");
    assert_eq!(internal.derivation_path.to_string(), "m/84'/0'/0'/1/11");
}

#[test]
fn scenario_d_empty_checkpoint() {
    let checkpoint: RestorerCheckpoint = serde_json::from_str("{}").expect("checkpoint");
    let restored = restore_checkpoint(checkpoint);

    assert!(restored.all_addresses().is_empty());
    assert!(restored.addresses(Chain::External).is_empty());
    assert!(restored.addresses(Chain::Internal).is_empty());
}

#[test]
fn checkpoint_roundtrips_through_json() {
    let mut identity = identity();
    for _ in 0..3 {
        identity.next_address(Chain::External).expect("next");
    }

    let json = serde_json::to_string(&identity.checkpoint()).expect("serialize");
    assert_eq!(json, r#"{"lastUsedExternalIndex":2}"#);

    let checkpoint: RestorerCheckpoint = serde_json::from_str(&json).expect("deserialize");
    let restored = restore_checkpoint(checkpoint);
    assert_eq!(restored.all_addresses(), identity.all_addresses());
}

#[test]
fn gap_limit_restores_used_addresses() {
    let identity = identity();
    let chain = MemoryChain::with_usage(
        &identity,
        &[(Chain::External, 0), (Chain::External, 1), (Chain::External, 7), (Chain::Internal, 2)],
    );
    // five unused addresses (2..=6) sit below the gap of six
    let config = RestorerConfig::default().with_gap_limit(6).with_batch_size(3);

    let restoration = identity
        .prepare_restoration()
        .run(RestoreStrategy::GapLimit { source: &chain, config })
        .expect("restore");

    assert_eq!(restoration.state.next_index(Chain::External), 8);
    assert_eq!(restoration.state.next_index(Chain::Internal), 3);

    let report = restoration.report.expect("report");
    assert_eq!(report.external.last_used, Some(7));
    assert_eq!(report.external.highest_scanned, Some(13));
    assert_eq!(report.internal.last_used, Some(2));

    let mut restored = identity.with_state(restoration.state);
    let next = restored.next_address(Chain::External).expect("next");
    assert_eq!(next.derivation_path.to_string(), "m/84'/0'/0'/0/8");
}

#[test]
fn gap_limit_stops_before_use_past_the_gap() {
    let identity = identity();
    let chain = MemoryChain::with_usage(
        &identity,
        &[(Chain::External, 0), (Chain::External, 1), (Chain::External, 7)],
    );
    let config = RestorerConfig::default().with_gap_limit(5).with_batch_size(3);

    let restoration = identity
        .prepare_restoration()
        .run(RestoreStrategy::GapLimit { source: &chain, config })
        .expect("restore");

    assert_eq!(restoration.state.next_index(Chain::External), 2);
    let report = restoration.report.expect("report");
    assert_eq!(report.external.last_used, Some(1));
    assert_eq!(report.external.highest_scanned, Some(6));

    let restored = identity.with_state(restoration.state);
    assert!(restored.addresses(Chain::External).iter().all(|r| r.index() < 7));
}

#[test]
fn gap_limit_empty_history() {
    let identity = identity();
    let chain = MemoryChain::default();

    let restored = identity
        .prepare_restoration()
        .restore(RestoreStrategy::gap_limit(&chain))
        .expect("restore");

    assert_eq!(restored.next_index(Chain::External), 0);
    assert_eq!(restored.next_index(Chain::Internal), 0);
    assert!(restored.all_addresses().is_empty());
}

#[test]
fn gap_limit_rescan_is_idempotent() {
    let identity = identity();
    let chain = MemoryChain::with_usage(&identity, &[(Chain::External, 4), (Chain::Internal, 0)]);

    let first = identity
        .prepare_restoration()
        .restore(RestoreStrategy::gap_limit(&chain))
        .expect("first");
    let second = identity
        .prepare_restoration()
        .restore(RestoreStrategy::gap_limit(&chain))
        .expect("second");

    for c in Chain::ALL {
        assert_eq!(first.addresses(c).len(), second.addresses(c).len());
    }
    assert_eq!(first.all_addresses(), second.all_addresses());
}

#[test]
fn gap_limit_agrees_with_checkpoint_replay() {
    let identity = identity();
    let chain = MemoryChain::with_usage(&identity, &[(Chain::External, 15), (Chain::Internal, 4)]);

    let scanned = identity
        .prepare_restoration()
        .restore(RestoreStrategy::gap_limit(&chain))
        .expect("scan");
    let replayed = restore_checkpoint(scanned.checkpoint());

    assert_eq!(scanned.checkpoint(), RestorerCheckpoint::new(Some(15), Some(4)));
    assert_eq!(
        scanned.addresses(Chain::External),
        replayed.addresses(Chain::External)
    );
}

#[test]
fn failed_scan_leaves_identity_untouched() {
    let mut identity = identity();
    identity.next_address(Chain::External).expect("next");
    let before = identity.all_addresses();

    let chain = MemoryChain::with_usage(&identity, &[(Chain::External, 0)]).failing_after(10);
    let err = identity
        .prepare_restoration()
        .run(RestoreStrategy::gap_limit(&chain))
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::RestorationFailed);
    assert!(err.details.expect("details").contains("explorer timed out"));
    assert_eq!(identity.all_addresses(), before);
}

#[test]
fn invalid_config_is_rejected() {
    let identity = identity();
    let chain = MemoryChain::default();
    let config = RestorerConfig::default().with_batch_size(0);

    let err = identity
        .prepare_restoration()
        .run(RestoreStrategy::GapLimit { source: &chain, config })
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidConfig);
}

#[test]
fn invalid_mnemonic_fails_construction() {
    let bad_checksum = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon";
    let err = MnemonicIdentity::from_mnemonic(bad_checksum, None, None, Network::Liquid).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidMnemonic);

    let unknown_word = "turn manual grain tobacco pluck onion off chief drive amount slice forwards";
    let err = MnemonicIdentity::from_mnemonic(unknown_word, None, None, Network::Liquid).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidMnemonic);

    let err = MnemonicIdentity::from_mnemonic(PHRASE, Some("esperanto"), None, Network::Liquid).unwrap_err();
    assert_eq!(err.code, ErrorCode::UnsupportedLanguage);
}
