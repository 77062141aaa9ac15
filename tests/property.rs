use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey};
use liquid_identity::multisig::{aggregate, compare_keys, sort_keys};
use liquid_identity::{
    AddressFactory, Chain, ChainSource, ChainSourceError, KeyDerivationEngine, MnemonicIdentity,
    Network, Restoration, RestoreStrategy, RestorerCheckpoint, RestorerConfig,
};
use proptest::prelude::*;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Addresses with on-chain history
struct UsedSet(HashSet<String>);

impl UsedSet {
    fn new(identity: &MnemonicIdentity, external: &[u32], internal: &[u32]) -> Self {
        let factory = identity.factory();
        let positions = external
            .iter()
            .map(|&i| (Chain::External, i))
            .chain(internal.iter().map(|&i| (Chain::Internal, i)));
        let used = positions
            .map(|(chain, index)| factory.build(chain, index).expect("build").confidential_address)
            .collect();
        Self(used)
    }
}

impl ChainSource for UsedSet {
    fn is_address_used(&self, address: &str) -> Result<bool, ChainSourceError> {
        Ok(self.0.contains(address))
    }

    fn fetch_raw_transaction(&self, txid: &str) -> Result<Vec<u8>, ChainSourceError> {
        Err(ChainSourceError::NotFound(txid.to_string()))
    }
}

fn scan(identity: &MnemonicIdentity, source: &UsedSet, batch_size: u32) -> Restoration {
    let config = RestorerConfig::default().with_gap_limit(5).with_batch_size(batch_size);
    identity
        .prepare_restoration()
        .run(RestoreStrategy::GapLimit { source, config })
        .expect("restore")
}

fn any_secret_key() -> impl Strategy<Value = SecretKey> {
    prop::array::uniform32(any::<u8>()).prop_filter_map("valid secp256k1 scalar", |bytes| {
        SecretKey::from_slice(&bytes).ok()
    })
}

fn any_public_key() -> impl Strategy<Value = PublicKey> {
    any_secret_key().prop_map(|secret| secret.public_key(&Secp256k1::new()))
}

fn any_chain() -> impl Strategy<Value = Chain> {
    prop_oneof![Just(Chain::External), Just(Chain::Internal)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn blinding_keys_are_deterministic(
        seed in prop::array::uniform32(any::<u8>()),
        script in prop::collection::vec(any::<u8>(), 1..80),
    ) {
        let engine = KeyDerivationEngine::from_seed(&seed, Network::Liquid).expect("engine");
        let first = engine.blinding_key_for(&script).expect("first");
        let second = engine.blinding_key_for(&script).expect("second");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn address_build_is_pure(
        seed in prop::array::uniform32(any::<u8>()),
        chain in any_chain(),
        index in 0u32..0x8000_0000,
    ) {
        let one = KeyDerivationEngine::from_seed(&seed, Network::LiquidTestnet).expect("engine");
        let other = KeyDerivationEngine::from_seed(&seed, Network::LiquidTestnet).expect("engine");

        let a = AddressFactory::new(&one).build(chain, index).expect("build");
        let b = AddressFactory::new(&other).build(chain, index).expect("build");
        prop_assert_eq!(a.derivation_path.index, index);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn canonical_order_ignores_input_permutation(
        (keys, shuffled) in prop::collection::vec(any_public_key(), 1..8)
            .prop_flat_map(|keys| (Just(keys.clone()), Just(keys).prop_shuffle()))
    ) {
        let sorted = sort_keys(&keys);
        prop_assert_eq!(&sorted, &sort_keys(&shuffled));
        for pair in sorted.windows(2) {
            prop_assert_ne!(compare_keys(&pair[0], &pair[1]), Ordering::Greater);
        }
    }

    #[test]
    fn canonical_order_is_antisymmetric(a in any_public_key(), b in any_public_key()) {
        prop_assert_eq!(compare_keys(&a, &b), compare_keys(&b, &a).reverse());
        if a != b {
            prop_assert_ne!(compare_keys(&a, &b), Ordering::Equal);
        }
    }

    #[test]
    fn aggregator_is_commutative(
        (codes, shuffled) in prop::collection::vec(prop::array::uniform32(any::<u8>()), 1..8)
            .prop_flat_map(|codes| (Just(codes.clone()), Just(codes).prop_shuffle()))
    ) {
        let forward = aggregate(&codes).expect("aggregate");
        let permuted = aggregate(&shuffled).expect("aggregate");
        prop_assert_eq!(forward, permuted);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn checkpoint_replay_resumes_after_last_used(
        seed in prop::array::uniform32(any::<u8>()),
        last_used in 0u32..24,
    ) {
        let identity = MnemonicIdentity::from_seed(&seed, Network::Regtest).expect("identity");
        let mut restored = identity
            .prepare_restoration()
            .restore(RestoreStrategy::Checkpoint(RestorerCheckpoint::new(Some(last_used), None)))
            .expect("restore");

        let next = restored.next_address(Chain::External).expect("next");
        prop_assert_eq!(next.derivation_path.index, last_used + 1);
        prop_assert_eq!(restored.next_index(Chain::Internal), 0);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn gap_limit_result_ignores_batch_size(
        external in prop::collection::vec(0u32..30, 0..6),
        internal in prop::collection::vec(0u32..30, 0..6),
        batch_size in 2u32..10,
    ) {
        let identity = MnemonicIdentity::from_seed(&[7u8; 32], Network::Regtest).expect("identity");
        let source = UsedSet::new(&identity, &external, &internal);

        let single = scan(&identity, &source, 1);
        let batched = scan(&identity, &source, batch_size);

        prop_assert_eq!(single.report, batched.report);
        prop_assert_eq!(
            identity.with_state(single.state).all_addresses(),
            identity.with_state(batched.state).all_addresses()
        );
    }
}
