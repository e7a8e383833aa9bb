//! # Chain Properties
//!
//! Link invariant, hash determinism, Merkle behaviour and single-field
//! tamper pinpointing, checked over chains built through the public API.

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use ledger_chain::test_utils::{make_submission, make_test_chain, test_signer};
    use ledger_chain::{
        hash_payload, merkle_root, sha256_hex, Block, ChainValidator, LedgerChainApi,
        ValidationIssueKind,
    };
    use ledger_registry::test_utils::{make_test_registry, sample_invoice};
    use ledger_registry::RegistryApi;
    use proptest::prelude::*;
    use serde_json::{json, Map, Value};

    // =========================================================================
    // PURE REGISTRATIONS
    // =========================================================================

    #[tokio::test]
    async fn test_registrations_leave_chain_valid() {
        let (registry, _, clock) = make_test_registry();
        for id in 1..=10 {
            registry
                .register("invoice", id, sample_invoice(id))
                .await
                .unwrap();
            clock.advance(25);
        }

        let report = registry.chain().validate_chain();
        assert!(report.valid, "{:?}", report.errors);
        assert_eq!(report.total_blocks, 11);
        assert_eq!(report.signed_blocks, 11);
        assert_eq!(registry.chain().stats().by_type["invoice"], 10);
    }

    // =========================================================================
    // SINGLE-FIELD MUTATION
    // =========================================================================

    #[test]
    fn test_each_field_mutation_is_pinpointed() {
        let (chain, _, _) = make_test_chain();
        for n in 0..5 {
            chain.submit(make_submission("invoice", n)).unwrap();
        }
        let pristine = chain.snapshot().to_vec();
        let validator = ChainValidator::new().with_difficulty(1);
        let signer = test_signer();

        type Mutation = Box<dyn Fn(&mut Block)>;
        let mutations: Vec<(&str, Mutation)> = vec![
            ("timestamp", Box::new(|b: &mut Block| b.timestamp += 1)),
            ("data_hash", Box::new(|b: &mut Block| b.data_hash = "f".repeat(64))),
            ("nonce", Box::new(|b: &mut Block| b.nonce += 1)),
            ("data_type", Box::new(|b: &mut Block| b.data_type = "receipt".into())),
            ("payload", Box::new(|b: &mut Block| b.payload.push(' '))),
            ("previous_hash", Box::new(|b: &mut Block| b.previous_hash = "e".repeat(64))),
            ("merkle_root", Box::new(|b: &mut Block| b.merkle_root = "d".repeat(64))),
            ("block_hash", Box::new(|b: &mut Block| b.block_hash = "c".repeat(64))),
            ("is_encrypted", Box::new(|b: &mut Block| b.is_encrypted = !b.is_encrypted)),
            ("digital_signature", Box::new(|b: &mut Block| b.digital_signature = None)),
        ];

        for (field, mutate) in mutations {
            let mut blocks = pristine.clone();
            mutate(&mut blocks[3]);
            let report = validator.validate(&blocks, Some(&signer));

            assert!(!report.valid, "mutating {field} went unnoticed");
            assert!(
                report.issues_at(3).next().is_some(),
                "mutating {field} not reported at block 3"
            );
            assert!(report.issues_at(2).next().is_none());
        }
    }

    #[test]
    fn test_stripped_signature_invalidates_signed_chain() {
        let (chain, _, _) = make_test_chain();
        for n in 0..3 {
            chain.submit(make_submission("invoice", n)).unwrap();
        }
        assert!(chain.signs_blocks());

        let mut blocks = chain.snapshot().to_vec();
        blocks[2].digital_signature = None;
        let report = ChainValidator::new()
            .with_difficulty(1)
            .validate(&blocks, Some(&test_signer()));

        assert!(!report.valid);
        assert!(report
            .issues_at(2)
            .any(|i| i.kind == ValidationIssueKind::InvalidSignature));
    }

    #[test]
    fn test_mutation_breaks_successor_link() {
        let (chain, _, _) = make_test_chain();
        for n in 0..4 {
            chain.submit(make_submission("invoice", n)).unwrap();
        }
        let mut blocks = chain.snapshot().to_vec();
        blocks[2].timestamp += 1;

        let report = ChainValidator::new().validate(&blocks, None);
        assert!(report
            .issues_at(2)
            .any(|i| i.kind == ValidationIssueKind::HashMismatch));
        assert!(report
            .issues_at(3)
            .any(|i| i.kind == ValidationIssueKind::BrokenLink));
    }

    // =========================================================================
    // MERKLE
    // =========================================================================

    #[test]
    fn test_merkle_single_leaf_and_order() {
        let a = sha256_hex(b"line-1");
        let b = sha256_hex(b"line-2");

        assert_eq!(merkle_root(&[a.clone()]).unwrap(), a);
        assert_ne!(
            merkle_root(&[a.clone(), b.clone()]).unwrap(),
            merkle_root(&[b, a]).unwrap()
        );
    }

    // =========================================================================
    // PROPERTIES
    // =========================================================================

    fn json_object() -> impl Strategy<Value = BTreeMap<String, i64>> {
        prop::collection::btree_map("[a-z]{1,8}", any::<i64>(), 1..8)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_canonical_hash_ignores_key_order(fields in json_object()) {
            let forward: Map<String, Value> =
                fields.iter().map(|(k, v)| (k.clone(), json!(v))).collect();
            let reversed: Map<String, Value> =
                fields.iter().rev().map(|(k, v)| (k.clone(), json!(v))).collect();

            prop_assert_eq!(
                hash_payload(&Value::Object(forward)).unwrap(),
                hash_payload(&Value::Object(reversed)).unwrap()
            );
        }

        #[test]
        fn prop_rehash_is_deterministic(count in 1u64..6) {
            let (chain, _, clock) = make_test_chain();
            for n in 0..count {
                chain.submit(make_submission("invoice", n)).unwrap();
                clock.advance(n);
            }

            let blocks = chain.snapshot();
            for (i, block) in blocks.iter().enumerate() {
                prop_assert_eq!(block.compute_hash(), block.block_hash.clone());
                prop_assert_eq!(block.compute_hash(), block.compute_hash());
                if i > 0 {
                    prop_assert_eq!(&block.previous_hash, &blocks[i - 1].block_hash);
                    prop_assert_eq!(block.index, blocks[i - 1].index + 1);
                }
            }
        }

        #[test]
        fn prop_leaf_swap_changes_root(
            seeds in prop::collection::vec(any::<u64>(), 2..10),
            i in 0usize..10,
            j in 0usize..10,
        ) {
            let leaves: Vec<String> =
                seeds.iter().map(|s| sha256_hex(&s.to_le_bytes())).collect();
            let (i, j) = (i % leaves.len(), j % leaves.len());
            prop_assume!(leaves[i] != leaves[j]);

            let mut swapped = leaves.clone();
            swapped.swap(i, j);
            prop_assert_ne!(merkle_root(&leaves).unwrap(), merkle_root(&swapped).unwrap());
        }
    }
}
