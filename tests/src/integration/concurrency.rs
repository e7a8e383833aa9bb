//! # Concurrency
//!
//! Registrations, events and verifications racing on a multi-threaded
//! runtime must still produce one linear, gap-free chain.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use ledger_chain::test_utils::{make_submission, make_test_chain};
    use ledger_chain::LedgerChainApi;
    use ledger_registry::test_utils::{make_test_registry, sample_invoice};
    use ledger_registry::RegistryApi;
    use serde_json::json;

    fn assert_linear(blocks: &[ledger_chain::Block]) {
        for pair in blocks.windows(2) {
            assert_eq!(pair[1].index, pair[0].index + 1);
            assert_eq!(pair[1].previous_hash, pair[0].block_hash);
            assert!(pair[1].timestamp >= pair[0].timestamp);
        }
        let unique: HashSet<_> = blocks.iter().map(|b| &b.block_hash).collect();
        assert_eq!(unique.len(), blocks.len());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_registrations_and_events() {
        let (registry, records, _) = make_test_registry();
        let registry = Arc::new(registry);

        let handles: Vec<_> = (1..=20u64)
            .map(|id| {
                records.insert("invoice", id, sample_invoice(id));
                let registry = Arc::clone(&registry);
                tokio::spawn(async move {
                    registry
                        .register("invoice", id, sample_invoice(id))
                        .await?;
                    registry
                        .record_event(id, "payment", json!({"amount": id}))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let blocks = registry.chain().snapshot();
        assert_eq!(blocks.len(), 41);
        assert_linear(&blocks);
        assert!(registry.chain().validate_chain().valid);

        // Each entity's event lands after its own registration.
        for id in 1..=20u64 {
            let trail = registry.audit_trail(id).await.unwrap();
            let indices: Vec<u64> = trail.iter().filter_map(|e| e.block_index).collect();
            assert_eq!(indices.len(), 2);
            assert!(indices[0] < indices[1]);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_verify_races_registration() {
        let (registry, records, _) = make_test_registry();
        for id in 1..=5u64 {
            records.insert("invoice", id, sample_invoice(id));
            registry
                .register("invoice", id, sample_invoice(id))
                .await
                .unwrap();
        }
        let registry = Arc::new(registry);

        let writers: Vec<_> = (6..=15u64)
            .map(|id| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.register("invoice", id, sample_invoice(id)).await })
            })
            .collect();
        let readers: Vec<_> = (0..20u64)
            .map(|n| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.verify(1 + n % 5).await })
            })
            .collect();

        for reader in readers {
            assert!(reader.await.unwrap().unwrap().verified);
        }
        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        assert_eq!(registry.entry(3).await.unwrap().tamper_check_count, 4);
        assert_linear(&registry.chain().snapshot());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_duplicates_commit_once() {
        let (registry, _, _) = make_test_registry();
        let registry = Arc::new(registry);

        // Same content under ten different ids: exactly one may anchor.
        let handles: Vec<_> = (1..=10u64)
            .map(|id| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.register("invoice", id, sample_invoice(0)).await })
            })
            .collect();

        let mut committed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => committed += 1,
                Err(e) => assert!(e.is_recoverable(), "unexpected error: {e}"),
            }
        }

        assert_eq!(committed, 1);
        assert_eq!(registry.chain().stats().total_blocks, 2);
    }

    #[test]
    fn test_threaded_submissions_on_bare_chain() {
        let (chain, _, _) = make_test_chain();
        let chain = Arc::new(chain);

        let threads: Vec<_> = (0..8u64)
            .map(|t| {
                let chain = Arc::clone(&chain);
                std::thread::spawn(move || {
                    for n in 0..5u64 {
                        chain.submit(make_submission("invoice", t * 100 + n)).unwrap();
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }

        let blocks = chain.snapshot();
        assert_eq!(blocks.len(), 41);
        assert_linear(&blocks);
        assert!(chain.validate_chain().valid);
    }
}
