//! # Persistence
//!
//! File-backed chain and registry: reopening restores state, and edits
//! made to the chain file behind the ledger's back are found by
//! validation after the next open.

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use ledger_chain::adapters::{
        BincodeBlockSerializer, DatabaseLock, FileBackedKVStore, ManualTimeSource,
    };
    use ledger_chain::service::block_key;
    use ledger_chain::test_utils::{test_config, test_signer, TEST_EPOCH_MS};
    use ledger_chain::{
        BlockSerializer, KeyValueStore, LedgerChain, LedgerChainApi, LedgerChainDependencies,
        ValidationIssueKind,
    };
    use ledger_registry::adapters::InMemoryRecordStore;
    use ledger_registry::test_utils::sample_invoice;
    use ledger_registry::{
        RegistrationStatus, RegistryApi, RegistryConfig, RegistryDependencies, RegistryService,
    };

    type FileChain = LedgerChain<FileBackedKVStore, ManualTimeSource>;
    type FileRegistry = RegistryService<FileBackedKVStore, ManualTimeSource, InMemoryRecordStore>;

    fn open_chain(dir: &Path) -> FileChain {
        let kv = FileBackedKVStore::open(dir.join("chain.db")).unwrap();
        let deps = LedgerChainDependencies::new(kv, ManualTimeSource::new(TEST_EPOCH_MS))
            .with_signer(test_signer());
        LedgerChain::open(deps, test_config()).unwrap()
    }

    fn open_registry(dir: &Path) -> (FileRegistry, InMemoryRecordStore) {
        let records = InMemoryRecordStore::new();
        let deps = RegistryDependencies {
            chain: Arc::new(open_chain(dir)),
            entry_store: FileBackedKVStore::open(dir.join("registry.db")).unwrap(),
            records: records.clone(),
            signer: test_signer(),
        };
        let registry = RegistryService::new(deps, RegistryConfig::default()).unwrap();
        (registry, records)
    }

    /// Rewrite one stored block in place without going through the chain.
    fn rewrite_block(dir: &Path, index: u64, edit: impl FnOnce(&mut ledger_chain::Block)) {
        let mut kv = FileBackedKVStore::open(dir.join("chain.db")).unwrap();
        let key = block_key(index);
        let bytes = kv.get(&key).unwrap().expect("block is stored");
        let mut block = BincodeBlockSerializer.deserialize(&bytes).unwrap();
        edit(&mut block);
        kv.put(&key, &BincodeBlockSerializer.serialize(&block).unwrap())
            .unwrap();
    }

    // =========================================================================
    // REOPEN
    // =========================================================================

    #[tokio::test]
    async fn test_reopen_restores_chain_and_entries() {
        let dir = tempfile::tempdir().unwrap();
        let head_hash = {
            let (registry, records) = open_registry(dir.path());
            for id in 1..=3 {
                records.insert("invoice", id, sample_invoice(id));
                registry
                    .register("invoice", id, sample_invoice(id))
                    .await
                    .unwrap();
            }
            registry.chain().head().unwrap().block_hash
        };

        let (registry, records) = open_registry(dir.path());
        assert_eq!(registry.chain().stats().total_blocks, 4);
        assert_eq!(registry.chain().head().unwrap().block_hash, head_hash);
        assert!(registry.chain().validate_chain().valid);

        let entry = registry.entry(2).await.unwrap();
        assert_eq!(entry.registration_status, RegistrationStatus::Registered);
        assert_eq!(entry.block_index, Some(2));

        records.insert("invoice", 2, sample_invoice(2));
        assert!(registry.verify(2).await.unwrap().verified);
    }

    #[tokio::test]
    async fn test_duplicate_index_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let (registry, _) = open_registry(dir.path());
            registry
                .register("invoice", 1, sample_invoice(1))
                .await
                .unwrap();
        }

        let (registry, _) = open_registry(dir.path());
        let result = registry.register("invoice", 9, sample_invoice(1)).await;
        assert!(result.unwrap_err().is_recoverable());
        assert_eq!(registry.chain().stats().total_blocks, 2);
    }

    #[tokio::test]
    async fn test_appends_continue_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let (registry, _) = open_registry(dir.path());
            registry
                .register("invoice", 1, sample_invoice(1))
                .await
                .unwrap();
        }

        let (registry, _) = open_registry(dir.path());
        let receipt = registry
            .register("invoice", 2, sample_invoice(2))
            .await
            .unwrap();

        assert_eq!(receipt.block_index, 2);
        let blocks = registry.chain().snapshot();
        assert_eq!(blocks[2].previous_hash, blocks[1].block_hash);
    }

    // =========================================================================
    // OFFLINE TAMPERING
    // =========================================================================

    #[test]
    fn test_edited_chain_file_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        {
            let chain = open_chain(dir.path());
            for n in 0..3 {
                chain
                    .submit(ledger_chain::test_utils::make_submission("invoice", n))
                    .unwrap();
            }
        }

        rewrite_block(dir.path(), 2, |block| {
            block.data_hash = "0".repeat(64);
        });

        let chain = open_chain(dir.path());
        let report = chain.validate_chain();
        assert!(!report.valid);
        assert!(report
            .issues_at(2)
            .any(|i| i.kind == ValidationIssueKind::HashMismatch));
        assert!(report.issues_at(1).next().is_none());
    }

    #[test]
    fn test_resealed_block_is_still_caught_by_link() {
        let dir = tempfile::tempdir().unwrap();
        {
            let chain = open_chain(dir.path());
            for n in 0..3 {
                chain
                    .submit(ledger_chain::test_utils::make_submission("invoice", n))
                    .unwrap();
            }
        }

        // Recompute the edited block's own hash so only the successor's
        // link and the signature give it away.
        rewrite_block(dir.path(), 2, |block| {
            block.timestamp += 1;
            block.block_hash = block.compute_hash();
        });

        let report = open_chain(dir.path()).validate_chain();
        assert!(!report.valid);
        assert!(report
            .issues_at(3)
            .any(|i| i.kind == ValidationIssueKind::BrokenLink));
    }

    // =========================================================================
    // LOCKING
    // =========================================================================

    #[test]
    fn test_data_dir_lock_is_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let lock = DatabaseLock::acquire(dir.path()).unwrap();

        let second =
            DatabaseLock::acquire_with_timeout(dir.path(), std::time::Duration::ZERO);
        assert!(second.is_err());

        drop(lock);
        assert!(DatabaseLock::acquire(dir.path()).is_ok());
    }
}
