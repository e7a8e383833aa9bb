//! Wiring: data directory lock, file-backed stores, chain and registry.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use ledger_chain::adapters::{
    DatabaseLock, FileBackedKVStore, SystemTimeSource, XChaCha20Provider,
};
use ledger_chain::{BlockSigner, LedgerChain, LedgerChainDependencies};
use ledger_registry::adapters::InMemoryRecordStore;
use ledger_registry::{RegistryDependencies, RegistryService};
use serde_json::Value;

use crate::config::NodeConfig;

pub type NodeChain = LedgerChain<FileBackedKVStore, SystemTimeSource>;
pub type NodeRegistry = RegistryService<FileBackedKVStore, SystemTimeSource, InMemoryRecordStore>;

/// An opened ledger. Holds the directory lock until dropped.
pub struct LedgerNode {
    chain: Arc<NodeChain>,
    registry: NodeRegistry,
    records: InMemoryRecordStore,
    _lock: DatabaseLock,
}

impl LedgerNode {
    /// Lock `config.data_dir` and open (or create) the ledger inside it.
    pub fn open(config: &NodeConfig) -> Result<Self> {
        let lock = DatabaseLock::acquire(&config.data_dir)
            .with_context(|| format!("locking {}", config.data_dir.display()))?;

        let signer = BlockSigner::new(config.signing_key()?);

        let chain_store = FileBackedKVStore::open(config.chain_path())
            .with_context(|| format!("opening {}", config.chain_path().display()))?;
        let mut deps = LedgerChainDependencies::new(chain_store, SystemTimeSource)
            .with_signer(signer.clone());
        if let Some(key) = config.payload_key()? {
            deps = deps.with_encryption(Arc::new(XChaCha20Provider::new(key)));
        }
        let chain = Arc::new(
            LedgerChain::open(deps, config.chain_config()).context("opening ledger chain")?,
        );

        let entry_store = FileBackedKVStore::open(config.entries_path())
            .with_context(|| format!("opening {}", config.entries_path().display()))?;
        // Records are supplied per command from files.
        let records = InMemoryRecordStore::new();
        let registry = RegistryService::new(
            RegistryDependencies {
                chain: Arc::clone(&chain),
                entry_store,
                records: records.clone(),
                signer,
            },
            config.registry_config(),
        )
        .context("configuring registry")?;

        tracing::info!(
            "[node] Ledger open at {} (pid {})",
            config.data_dir.display(),
            lock.pid()
        );

        Ok(Self {
            chain,
            registry,
            records,
            _lock: lock,
        })
    }

    pub fn chain(&self) -> &NodeChain {
        &self.chain
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Make `record` the current version of an entity for this run.
    pub fn stage_record(&self, entity_type: &str, entity_id: u64, record: Value) {
        self.records.insert(entity_type, entity_id, record);
    }
}

/// Read a JSON record from disk.
pub fn read_record(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_chain::LedgerChainApi;
    use ledger_registry::RegistryApi;
    use serde_json::json;

    fn test_config(dir: &Path) -> NodeConfig {
        NodeConfig {
            data_dir: dir.to_path_buf(),
            signing_key: Some("42".repeat(32)),
            difficulty: 1,
            ..NodeConfig::default()
        }
    }

    #[tokio::test]
    async fn test_open_register_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let record = json!({"vendor_id": "V-1", "total": 10});

        {
            let node = LedgerNode::open(&config).unwrap();
            node.stage_record("invoice", 1, record.clone());
            node.registry().register("invoice", 1, record.clone()).await.unwrap();
        }

        let node = LedgerNode::open(&config).unwrap();
        assert_eq!(node.chain().stats().total_blocks, 2);
        assert!(node.chain().validate_chain().valid);

        node.stage_record("invoice", 1, record);
        assert!(node.registry().verify(1).await.unwrap().verified);
    }

    #[test]
    fn test_second_open_is_locked_out() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let _node = LedgerNode::open(&config).unwrap();

        // Same process holds it; the stale-pid takeover must not apply.
        let second = DatabaseLock::acquire_with_timeout(dir.path(), std::time::Duration::ZERO);
        assert!(second.is_err());
    }

    #[test]
    fn test_missing_key_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = NodeConfig {
            signing_key: None,
            ..test_config(dir.path())
        };
        assert!(LedgerNode::open(&config).is_err());
    }

    #[test]
    fn test_read_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inv.json");
        std::fs::write(&path, r#"{"total": 5}"#).unwrap();

        assert_eq!(read_record(&path).unwrap(), json!({"total": 5}));
        assert!(read_record(&dir.path().join("missing.json")).is_err());
    }
}
