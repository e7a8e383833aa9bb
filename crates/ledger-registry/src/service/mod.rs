//! # Registry Service
//!
//! `RegistryService` anchors collaborator records on the ledger and checks
//! them against their registration later.
//!
//! Writes (`register`, `record_event`) queue on a FIFO async lock, so the
//! chain sees one candidate at a time and callers are served in arrival
//! order. Proof-of-work runs on the blocking pool under `seal_timeout`; a
//! timed-out search is cancelled and leaves the chain untouched.
//!
//! Reads (`verify`, `audit_trail`) never wait for sealing.

mod api;
mod audit;
mod entries;
mod register;
mod verify;


use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ledger_chain::{Block, BlockSigner, ChainSubmission, KeyValueStore, LedgerChain, TimeSource};
use tokio::sync::Mutex;

pub use entries::{entry_key, EntryStore, ENTRY_PREFIX};

use crate::domain::config::RegistryConfig;
use crate::domain::errors::{RegistryError, RegistryResult};
use crate::ports::outbound::RecordStore;

/// Dependencies injected into `RegistryService`.
pub struct RegistryDependencies<KV: KeyValueStore, TS: TimeSource, R> {
    /// Shared ledger.
    pub chain: Arc<LedgerChain<KV, TS>>,
    /// Store for registry entries.
    pub entry_store: KV,
    /// Collaborator record storage.
    pub records: R,
    /// Root key for vendor-scoped signatures.
    pub signer: BlockSigner,
}

/// The integrity registry.
pub struct RegistryService<KV: KeyValueStore, TS: TimeSource, R> {
    chain: Arc<LedgerChain<KV, TS>>,
    entries: EntryStore<KV>,
    records: R,
    signer: BlockSigner,
    config: RegistryConfig,
    write_queue: Mutex<()>,
}

impl<KV, TS, R> RegistryService<KV, TS, R>
where
    KV: KeyValueStore + 'static,
    TS: TimeSource + 'static,
    R: RecordStore,
{
    pub fn new(deps: RegistryDependencies<KV, TS, R>, config: RegistryConfig) -> RegistryResult<Self> {
        config.validate()?;
        Ok(Self {
            chain: deps.chain,
            entries: EntryStore::new(deps.entry_store),
            records: deps.records,
            signer: deps.signer,
            config,
            write_queue: Mutex::new(()),
        })
    }

    /// Prepare, seal off the async runtime, and commit.
    ///
    /// Callers hold `write_queue`.
    async fn seal_and_commit(&self, submission: ChainSubmission) -> RegistryResult<Block> {
        let candidate = self.chain.prepare(submission)?;
        let index = candidate.index;

        let cancel = Arc::new(AtomicBool::new(false));
        let chain = Arc::clone(&self.chain);
        let flag = Arc::clone(&cancel);
        let task =
            tokio::task::spawn_blocking(move || chain.seal_with_cancel(candidate, &flag));

        let block = match tokio::time::timeout(self.config.seal_timeout, task).await {
            Ok(Ok(sealed)) => sealed?,
            Ok(Err(join_error)) => return Err(RegistryError::Worker(join_error.to_string())),
            Err(_) => {
                cancel.store(true, Ordering::Relaxed);
                let timeout_ms = self.config.seal_timeout.as_millis() as u64;
                tracing::warn!(
                    "[registry] ⏱️ Sealing block {} timed out after {} ms",
                    index,
                    timeout_ms
                );
                return Err(RegistryError::SealTimeout { timeout_ms });
            }
        };

        self.chain.commit(block.clone())?;
        Ok(block)
    }

    /// Shared ledger.
    pub fn chain(&self) -> &Arc<LedgerChain<KV, TS>> {
        &self.chain
    }

    /// Collaborator record storage.
    pub fn records(&self) -> &R {
        &self.records
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
}
