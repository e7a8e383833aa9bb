//! # Ledger Chain Service
//!
//! `LedgerChain` turns collaborator submissions into sealed, signed blocks.
//!
//! The write path is split so callers can move the CPU-bound part elsewhere:
//!
//! 1. `prepare` - validate, duplicate check, encrypt, Merkle root, link to head
//! 2. `seal` - proof-of-work search and signature (blocking)
//! 3. `commit` - append through the single-writer `ChainStore`
//!
//! `submit` runs all three under an internal lock for callers that are
//! already off the request path.

mod api;
mod store;


use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;

pub use api::MAX_PAGE_LIMIT;
pub use store::{block_key, ChainStore, BLOCK_PREFIX, HEAD_KEY};

use crate::adapters::PlaintextProvider;
use crate::domain::block::{
    payload_leaf, Block, BlockCandidate, ChainSubmission, Timestamp, GENESIS_DATA_TYPE,
    GENESIS_PREVIOUS_HASH,
};
use crate::domain::config::ChainConfig;
use crate::domain::errors::{ChainError, ChainResult};
use crate::domain::hashing::{canonical_json, hash_payload};
use crate::domain::merkle::merkle_root;
use crate::domain::miner::ProofOfWork;
use crate::domain::signature::BlockSigner;
use crate::ports::outbound::{EncryptionProvider, KeyValueStore, TimeSource};

/// Dependencies injected into `LedgerChain`.
pub struct LedgerChainDependencies<KV, TS> {
    /// Backing store for blocks.
    pub kv_store: KV,
    /// Clock for block timestamps.
    pub time_source: TS,
    /// Process-wide block signer; `None` leaves blocks unsigned.
    pub signer: Option<BlockSigner>,
    /// Transform for payloads submitted with `encrypt = true`.
    pub encryption: Arc<dyn EncryptionProvider>,
}

impl<KV, TS> LedgerChainDependencies<KV, TS> {
    /// Unsigned, unencrypted chain over `kv_store`.
    pub fn new(kv_store: KV, time_source: TS) -> Self {
        Self {
            kv_store,
            time_source,
            signer: None,
            encryption: Arc::new(PlaintextProvider),
        }
    }

    /// Sign blocks with `signer`.
    pub fn with_signer(mut self, signer: BlockSigner) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Encrypt flagged payloads with `encryption`.
    pub fn with_encryption(mut self, encryption: Arc<dyn EncryptionProvider>) -> Self {
        self.encryption = encryption;
        self
    }
}

/// The chain facade: sealing, signing and committing blocks.
pub struct LedgerChain<KV: KeyValueStore, TS: TimeSource> {
    store: ChainStore<KV>,
    time_source: TS,
    signer: Option<BlockSigner>,
    encryption: Arc<dyn EncryptionProvider>,
    pow: ProofOfWork,
    config: ChainConfig,
    submit_lock: Mutex<()>,
}

impl<KV: KeyValueStore, TS: TimeSource> LedgerChain<KV, TS> {
    /// Open the chain over persisted state, mining a genesis block when the
    /// store is empty.
    pub fn open(deps: LedgerChainDependencies<KV, TS>, config: ChainConfig) -> ChainResult<Self> {
        config.validate()?;

        let chain = Self {
            store: ChainStore::open(deps.kv_store)?,
            time_source: deps.time_source,
            signer: deps.signer,
            encryption: deps.encryption,
            pow: config.proof_of_work()?,
            config,
            submit_lock: Mutex::new(()),
        };
        chain.ensure_genesis()?;

        tracing::info!(
            "[ledger] Chain open: {} blocks, difficulty {}, signing {}, encryption {}",
            chain.store.len(),
            chain.config.difficulty,
            if chain.signs_blocks() { "on" } else { "off" },
            chain.encryption.name()
        );
        Ok(chain)
    }

    /// Return the genesis block, creating it on an empty chain.
    pub fn ensure_genesis(&self) -> ChainResult<Block> {
        let _guard = self.submit_lock.lock();
        if let Ok(genesis) = self.store.get(0) {
            return Ok(genesis);
        }

        let record = json!({ "ledger": "genesis" });
        let payload = canonical_json(&record)?;
        let is_signed = self.signs_blocks();
        let leaves = vec![payload_leaf(&payload, false, is_signed)];

        let candidate = BlockCandidate {
            index: 0,
            timestamp: self.time_source.now(),
            data_type: GENESIS_DATA_TYPE.to_string(),
            data_hash: hash_payload(&record)?,
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
            merkle_root: merkle_root(&leaves)?,
            merkle_leaves: leaves,
            payload,
            is_encrypted: false,
            is_signed,
        };

        let block = self.seal(candidate)?;
        self.store.append(block.clone())?;
        tracing::info!("[ledger] 🌱 Created genesis block {}", block.block_hash);
        Ok(block)
    }

    /// Build the next candidate block for `submission`.
    ///
    /// ## Errors
    ///
    /// - `Validation`: malformed submission
    /// - `Duplicate`: payload already on the chain for this data type
    /// - `Crypto`: encryption requested without an active provider
    pub fn prepare(&self, submission: ChainSubmission) -> ChainResult<BlockCandidate> {
        submission.validate()?;

        if let Some(existing_index) = self
            .store
            .find_duplicate(&submission.data_type, &submission.data_hash)
        {
            return Err(ChainError::Duplicate {
                data_type: submission.data_type,
                data_hash: submission.data_hash,
                existing_index,
            });
        }

        let head = self
            .store
            .head()
            .ok_or_else(|| ChainError::integrity("chain has no genesis block"))?;

        let payload = if submission.encrypt {
            if !self.encryption.is_active() {
                return Err(ChainError::Crypto(
                    "payload encryption requested but no provider is configured".to_string(),
                ));
            }
            hex::encode(self.encryption.encrypt(submission.payload.as_bytes())?)
        } else {
            submission.payload
        };

        let is_signed = self.signs_blocks();
        let mut leaves = submission.sub_items;
        leaves.push(payload_leaf(&payload, submission.encrypt, is_signed));

        Ok(BlockCandidate {
            index: head.index + 1,
            timestamp: self.time_source.now().max(head.timestamp),
            data_type: submission.data_type,
            data_hash: submission.data_hash,
            previous_hash: head.block_hash,
            merkle_root: merkle_root(&leaves)?,
            merkle_leaves: leaves,
            payload,
            is_encrypted: submission.encrypt,
            is_signed,
        })
    }

    /// Mine and sign `candidate`. CPU-bound.
    pub fn seal(&self, candidate: BlockCandidate) -> ChainResult<Block> {
        self.seal_with_cancel(candidate, &AtomicBool::new(false))
    }

    /// Mine and sign `candidate`, giving up once `cancel` is set.
    pub fn seal_with_cancel(
        &self,
        candidate: BlockCandidate,
        cancel: &AtomicBool,
    ) -> ChainResult<Block> {
        let signer = match (candidate.is_signed, self.signer.as_ref()) {
            (true, Some(signer)) => Some(signer),
            (true, None) => {
                return Err(ChainError::Crypto(
                    "candidate requires a signature but no signer is configured".to_string(),
                ))
            }
            (false, _) => None,
        };

        let seal = self.pow.seal_with_cancel(&candidate, cancel)?;
        let signature = signer.map(|signer| signer.sign(&seal.block_hash));
        Ok(candidate.into_block(seal.nonce, seal.block_hash, signature))
    }

    /// Append a sealed block.
    ///
    /// Fails with `ChainIntegrity` if the head moved since `prepare`.
    pub fn commit(&self, block: Block) -> ChainResult<u64> {
        self.store.append(block)
    }

    /// Prepare, seal and commit in one blocking call.
    pub fn submit(&self, submission: ChainSubmission) -> ChainResult<Block> {
        let _guard = self.submit_lock.lock();
        let candidate = self.prepare(submission)?;
        let block = self.seal(candidate)?;
        self.commit(block.clone())?;
        Ok(block)
    }

    /// Plaintext payload of `block`, decrypting when needed.
    pub fn decrypt_payload(&self, block: &Block) -> ChainResult<String> {
        if !block.is_encrypted {
            return Ok(block.payload.clone());
        }
        let ciphertext = hex::decode(&block.payload)
            .map_err(|e| ChainError::Crypto(format!("ciphertext is not hex: {e}")))?;
        let plaintext = self.encryption.decrypt(&ciphertext)?;
        String::from_utf8(plaintext)
            .map_err(|e| ChainError::Serialization(format!("payload is not UTF-8: {e}")))
    }

    /// Index of the block that already carries this payload.
    pub fn find_duplicate(&self, data_type: &str, data_hash: &str) -> Option<u64> {
        self.store.find_duplicate(data_type, data_hash)
    }

    /// Consistent view of every committed block.
    pub fn snapshot(&self) -> Arc<Vec<Block>> {
        self.store.snapshot()
    }

    /// Underlying block store.
    pub fn store(&self) -> &ChainStore<KV> {
        &self.store
    }

    /// Current time on the chain clock.
    pub fn now(&self) -> Timestamp {
        self.time_source.now()
    }

    /// Active configuration.
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Block signer, if configured.
    pub fn signer(&self) -> Option<&BlockSigner> {
        self.signer.as_ref()
    }

    /// Whether new blocks are signed.
    pub fn signs_blocks(&self) -> bool {
        self.signer.is_some() && self.config.sign_blocks
    }
}
