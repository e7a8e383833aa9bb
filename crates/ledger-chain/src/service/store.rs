//! # Chain Store
//!
//! Ordered, append-only, persisted sequence of blocks.
//!
//! ## Concurrency
//!
//! - Appends take the writer `Mutex`, which owns the key-value store. Two
//!   appends can never both validate against the same head.
//! - Committed blocks live in an `Arc<Vec<Block>>` that is swapped under a
//!   short `RwLock` write only after the batch write succeeded. Readers
//!   clone the `Arc` and never observe a half-written block.
//!
//! ## Key Layout
//!
//! | Key | Value |
//! |-----|-------|
//! | `b:<index u64 BE>` | serialized block |
//! | `m:head` | head index, u64 BE |

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::adapters::{BincodeBlockSerializer, HashDuplicateIndex};
use crate::domain::block::{Block, GENESIS_DATA_TYPE, GENESIS_PREVIOUS_HASH};
use crate::domain::errors::{ChainError, ChainResult, KVStoreError};
use crate::domain::merkle::merkle_root;
use crate::ports::outbound::{BatchOperation, BlockSerializer, DuplicateIndex, KeyValueStore};

/// Prefix of block keys.
pub const BLOCK_PREFIX: &[u8] = b"b:";

/// Key of the head pointer.
pub const HEAD_KEY: &[u8] = b"m:head";

/// Storage key of the block at `index`.
pub fn block_key(index: u64) -> Vec<u8> {
    let mut key = BLOCK_PREFIX.to_vec();
    key.extend_from_slice(&index.to_be_bytes());
    key
}

struct Committed {
    blocks: Arc<Vec<Block>>,
    duplicates: Box<dyn DuplicateIndex>,
}

/// Append-only block store over a `KeyValueStore`.
pub struct ChainStore<KV: KeyValueStore, BS: BlockSerializer = BincodeBlockSerializer> {
    writer: Mutex<KV>,
    serializer: BS,
    committed: RwLock<Committed>,
}

impl<KV: KeyValueStore> ChainStore<KV> {
    /// Open the store with bincode encoding and the hash-map duplicate index.
    pub fn open(kv_store: KV) -> ChainResult<Self> {
        Self::open_with(
            kv_store,
            BincodeBlockSerializer,
            Box::new(HashDuplicateIndex::new()),
        )
    }
}

impl<KV: KeyValueStore, BS: BlockSerializer> ChainStore<KV, BS> {
    /// Open the store, reloading every persisted block and rebuilding the
    /// duplicate index from them.
    ///
    /// Loaded blocks are not integrity-checked here; that is the
    /// validator's job, and a tampered store must still open so it can be
    /// reported on.
    pub fn open_with(
        kv_store: KV,
        serializer: BS,
        mut duplicates: Box<dyn DuplicateIndex>,
    ) -> ChainResult<Self> {
        let blocks = load_blocks(&kv_store, &serializer)?;
        for block in &blocks {
            duplicates.record(block);
        }

        if !blocks.is_empty() {
            tracing::info!("[ledger] 💾 Reloaded {} blocks from storage", blocks.len());
        }

        Ok(Self {
            writer: Mutex::new(kv_store),
            serializer,
            committed: RwLock::new(Committed {
                blocks: Arc::new(blocks),
                duplicates,
            }),
        })
    }

    /// Append `block` as the new head.
    ///
    /// ## Errors
    ///
    /// - `ChainIntegrity`: wrong index, broken link, regressing timestamp or
    ///   a stored hash that does not match the fields
    /// - `Validation`: Merkle root does not cover the leaves and payload
    /// - `Duplicate`: payload already recorded for this data type
    /// - `Storage` / `Serialization`: persistence failed; nothing committed
    pub fn append(&self, block: Block) -> ChainResult<u64> {
        let mut kv = self.writer.lock();

        {
            let committed = self.committed.read();
            check_successor(committed.blocks.last(), &block)?;
            check_contents(&block)?;

            if !block.is_genesis() {
                if let Some(existing_index) =
                    committed.duplicates.lookup(&block.data_type, &block.data_hash)
                {
                    return Err(ChainError::Duplicate {
                        data_type: block.data_type.clone(),
                        data_hash: block.data_hash.clone(),
                        existing_index,
                    });
                }
            }
        }

        let index = block.index;
        let bytes = self.serializer.serialize(&block)?;
        kv.atomic_batch_write(vec![
            BatchOperation::put(block_key(index), bytes),
            BatchOperation::put(HEAD_KEY, index.to_be_bytes().to_vec()),
        ])?;

        tracing::info!(
            "[ledger] ⛓ Appended block #{} ({}) hash={}",
            index,
            block.data_type,
            &block.block_hash[..16.min(block.block_hash.len())]
        );

        let mut committed = self.committed.write();
        committed.duplicates.record(&block);
        Arc::make_mut(&mut committed.blocks).push(block);

        Ok(index)
    }

    /// Block at `index`.
    pub fn get(&self, index: u64) -> ChainResult<Block> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.snapshot().get(i).cloned())
            .ok_or(ChainError::NotFound { index })
    }

    /// Newest-first page, optionally filtered by `data_type`.
    ///
    /// Returns the number of matching blocks and the requested page.
    pub fn list(&self, data_type: Option<&str>, offset: usize, limit: usize) -> (u64, Vec<Block>) {
        let snapshot = self.snapshot();
        let matches = |block: &&Block| data_type.map_or(true, |t| block.data_type == t);

        let total = snapshot.iter().filter(matches).count() as u64;
        let page = snapshot
            .iter()
            .rev()
            .filter(matches)
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        (total, page)
    }

    /// Latest block, `None` on an empty store.
    pub fn head(&self) -> Option<Block> {
        self.committed.read().blocks.last().cloned()
    }

    /// Number of committed blocks.
    pub fn len(&self) -> u64 {
        self.committed.read().blocks.len() as u64
    }

    /// Whether nothing has been committed yet.
    pub fn is_empty(&self) -> bool {
        self.committed.read().blocks.is_empty()
    }

    /// Consistent view of every committed block.
    pub fn snapshot(&self) -> Arc<Vec<Block>> {
        Arc::clone(&self.committed.read().blocks)
    }

    /// Index of the block that already carries this payload.
    pub fn find_duplicate(&self, data_type: &str, data_hash: &str) -> Option<u64> {
        self.committed.read().duplicates.lookup(data_type, data_hash)
    }
}

fn load_blocks<KV: KeyValueStore, BS: BlockSerializer>(
    kv_store: &KV,
    serializer: &BS,
) -> ChainResult<Vec<Block>> {
    let Some(head_bytes) = kv_store.get(HEAD_KEY)? else {
        if !kv_store.prefix_scan(BLOCK_PREFIX)?.is_empty() {
            return Err(corruption("blocks present but head pointer missing"));
        }
        return Ok(Vec::new());
    };

    let head: [u8; 8] = head_bytes
        .as_slice()
        .try_into()
        .map_err(|_| corruption("head pointer is not 8 bytes"))?;
    let head = u64::from_be_bytes(head);

    let stored = kv_store.prefix_scan(BLOCK_PREFIX)?;
    if let Some((key, _)) = stored.iter().find(|(key, _)| *key > block_key(head)) {
        return Err(corruption(&format!(
            "block key {} found beyond head #{head}",
            hex::encode(key)
        )));
    }

    (0..=head)
        .map(|index| {
            let bytes = kv_store
                .get(&block_key(index))?
                .ok_or_else(|| corruption(&format!("block #{index} missing below head #{head}")))?;
            serializer.deserialize(&bytes)
        })
        .collect()
}

fn corruption(message: &str) -> ChainError {
    KVStoreError::CorruptionError {
        message: message.to_string(),
    }
    .into()
}

fn check_successor(head: Option<&Block>, block: &Block) -> ChainResult<()> {
    match head {
        None => {
            if block.index != 0 {
                return Err(ChainError::integrity(format!(
                    "empty chain expects genesis at index 0, got #{}",
                    block.index
                )));
            }
            if block.previous_hash != GENESIS_PREVIOUS_HASH || block.data_type != GENESIS_DATA_TYPE {
                return Err(ChainError::integrity(
                    "first block must be a genesis block linked to the zero sentinel",
                ));
            }
        }
        Some(head) => {
            if block.index != head.index + 1 {
                return Err(ChainError::integrity(format!(
                    "expected index {}, got {}",
                    head.index + 1,
                    block.index
                )));
            }
            if block.previous_hash != head.block_hash {
                return Err(ChainError::integrity(format!(
                    "block #{} links to {} but head is {}",
                    block.index, block.previous_hash, head.block_hash
                )));
            }
            if block.timestamp < head.timestamp {
                return Err(ChainError::integrity(format!(
                    "timestamp {} precedes head timestamp {}",
                    block.timestamp, head.timestamp
                )));
            }
            if block.data_type == GENESIS_DATA_TYPE {
                return Err(ChainError::integrity("only index 0 may be a genesis block"));
            }
        }
    }

    if block.compute_hash() != block.block_hash {
        return Err(ChainError::integrity(format!(
            "block #{} hash does not match its fields",
            block.index
        )));
    }
    Ok(())
}

fn check_contents(block: &Block) -> ChainResult<()> {
    if block.merkle_leaves.last() != Some(&block.payload_digest()) {
        return Err(ChainError::validation("last merkle leaf must cover the payload"));
    }
    if merkle_root(&block.merkle_leaves)? != block.merkle_root {
        return Err(ChainError::validation("merkle_root does not match merkle_leaves"));
    }
    Ok(())
}
