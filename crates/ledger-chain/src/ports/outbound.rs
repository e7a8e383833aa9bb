//! # Outbound Ports (Driven Ports)
//!
//! Dependencies the ledger chain requires from its host.
//!
//! Implementations live in `crate::adapters`.

use crate::domain::block::{Block, Timestamp};
use crate::domain::errors::{ChainResult, KVStoreError};

/// Abstract interface for key-value database operations.
///
/// Production: `FileBackedKVStore`
/// Testing: `InMemoryKVStore`
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError>;

    /// Put a single key-value pair.
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError>;

    /// Delete a key.
    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError>;

    /// Execute an atomic batch write.
    ///
    /// Either ALL operations in the batch are applied, or NONE are.
    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError>;

    /// Check if a key exists.
    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError>;

    /// All pairs whose key starts with `prefix`, in key order.
    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError>;
}

/// Batch operation for atomic writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    /// Put a key-value pair.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Delete a key.
    Delete { key: Vec<u8> },
}

impl BatchOperation {
    /// Create a Put operation.
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a Delete operation.
    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Delete { key: key.into() }
    }
}

/// Wall clock in milliseconds since the Unix epoch.
pub trait TimeSource: Send + Sync {
    /// Current time.
    fn now(&self) -> Timestamp;
}

/// Encoding of blocks at rest.
pub trait BlockSerializer: Send + Sync {
    /// Serialize a block to bytes.
    fn serialize(&self, block: &Block) -> ChainResult<Vec<u8>>;

    /// Deserialize a block from bytes.
    fn deserialize(&self, data: &[u8]) -> ChainResult<Block>;
}

/// Lookup of already-recorded payloads by `(data_type, data_hash)`.
///
/// Maintained alongside the chain so duplicate checks do not scan every
/// block. Implementations only need to remember the first occurrence.
pub trait DuplicateIndex: Send + Sync {
    /// Index of the block that first recorded this payload.
    fn lookup(&self, data_type: &str, data_hash: &str) -> Option<u64>;

    /// Remember a newly committed block.
    fn record(&mut self, block: &Block);

    /// Number of distinct payloads remembered.
    fn len(&self) -> usize;

    /// Whether nothing has been recorded.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Transform applied to payloads flagged for encryption at rest.
///
/// The chain never needs the key to validate: Merkle leaves are computed over
/// the ciphertext.
pub trait EncryptionProvider: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Whether this provider actually transforms data.
    fn is_active(&self) -> bool;

    /// Encrypt a payload.
    fn encrypt(&self, plaintext: &[u8]) -> ChainResult<Vec<u8>>;

    /// Decrypt a payload produced by [`encrypt`](Self::encrypt).
    fn decrypt(&self, ciphertext: &[u8]) -> ChainResult<Vec<u8>>;
}
