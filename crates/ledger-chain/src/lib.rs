//! # Ledger Chain
//!
//! The tamper-evident core of the invoice ledger: a single-writer, hash-linked,
//! proof-of-work sealed and HMAC-signed block store.
//!
//! ## Flow
//!
//! ```text
//! ChainSubmission ──→ LedgerChain::prepare ──→ BlockCandidate
//!                                                   │
//!                                 ProofOfWork::seal ┘ (CPU bound, off the request path)
//!                                                   │
//!                         BlockSigner::sign ────────┤
//!                                                   ↓
//!                                  ChainStore::append (serialized, atomic visibility)
//! ```
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Hash Link | `blocks[i].previous_hash == blocks[i-1].block_hash` |
//! | 2 | Gapless Index | Indices start at 0 and increase by exactly one |
//! | 3 | Monotonic Time | Timestamps never decrease along the chain |
//! | 4 | Append Only | Blocks are never edited or deleted |
//! | 5 | Single Writer | Two appends can never claim the same predecessor |
//! | 6 | Atomic Visibility | Readers never observe a partially written block |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Hashing, signatures, Merkle roots, blocks, miner, validator
//! - `ports/` - Inbound API and outbound storage/crypto/time traits
//! - `adapters/` - In-memory and file-backed stores, serializers, encryption
//! - `service/` - `ChainStore` and the `LedgerChain` facade
//!
//! ## Features
//!
//! - `encryption` - XChaCha20-Poly1305 payload provider
//! - `locking` - `DatabaseLock` for file-backed data directories
//! - `test-utils` - fixtures for downstream test crates

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use domain::block::{
    payload_leaf, Block, BlockCandidate, ChainSubmission, Timestamp, GENESIS_DATA_TYPE,
    GENESIS_PREVIOUS_HASH,
};
pub use domain::config::ChainConfig;
pub use domain::errors::{ChainError, ChainResult, KVStoreError};
pub use domain::hashing::{canonical_json, hash_payload, sha256_hex, HashHex};
pub use domain::merkle::{merkle_root, EMPTY_MERKLE_ROOT};
pub use domain::miner::{ProofOfWork, Seal};
pub use domain::signature::{BlockSigner, SigningKey};
pub use domain::validator::{ChainValidator, ValidationIssue, ValidationIssueKind, ValidationReport};
pub use ports::inbound::{BlockDetail, BlockPage, ChainStats, LedgerChainApi};
pub use ports::outbound::{
    BatchOperation, BlockSerializer, DuplicateIndex, EncryptionProvider, KeyValueStore, TimeSource,
};
pub use service::{ChainStore, LedgerChain, LedgerChainDependencies};
