//! Fixtures shared by unit tests and downstream test crates.

use crate::adapters::{InMemoryKVStore, ManualTimeSource};
use crate::domain::block::{payload_leaf, Block, BlockCandidate, ChainSubmission, GENESIS_DATA_TYPE};
use crate::domain::config::ChainConfig;
use crate::domain::hashing::sha256_hex;
use crate::domain::merkle::merkle_root;
use crate::domain::miner::ProofOfWork;
use crate::domain::signature::{BlockSigner, SigningKey};
use crate::service::{LedgerChain, LedgerChainDependencies};

pub const ZERO_HASH: &str = crate::domain::block::GENESIS_PREVIOUS_HASH;

/// Deterministic key for tests.
pub const TEST_KEY: [u8; 32] = [0x42; 32];

/// Start of the manual clock used by `make_test_chain`.
pub const TEST_EPOCH_MS: u64 = 1_700_000_000_000;

pub type TestChain = LedgerChain<InMemoryKVStore, ManualTimeSource>;

pub fn test_signer() -> BlockSigner {
    BlockSigner::new(SigningKey::from_bytes(TEST_KEY).expect("test key is long enough"))
}

/// Unsigned candidate with a well-formed payload leaf and Merkle root.
pub fn make_candidate(index: u64, previous_hash: &str) -> BlockCandidate {
    build_candidate(index, previous_hash, false)
}

fn build_candidate(index: u64, previous_hash: &str, is_signed: bool) -> BlockCandidate {
    let payload = format!("{{\"record\":{index}}}");
    let leaves = vec![payload_leaf(&payload, false, is_signed)];

    BlockCandidate {
        index,
        timestamp: 1_000 + index * 1_000,
        data_type: "invoice".to_string(),
        data_hash: sha256_hex(format!("record-{index}").as_bytes()),
        previous_hash: previous_hash.to_string(),
        merkle_root: merkle_root(&leaves).expect("payload leaf is valid hex"),
        merkle_leaves: leaves,
        payload,
        is_encrypted: false,
        is_signed,
    }
}

/// Sealed, linked chain of `len` blocks starting with genesis.
pub fn build_chain(len: u64, difficulty: u32, signer: Option<&BlockSigner>) -> Vec<Block> {
    let pow = ProofOfWork::new(difficulty, 10_000_000).expect("valid test difficulty");
    let mut blocks: Vec<Block> = Vec::new();

    for index in 0..len {
        let previous_hash = blocks
            .last()
            .map(|b| b.block_hash.clone())
            .unwrap_or_else(|| ZERO_HASH.to_string());
        let mut candidate = build_candidate(index, &previous_hash, signer.is_some());
        if index == 0 {
            candidate.data_type = GENESIS_DATA_TYPE.to_string();
        }

        let seal = pow.seal(&candidate).expect("test difficulty is small");
        let signature = signer.map(|s| s.sign(&seal.block_hash));
        blocks.push(candidate.into_block(seal.nonce, seal.block_hash, signature));
    }
    blocks
}

/// Plaintext submission whose hash is derived from `n`.
pub fn make_submission(data_type: &str, n: u64) -> ChainSubmission {
    let payload = format!("{{\"n\":{n}}}");
    ChainSubmission::new(data_type, sha256_hex(payload.as_bytes()), payload)
}

/// Signed in-memory chain at difficulty 1 on a manual clock.
pub fn make_test_chain() -> (TestChain, InMemoryKVStore, ManualTimeSource) {
    make_test_chain_with(InMemoryKVStore::new(), test_config())
}

/// Signed chain over an existing store.
pub fn make_test_chain_with(
    kv_store: InMemoryKVStore,
    config: ChainConfig,
) -> (TestChain, InMemoryKVStore, ManualTimeSource) {
    let clock = ManualTimeSource::new(TEST_EPOCH_MS);
    let deps = LedgerChainDependencies::new(kv_store.clone(), clock.clone())
        .with_signer(test_signer());
    let chain = LedgerChain::open(deps, config).expect("test chain opens");
    (chain, kv_store, clock)
}

/// Cheap sealing for tests.
pub fn test_config() -> ChainConfig {
    ChainConfig::default().with_difficulty(1)
}
