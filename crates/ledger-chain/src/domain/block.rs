//! # Blocks
//!
//! The immutable unit of the chain, the unsealed candidate the miner works
//! on, and the submission collaborators hand to the ledger.
//!
//! ## Block Hash
//!
//! ```text
//! SHA-256( index_le ‖ timestamp_le ‖ lp(data_type) ‖ lp(data_hash)
//!        ‖ lp(previous_hash) ‖ nonce_le ‖ lp(merkle_root) )
//! ```
//!
//! `lp(s)` is the u64 little-endian byte length of `s` followed by its bytes,
//! so no two field tuples share an encoding.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::errors::{ChainError, ChainResult};
use crate::domain::hashing::{sha256_hex, HashHex};

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// `previous_hash` of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// `data_type` of the genesis block.
pub const GENESIS_DATA_TYPE: &str = "genesis";

/// Longest accepted `data_type` label.
pub const MAX_DATA_TYPE_LEN: usize = 64;

/// A sealed block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain, 0 for genesis.
    pub index: u64,
    /// Creation time (ms since epoch).
    pub timestamp: Timestamp,
    /// Label of the producing collaborator.
    pub data_type: String,
    /// Canonical hash of the submitted record.
    pub data_hash: HashHex,
    /// `block_hash` of the predecessor, or `GENESIS_PREVIOUS_HASH`.
    pub previous_hash: HashHex,
    /// Proof-of-work nonce.
    pub nonce: u64,
    /// Hash over the header fields including nonce.
    pub block_hash: HashHex,
    /// Root over `merkle_leaves`.
    pub merkle_root: HashHex,
    /// Sub-item hashes; the last one is always the payload leaf.
    pub merkle_leaves: Vec<HashHex>,
    /// Opaque record body (canonical JSON, or hex ciphertext when encrypted).
    pub payload: String,
    /// HMAC over `block_hash`, if the block was signed.
    pub digital_signature: Option<String>,
    /// Whether `payload` is ciphertext.
    pub is_encrypted: bool,
}

impl Block {
    /// Recompute the block hash from the stored fields.
    pub fn compute_hash(&self) -> HashHex {
        let prefix = header_prefix(
            self.index,
            self.timestamp,
            &self.data_type,
            &self.data_hash,
            &self.previous_hash,
        );
        finish_header(prefix, self.nonce, &self.merkle_root)
    }

    /// Whether this is the genesis block.
    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }

    /// Whether the block carries a signature.
    pub fn is_signed(&self) -> bool {
        self.digital_signature.is_some()
    }

    /// Leaf binding the stored payload, its encryption flag and whether
    /// the block carries a signature.
    pub fn payload_digest(&self) -> HashHex {
        payload_leaf(&self.payload, self.is_encrypted, self.is_signed())
    }
}

const FLAG_ENCRYPTED: u8 = 0b01;
const FLAG_SIGNED: u8 = 0b10;

/// Merkle leaf for a block payload: `SHA-256(flags ‖ payload_bytes)`.
///
/// | Bit | Set when |
/// |-----|----------|
/// | 0 | `payload` is ciphertext |
/// | 1 | the block is signed at seal time |
///
/// Flipping `is_encrypted`, or adding or stripping `digital_signature`,
/// therefore changes the leaf and with it the block hash.
pub fn payload_leaf(payload: &str, is_encrypted: bool, is_signed: bool) -> HashHex {
    let mut flags = 0;
    if is_encrypted {
        flags |= FLAG_ENCRYPTED;
    }
    if is_signed {
        flags |= FLAG_SIGNED;
    }

    let mut bytes = Vec::with_capacity(payload.len() + 1);
    bytes.push(flags);
    bytes.extend_from_slice(payload.as_bytes());
    sha256_hex(&bytes)
}

/// A fully specified block waiting for its nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockCandidate {
    pub index: u64,
    pub timestamp: Timestamp,
    pub data_type: String,
    pub data_hash: HashHex,
    pub previous_hash: HashHex,
    pub merkle_root: HashHex,
    pub merkle_leaves: Vec<HashHex>,
    pub payload: String,
    pub is_encrypted: bool,
    /// Whether sealing must attach a signature.
    pub is_signed: bool,
}

impl BlockCandidate {
    /// Hash of this candidate for a trial nonce.
    pub fn hash_with_nonce(&self, nonce: u64) -> HashHex {
        finish_header(self.header_prefix(), nonce, &self.merkle_root)
    }

    /// Hasher state over every field that precedes the nonce.
    ///
    /// Cloned once per trial by the miner.
    pub(crate) fn header_prefix(&self) -> Sha256 {
        header_prefix(
            self.index,
            self.timestamp,
            &self.data_type,
            &self.data_hash,
            &self.previous_hash,
        )
    }

    /// Turn the candidate into a sealed block.
    pub fn into_block(self, nonce: u64, block_hash: HashHex, digital_signature: Option<String>) -> Block {
        Block {
            index: self.index,
            timestamp: self.timestamp,
            data_type: self.data_type,
            data_hash: self.data_hash,
            previous_hash: self.previous_hash,
            nonce,
            block_hash,
            merkle_root: self.merkle_root,
            merkle_leaves: self.merkle_leaves,
            payload: self.payload,
            digital_signature,
            is_encrypted: self.is_encrypted,
        }
    }
}

/// What a collaborator hands to the ledger: pre-serialized data plus a label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSubmission {
    /// Label identifying the producer (e.g. `invoice`, `registry_event`).
    pub data_type: String,
    /// Canonical hash of the record; the duplicate-detection key.
    pub data_hash: HashHex,
    /// Serialized record body.
    pub payload: String,
    /// Related sub-item hashes bundled into the Merkle root.
    pub sub_items: Vec<HashHex>,
    /// Request payload encryption at rest.
    pub encrypt: bool,
}

impl ChainSubmission {
    /// Create a submission with no sub-items, stored in plaintext.
    pub fn new(
        data_type: impl Into<String>,
        data_hash: impl Into<HashHex>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            data_type: data_type.into(),
            data_hash: data_hash.into(),
            payload: payload.into(),
            sub_items: Vec::new(),
            encrypt: false,
        }
    }

    /// Bundle related sub-item hashes into the block.
    pub fn with_sub_items(mut self, sub_items: Vec<HashHex>) -> Self {
        self.sub_items = sub_items;
        self
    }

    /// Request payload encryption.
    pub fn with_encryption(mut self, encrypt: bool) -> Self {
        self.encrypt = encrypt;
        self
    }

    /// Reject malformed submissions before anything is hashed.
    pub fn validate(&self) -> ChainResult<()> {
        validate_data_type(&self.data_type)?;
        if self.data_type == GENESIS_DATA_TYPE {
            return Err(ChainError::validation("data_type 'genesis' is reserved"));
        }
        validate_hash_hex("data_hash", &self.data_hash)?;
        for (i, item) in self.sub_items.iter().enumerate() {
            validate_hash_hex(&format!("sub_items[{i}]"), item)?;
        }
        Ok(())
    }
}

/// Labels are short lowercase identifiers: `[a-z0-9_.:-]+`.
pub fn validate_data_type(data_type: &str) -> ChainResult<()> {
    if data_type.is_empty() || data_type.len() > MAX_DATA_TYPE_LEN {
        return Err(ChainError::validation(format!(
            "data_type must be 1..={MAX_DATA_TYPE_LEN} characters"
        )));
    }
    let allowed = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || "_.:-".contains(c);
    if !data_type.chars().all(allowed) {
        return Err(ChainError::validation(format!(
            "data_type {data_type:?} contains characters outside [a-z0-9_.:-]"
        )));
    }
    Ok(())
}

/// Hashes are 64 lowercase hex characters.
pub fn validate_hash_hex(field: &str, value: &str) -> ChainResult<()> {
    let well_formed = value.len() == 64
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
    if !well_formed {
        return Err(ChainError::validation(format!(
            "{field} must be 64 lowercase hex characters"
        )));
    }
    Ok(())
}

fn update_framed(hasher: &mut Sha256, field: &str) {
    hasher.update((field.len() as u64).to_le_bytes());
    hasher.update(field.as_bytes());
}

fn header_prefix(
    index: u64,
    timestamp: Timestamp,
    data_type: &str,
    data_hash: &str,
    previous_hash: &str,
) -> Sha256 {
    let mut hasher = Sha256::new();
    hasher.update(index.to_le_bytes());
    hasher.update(timestamp.to_le_bytes());
    update_framed(&mut hasher, data_type);
    update_framed(&mut hasher, data_hash);
    update_framed(&mut hasher, previous_hash);
    hasher
}

fn finish_header(mut prefix: Sha256, nonce: u64, merkle_root: &str) -> HashHex {
    prefix.update(nonce.to_le_bytes());
    update_framed(&mut prefix, merkle_root);
    hex::encode(prefix.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{make_candidate, ZERO_HASH};

    #[test]
    fn test_block_hash_roundtrip() {
        let candidate = make_candidate(1, ZERO_HASH);
        let hash = candidate.hash_with_nonce(42);
        let block = candidate.into_block(42, hash.clone(), None);

        assert_eq!(block.compute_hash(), hash);
    }

    #[test]
    fn test_every_header_field_is_covered() {
        let candidate = make_candidate(1, ZERO_HASH);
        let block = candidate.clone().into_block(7, candidate.hash_with_nonce(7), None);
        let original = block.compute_hash();

        let mutations: Vec<Box<dyn Fn(&mut Block)>> = vec![
            Box::new(|b| b.index += 1),
            Box::new(|b| b.timestamp += 1),
            Box::new(|b| b.data_type.push('x')),
            Box::new(|b| b.data_hash = "1".repeat(64)),
            Box::new(|b| b.previous_hash = "2".repeat(64)),
            Box::new(|b| b.nonce += 1),
            Box::new(|b| b.merkle_root = "3".repeat(64)),
        ];

        for mutate in mutations {
            let mut tampered = block.clone();
            mutate(&mut tampered);
            assert_ne!(tampered.compute_hash(), original);
        }
    }

    #[test]
    fn test_field_framing_is_unambiguous() {
        let mut a = make_candidate(1, ZERO_HASH);
        let mut b = a.clone();
        a.data_type = "ab".to_string();
        a.data_hash = "c".repeat(64);
        b.data_type = "abc".to_string();
        b.data_hash = "c".repeat(63);

        assert_ne!(a.hash_with_nonce(0), b.hash_with_nonce(0));
    }

    #[test]
    fn test_payload_leaf_binds_encryption_flag() {
        assert_ne!(payload_leaf("abc", false, false), payload_leaf("abc", true, false));
        assert_ne!(payload_leaf("abc", false, false), payload_leaf("abd", false, false));
    }

    #[test]
    fn test_payload_leaf_binds_signed_flag() {
        let leaves: std::collections::HashSet<_> = [
            payload_leaf("abc", false, false),
            payload_leaf("abc", false, true),
            payload_leaf("abc", true, false),
            payload_leaf("abc", true, true),
        ]
        .into_iter()
        .collect();
        assert_eq!(leaves.len(), 4);
    }

    #[test]
    fn test_submission_validation() {
        let good = ChainSubmission::new("invoice", "a".repeat(64), "{}");
        assert!(good.validate().is_ok());

        let bad_type = ChainSubmission::new("Invoice!", "a".repeat(64), "{}");
        assert!(matches!(bad_type.validate(), Err(ChainError::Validation(_))));

        let reserved = ChainSubmission::new(GENESIS_DATA_TYPE, "a".repeat(64), "{}");
        assert!(reserved.validate().is_err());

        let bad_hash = ChainSubmission::new("invoice", "XYZ", "{}");
        assert!(bad_hash.validate().is_err());

        let bad_item =
            ChainSubmission::new("invoice", "a".repeat(64), "{}").with_sub_items(vec!["00".into()]);
        assert!(bad_item.validate().is_err());
    }
}
