//! # Chain Validator
//!
//! Full linear walk over a chain snapshot. Every block is re-derived from its
//! stored fields; nothing is trusted from a previous run.
//!
//! Tampering is a normal outcome here: findings are collected into a
//! `ValidationReport`, the walk never stops early and never returns an error.
//!
//! ## Checks Per Block
//!
//! | Check | Detects |
//! |-------|---------|
//! | Index / genesis sentinel | Inserted, removed or reordered blocks |
//! | Recomputed predecessor hash vs `previous_hash` | Retroactive edits to block i-1 |
//! | Recomputed own hash vs `block_hash` | Field edits without re-mining |
//! | Work predicate | Hand-forged hashes |
//! | Merkle root over leaves, payload leaf | Edited payloads or sub-items |
//! | Signature (when present and a key is known) | Forged or swapped signatures |
//! | Signed flag in the payload leaf | Stripped or added signatures |
//! | `data_hash` per `data_type` | Double registration |
//! | Timestamp order | Back-dated blocks |

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::block::{payload_leaf, Block, GENESIS_DATA_TYPE, GENESIS_PREVIOUS_HASH};
use crate::domain::merkle::merkle_root;
use crate::domain::miner::leading_zero_nibbles;
use crate::domain::signature::BlockSigner;

/// Category of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationIssueKind {
    /// Genesis block is missing or malformed.
    Genesis,
    /// Index does not equal the position in the chain.
    IndexGap,
    /// `previous_hash` does not match the recomputed predecessor hash.
    BrokenLink,
    /// Stored `block_hash` does not match the recomputed hash.
    HashMismatch,
    /// Block hash does not satisfy the difficulty.
    InsufficientWork,
    /// Merkle root does not match the stored leaves.
    MerkleMismatch,
    /// Payload leaf does not match the stored payload.
    PayloadMismatch,
    /// Signature not valid for the block hash, or its presence disagrees
    /// with how the block was sealed.
    InvalidSignature,
    /// `data_hash` already seen for the same `data_type`.
    DuplicatePayload,
    /// Timestamp earlier than the predecessor's.
    TimestampRegression,
}

/// One finding, pinned to a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Position of the offending block.
    pub block_index: u64,
    /// Finding category.
    pub kind: ValidationIssueKind,
    /// Human-readable detail.
    pub message: String,
}

/// Result of a full chain walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True when no issue was found.
    pub valid: bool,
    /// Blocks walked.
    pub total_blocks: u64,
    /// Blocks carrying a signature.
    pub signed_blocks: u64,
    /// Blocks without a signature.
    pub unsigned_blocks: u64,
    /// Findings in chain order.
    pub errors: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Issues pinned to one block.
    pub fn issues_at(&self, block_index: u64) -> impl Iterator<Item = &ValidationIssue> {
        self.errors
            .iter()
            .filter(move |issue| issue.block_index == block_index)
    }

    /// Whether any issue of `kind` was found.
    pub fn has_issue(&self, kind: ValidationIssueKind) -> bool {
        self.errors.iter().any(|issue| issue.kind == kind)
    }
}

/// Walks a chain and reports every integrity violation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChainValidator {
    difficulty: Option<u32>,
}

impl ChainValidator {
    /// Validator that skips the work predicate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also require `difficulty` leading zero nibbles on every block hash.
    pub fn with_difficulty(mut self, difficulty: u32) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    /// Validate `blocks` in order.
    ///
    /// Signatures are checked only when `signer` is given; without a key they
    /// are counted but cannot be verified.
    pub fn validate(&self, blocks: &[Block], signer: Option<&BlockSigner>) -> ValidationReport {
        let mut walk = Walk::default();
        let mut seen: HashMap<(&str, &str), u64> = HashMap::new();

        for (position, block) in blocks.iter().enumerate() {
            let position = position as u64;

            if block.index != position {
                walk.push(
                    block.index,
                    ValidationIssueKind::IndexGap,
                    format!("expected index {position}, found {}", block.index),
                );
            }

            match position.checked_sub(1).and_then(|p| blocks.get(p as usize)) {
                None => self.check_genesis(block, &mut walk),
                Some(previous) => {
                    let recomputed = previous.compute_hash();
                    if block.previous_hash != recomputed {
                        walk.push(
                            block.index,
                            ValidationIssueKind::BrokenLink,
                            format!(
                                "previous_hash {} does not match block #{} hash {}",
                                block.previous_hash, previous.index, recomputed
                            ),
                        );
                    }
                    if block.timestamp < previous.timestamp {
                        walk.push(
                            block.index,
                            ValidationIssueKind::TimestampRegression,
                            format!(
                                "timestamp {} precedes block #{} timestamp {}",
                                block.timestamp, previous.index, previous.timestamp
                            ),
                        );
                    }
                }
            }

            self.check_hash(block, &mut walk);
            check_merkle(block, &mut walk);

            match (&block.digital_signature, signer) {
                (Some(signature), Some(signer)) => {
                    walk.signed += 1;
                    if !signer.verify(&block.block_hash, signature) {
                        walk.push(
                            block.index,
                            ValidationIssueKind::InvalidSignature,
                            "signature does not verify against block_hash".to_string(),
                        );
                    }
                }
                (Some(_), None) => walk.signed += 1,
                (None, _) => walk.unsigned += 1,
            }

            if !block.is_genesis() {
                let key = (block.data_type.as_str(), block.data_hash.as_str());
                if let Some(first) = seen.get(&key) {
                    walk.push(
                        block.index,
                        ValidationIssueKind::DuplicatePayload,
                        format!(
                            "{} payload {} already recorded at block #{}",
                            block.data_type, block.data_hash, first
                        ),
                    );
                } else {
                    seen.insert(key, block.index);
                }
            }
        }

        if !walk.issues.is_empty() {
            tracing::warn!(
                "[ledger] ⚠ chain validation found {} issue(s) across {} blocks",
                walk.issues.len(),
                blocks.len()
            );
        }

        ValidationReport {
            valid: walk.issues.is_empty(),
            total_blocks: blocks.len() as u64,
            signed_blocks: walk.signed,
            unsigned_blocks: walk.unsigned,
            errors: walk.issues,
        }
    }

    fn check_genesis(&self, block: &Block, walk: &mut Walk) {
        if block.previous_hash != GENESIS_PREVIOUS_HASH {
            walk.push(
                block.index,
                ValidationIssueKind::Genesis,
                "genesis previous_hash is not the zero sentinel".to_string(),
            );
        }
        if block.data_type != GENESIS_DATA_TYPE {
            walk.push(
                block.index,
                ValidationIssueKind::Genesis,
                format!("first block has data_type {:?}", block.data_type),
            );
        }
    }

    fn check_hash(&self, block: &Block, walk: &mut Walk) {
        let recomputed = block.compute_hash();
        if block.block_hash != recomputed {
            walk.push(
                block.index,
                ValidationIssueKind::HashMismatch,
                format!(
                    "stored block_hash {} but fields hash to {}",
                    block.block_hash, recomputed
                ),
            );
            return;
        }

        if let Some(difficulty) = self.difficulty {
            let meets = hex::decode(&block.block_hash)
                .map(|bytes| leading_zero_nibbles(&bytes) >= difficulty)
                .unwrap_or(false);
            if !meets {
                walk.push(
                    block.index,
                    ValidationIssueKind::InsufficientWork,
                    format!("block_hash does not have {difficulty} leading zeros"),
                );
            }
        }
    }
}

fn check_merkle(block: &Block, walk: &mut Walk) {
    match block.merkle_leaves.last() {
        Some(leaf) if *leaf == block.payload_digest() => {}
        Some(leaf) if *leaf == payload_leaf(&block.payload, block.is_encrypted, !block.is_signed()) => {
            let message = if block.is_signed() {
                "signature attached to a block sealed unsigned"
            } else {
                "block was sealed signed but carries no signature"
            };
            walk.push(block.index, ValidationIssueKind::InvalidSignature, message.to_string());
        }
        Some(_) => walk.push(
            block.index,
            ValidationIssueKind::PayloadMismatch,
            "payload does not match its merkle leaf".to_string(),
        ),
        None => walk.push(
            block.index,
            ValidationIssueKind::PayloadMismatch,
            "block has no payload leaf".to_string(),
        ),
    }

    match merkle_root(&block.merkle_leaves) {
        Ok(root) if root == block.merkle_root => {}
        Ok(root) => walk.push(
            block.index,
            ValidationIssueKind::MerkleMismatch,
            format!("stored merkle_root {} but leaves reduce to {}", block.merkle_root, root),
        ),
        Err(e) => walk.push(
            block.index,
            ValidationIssueKind::MerkleMismatch,
            e.to_string(),
        ),
    }
}

#[derive(Default)]
struct Walk {
    issues: Vec<ValidationIssue>,
    signed: u64,
    unsigned: u64,
}

impl Walk {
    fn push(&mut self, block_index: u64, kind: ValidationIssueKind, message: String) {
        self.issues.push(ValidationIssue {
            block_index,
            kind,
            message,
        });
    }
}
