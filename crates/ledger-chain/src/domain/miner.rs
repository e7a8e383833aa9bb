//! # Proof-of-Work Sealer
//!
//! Local, non-competitive nonce search. There is no network to race against,
//! so the work is cosmetic: it only makes rewriting history cost a re-mine of
//! every later block.
//!
//! The search order is fixed (nonce 0, 1, 2, ...), so sealing the same
//! candidate at the same difficulty always yields the same nonce.

use std::sync::atomic::{AtomicBool, Ordering};

use sha2::Digest;

use crate::domain::block::BlockCandidate;
use crate::domain::errors::{ChainError, ChainResult};
use crate::domain::hashing::HashHex;

/// Default difficulty in leading zero hex nibbles.
pub const DEFAULT_DIFFICULTY: u32 = 3;

/// Default attempt budget before the search gives up.
pub const DEFAULT_MAX_ATTEMPTS: u64 = 50_000_000;

/// Highest meaningful difficulty: a SHA-256 digest has 64 nibbles.
pub const MAX_DIFFICULTY: u32 = 64;

/// Nonces tried between checks of the cancel flag.
const CANCEL_CHECK_INTERVAL: u64 = 4096;

/// Result of a successful nonce search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seal {
    pub nonce: u64,
    pub block_hash: HashHex,
    pub attempts: u64,
}

/// Nonce search parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofOfWork {
    difficulty: u32,
    max_attempts: u64,
}

impl Default for ProofOfWork {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ProofOfWork {
    /// Create a sealer, rejecting difficulties beyond the digest width.
    pub fn new(difficulty: u32, max_attempts: u64) -> ChainResult<Self> {
        if difficulty > MAX_DIFFICULTY {
            return Err(ChainError::InvalidConfig(format!(
                "difficulty {difficulty} exceeds {MAX_DIFFICULTY} hex digits"
            )));
        }
        if max_attempts == 0 {
            return Err(ChainError::InvalidConfig(
                "max_attempts must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            difficulty,
            max_attempts,
        })
    }

    /// Required leading zero nibbles.
    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    /// Attempt budget.
    pub fn max_attempts(&self) -> u64 {
        self.max_attempts
    }

    /// Search for the first nonce whose block hash meets the difficulty.
    ///
    /// ## Errors
    ///
    /// - `ResourceExhausted`: no nonce found within `max_attempts`
    pub fn seal(&self, candidate: &BlockCandidate) -> ChainResult<Seal> {
        self.seal_with_cancel(candidate, &AtomicBool::new(false))
    }

    /// Like [`seal`](Self::seal), but stops with `Cancelled` once `cancel`
    /// is set. The flag is polled every few thousand nonces.
    pub fn seal_with_cancel(
        &self,
        candidate: &BlockCandidate,
        cancel: &AtomicBool,
    ) -> ChainResult<Seal> {
        let prefix = candidate.header_prefix();
        let root_len = (candidate.merkle_root.len() as u64).to_le_bytes();

        for nonce in 0..self.max_attempts {
            if nonce % CANCEL_CHECK_INTERVAL == 0 && cancel.load(Ordering::Relaxed) {
                return Err(ChainError::Cancelled {
                    index: candidate.index,
                });
            }
            let mut hasher = prefix.clone();
            hasher.update(nonce.to_le_bytes());
            hasher.update(root_len);
            hasher.update(candidate.merkle_root.as_bytes());
            let digest = hasher.finalize();

            if leading_zero_nibbles(&digest) >= self.difficulty {
                let attempts = nonce + 1;
                tracing::debug!(
                    "[ledger] ⛏ sealed block #{} after {} attempts",
                    candidate.index,
                    attempts
                );
                return Ok(Seal {
                    nonce,
                    block_hash: hex::encode(digest),
                    attempts,
                });
            }
        }

        tracing::warn!(
            "[ledger] mining gave up on block #{} after {} attempts (difficulty {})",
            candidate.index,
            self.max_attempts,
            self.difficulty
        );
        Err(ChainError::ResourceExhausted {
            difficulty: self.difficulty,
            attempts: self.max_attempts,
        })
    }

    /// Whether `block_hash` (hex) satisfies the difficulty.
    pub fn meets_target(&self, block_hash: &str) -> bool {
        block_hash.len() >= self.difficulty as usize
            && block_hash
                .bytes()
                .take(self.difficulty as usize)
                .all(|b| b == b'0')
    }
}

/// Count leading zero hex nibbles in a digest.
pub fn leading_zero_nibbles(bytes: &[u8]) -> u32 {
    let mut count = 0u32;
    for byte in bytes {
        if *byte == 0 {
            count += 2;
        } else {
            if *byte < 0x10 {
                count += 1;
            }
            break;
        }
    }
    count
}
