//! # Merkle Root
//!
//! Summarizes the sub-items bundled in one block.
//!
//! ## Reduction Rules
//!
//! - Parent = `SHA-256(left_bytes ‖ right_bytes)` over the decoded leaf bytes
//! - A level with an odd count duplicates its last element before pairing
//! - One leaf: that leaf is the root
//! - No leaves: `EMPTY_MERKLE_ROOT`
//!
//! The duplication rule is part of the wire format. Changing it changes every
//! historical root.

use sha2::{Digest, Sha256};

use crate::domain::errors::{ChainError, ChainResult};
use crate::domain::hashing::HashHex;

/// Root of an empty item set: SHA-256 of the empty byte string.
pub const EMPTY_MERKLE_ROOT: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Compute the Merkle root over hex-encoded leaf hashes.
///
/// Order-sensitive: swapping two leaves changes the root.
pub fn merkle_root<S: AsRef<str>>(leaves: &[S]) -> ChainResult<HashHex> {
    match leaves {
        [] => Ok(EMPTY_MERKLE_ROOT.to_string()),
        [single] => {
            decode_leaf(single.as_ref())?;
            Ok(single.as_ref().to_ascii_lowercase())
        }
        _ => {
            let mut level = leaves
                .iter()
                .map(|leaf| decode_leaf(leaf.as_ref()))
                .collect::<ChainResult<Vec<_>>>()?;

            while level.len() > 1 {
                if level.len() % 2 == 1 {
                    if let Some(last) = level.last().cloned() {
                        level.push(last);
                    }
                }
                level = level
                    .chunks_exact(2)
                    .map(|pair| {
                        let mut hasher = Sha256::new();
                        hasher.update(&pair[0]);
                        hasher.update(&pair[1]);
                        hasher.finalize().to_vec()
                    })
                    .collect();
            }

            Ok(hex::encode(&level[0]))
        }
    }
}

fn decode_leaf(leaf: &str) -> ChainResult<Vec<u8>> {
    hex::decode(leaf).map_err(|e| ChainError::validation(format!("invalid merkle leaf {leaf:?}: {e}")))
}
